use std::sync::Arc;

/// Logging port shared by the scenario runner and the client adapters.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Prefixes every line with the component that produced it, e.g. `[simulator]`.
struct Tagged {
    tag: String,
    inner: DynLogger,
}

impl DomainLogger for Tagged {
    fn info(&self, msg: &str) {
        self.inner.info(&format!("[{}] {}", self.tag, msg));
    }

    fn warn(&self, msg: &str) {
        self.inner.warn(&format!("[{}] {}", self.tag, msg));
    }

    fn error(&self, msg: &str) {
        self.inner.error(&format!("[{}] {}", self.tag, msg));
    }
}

pub fn tagged(logger: &DynLogger, tag: &str) -> DynLogger {
    Arc::new(Tagged {
        tag: tag.to_string(),
        inner: logger.clone(),
    })
}
