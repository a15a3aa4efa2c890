use crate::domains::logger::DomainLogger;
use std::sync::Arc;

struct ConsoleSink;

impl DomainLogger for ConsoleSink {
    fn info(&self, msg: &str) { println!("{}", msg); }
    fn warn(&self, msg: &str) { println!("WARN: {}", msg); }
    fn error(&self, msg: &str) { eprintln!("ERROR: {}", msg); }
}

/// Console logger; the default when no log file is configured.
pub fn init_console_logger() -> Arc<dyn DomainLogger> {
    Arc::new(ConsoleSink)
}
