use crate::domains::logger::DomainLogger;
use chrono::Utc;
use log::Log;
use std::sync::Arc;

/// Forwards to the `log` facade, which `fast_log` drains into the scenario log file.
struct FastLogSink;

impl DomainLogger for FastLogSink {
    fn info(&self, msg: &str) {
        log::info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log::warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}

/// Install `fast_log` writing to `path` and return a logger that feeds it.
/// Fails if a global `log` backend is already installed.
pub fn init_file_logger(path: &str) -> Result<Arc<dyn DomainLogger>, String> {
    fast_log::init(
        fast_log::config::Config::new()
            .file(path)
            .level(log::LevelFilter::Info),
    )
    .map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(FastLogSink))
}

/// Drain buffered lines to the log file. fast_log writes from a background thread, so call this
/// before the process exits.
pub fn flush_file_logger() {
    log::logger().flush();
}
