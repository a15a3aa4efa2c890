use crate::domains::logger::DomainLogger;
use std::sync::Arc;

use super::console_logger::init_console_logger;
use super::file_logger::init_file_logger;

/// Fans every line out to the console and, when one is configured, a log file.
pub struct MultiLogger {
    sinks: Vec<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<Arc<dyn DomainLogger>>) -> Self {
        Self { sinks }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }
}

/// Console logger, plus the file at `path` when given. A file that cannot be opened
/// degrades to console-only with a warning.
pub fn init_scenario_logger(path: Option<&str>) -> Arc<dyn DomainLogger> {
    let console = init_console_logger();
    let Some(path) = path else {
        return console;
    };
    match init_file_logger(path) {
        Ok(file) => Arc::new(MultiLogger::new(vec![console, file])),
        Err(e) => {
            console.warn(&e);
            console
        }
    }
}
