use log::{debug, error, info, warn};

/// Component-scoped logging handle; the component name becomes the log target.
#[derive(Debug, Clone, Copy)]
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!(target: self.component, "{}", message);
    }

    pub fn trace(&self, message: &str) {
        debug!(target: self.component, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(target: self.component, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(target: self.component, "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("evroutecore")
    }
}
