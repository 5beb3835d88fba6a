//! Forced navigation hook used when a session cannot be recovered

use tracing::warn;

/// Receives forced navigations, e.g. back to the login entry point after a
/// failed refresh.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, location: &str) {
        self(location);
    }
}

/// Navigator for headless use: records the forced navigation in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, location: &str) {
        warn!(location, "Session ended, navigation forced");
    }
}
