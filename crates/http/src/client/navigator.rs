//! Client-side navigation used when a session can't be renewed

use tracing::info;

/// Sends the user to a client-side route
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, route: &str) {
        self(route)
    }
}

/// Navigator for headless clients: the redirect only shows up in the logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        info!(route, "Session ended, sign in again");
    }
}
