use std::sync::Arc;

pub mod access_log;
pub mod analytics;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod server;

use access_log::LogSource;
use config::AppConfig;
use middleware::auth::CredentialProvider;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: AppConfig,

    /// Where raw access-log entries come from (file tail or demo traffic).
    pub source: Arc<dyn LogSource>,

    /// Supplies the token the bearer middleware checks against.
    pub credentials: Arc<dyn CredentialProvider>,
}
