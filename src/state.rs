use deadpool_postgres::Pool;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::realtime::presence::PresenceRegistry;

/// The application's state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The single process-wide presence registry. Torn down with the process.
    pub presence: Arc<PresenceRegistry>,
    /// Shared HTTP client for image-hosting uploads.
    pub http: reqwest::Client,
}

impl AppState {
    /// Creates a new `AppState`. The pool connects lazily; schema bootstrap
    /// happens separately at startup.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("PostgreSQL pool initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            presence: Arc::new(PresenceRegistry::new()),
            http: reqwest::Client::new(),
        })
    }
}
