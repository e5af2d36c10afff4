use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use tipline_crypto::{CodeHasher, SessionTokens};
use tipline_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub hasher: CodeHasher,
    pub tokens: SessionTokens,
    /// Session lifetime, checked when a bearer token is verified.
    pub token_max_age: Duration,
}

/// Run blocking work (SQLite, Argon2) off the async runtime.
pub async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}
