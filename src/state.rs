use crate::config::Config;
use crate::scoring::locks::ScoringLocks;
use axum::extract::FromRef;
use sqlx::PgPool;

/// Shared application state: database pool, configuration and the scoring
/// lock registry. Handlers extract the piece they need via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub locks: ScoringLocks,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for ScoringLocks {
    fn from_ref(state: &AppState) -> Self {
        state.locks.clone()
    }
}
