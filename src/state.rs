use crate::config::Config;
use crate::store::Store;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the store ports; `PgStore` in production, an
    /// in-memory implementation in the integration tests.
    pub store: Arc<dyn Store>,
    pub config: Config,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
