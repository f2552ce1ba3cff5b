use std::sync::Arc;

use crate::auth::TokenService;
use crate::clock::Clock;
use crate::config::Config;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable persistence. Default: `PgStore`.
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub tokens: TokenService,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: Config) -> Self {
        let tokens = TokenService::new(
            store.clone(),
            clock.clone(),
            chrono::Duration::minutes(config.intent_ttl_minutes),
        );
        Self {
            store,
            clock,
            tokens,
            config,
        }
    }
}
