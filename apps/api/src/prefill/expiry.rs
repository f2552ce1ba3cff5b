use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clock::Clock;
use crate::errors::AppError;
use crate::store::Store;

/// Marks pending intents whose token has run out as `expired`.
pub async fn sweep_expired(store: &dyn Store, clock: &dyn Clock) -> Result<u64, AppError> {
    let expired = store.expire_intents(clock.now()).await?;
    if expired > 0 {
        info!("Expired {expired} stale prefill intents");
    }
    Ok(expired)
}

pub fn spawn_expiry_sweeper(
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_expired(store.as_ref(), clock.as_ref()).await {
                error!("Intent expiry sweep failed: {e}");
            }
        }
    })
}
