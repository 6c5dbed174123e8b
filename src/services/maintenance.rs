//! Background sweep for dead confirmation tokens.
//!
//! Activation deletes a confirmation token when it is used, but tokens of
//! users who never click the link would pile up forever. Reset tokens are
//! exempt: they stay around as an audit trail of the `used` flag.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::db::Store;

/// Spawns the sweeper, or returns `None` when the interval is zero.
pub fn spawn_token_sweeper(store: Store, interval_minutes: u64) -> Option<JoinHandle<()>> {
    if interval_minutes == 0 {
        info!("Token sweep disabled");
        return None;
    }

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        // First tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store
                .delete_expired_confirmation_tokens(chrono::Utc::now())
                .await
            {
                Ok(0) => {}
                Ok(swept) => {
                    metrics::counter!("confirmation_tokens_swept_total").increment(swept);
                    info!(swept, "Swept expired confirmation tokens");
                }
                Err(err) => error!(%err, "Confirmation token sweep failed"),
            }
        }
    });

    Some(handle)
}
