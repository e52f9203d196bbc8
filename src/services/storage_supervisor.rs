use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::state::SharedState;

use super::sse_events;

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Poll the persistence backend and flip degraded mode when it becomes
/// unreachable. Settings and whitelist mirrors keep serving reads while
/// degraded; mutations surface the storage error to their callers.
pub async fn run(state: SharedState) {
    let store = state.store();

    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                    sse_events::broadcast_system_status(&state, false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                if !state.is_degraded() {
                    warn!(error = %err, "storage health check failed; entering degraded mode");
                    state.update_degraded(true);
                    sse_events::broadcast_system_status(&state, true);
                }

                let mut attempt = 0;
                let mut delay = INITIAL_DELAY;
                let mut reconnected = false;
                while attempt < MAX_RECONNECT_ATTEMPTS {
                    match store.try_reconnect().await {
                        Ok(()) => {
                            info!("storage reconnection succeeded");
                            reconnected = true;
                            break;
                        }
                        Err(reconnect_err) => {
                            warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                            attempt += 1;
                            sleep(delay).await;
                            delay = (delay * 2).min(MAX_DELAY);
                        }
                    }
                }

                if reconnected {
                    state.update_degraded(false);
                    sse_events::broadcast_system_status(&state, false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}
