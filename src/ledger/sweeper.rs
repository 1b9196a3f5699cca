use super::SessionLedger;
use std::{sync::Arc, time::Duration};
use tokio::{select, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const MAX_IDLE: Duration = Duration::from_secs(2 * 60 * 60);

/// Policy for closing dialogs that never saw their terminating message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOption {
    /// How often the ledger is scanned.
    pub interval: Duration,
    /// A dialog silent for at least this long is closed.
    pub max_idle: Duration,
}

impl Default for SweepOption {
    fn default() -> Self {
        Self {
            interval: SWEEP_INTERVAL,
            max_idle: MAX_IDLE,
        }
    }
}

/// Close every dialog idle for `max_idle` through the regular update path.
/// Returns how many sessions were closed.
pub fn sweep_once(ledger: &SessionLedger, max_idle: Duration) -> usize {
    ledger.sweep_idle(max_idle)
}

pub async fn run_sweeper(
    ledger: Arc<SessionLedger>,
    option: SweepOption,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(option.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;
    info!(
        "session sweeper started, interval {:?} max idle {:?}",
        option.interval, option.max_idle
    );
    loop {
        select! {
            _ = cancel_token.cancelled() => {
                info!("session sweeper cancelled");
                break;
            }
            _ = ticker.tick() => {
                let closed = sweep_once(&ledger, option.max_idle);
                if closed > 0 {
                    info!("swept {} idle sessions, active {}", closed, ledger.active());
                }
            }
        }
    }
}
