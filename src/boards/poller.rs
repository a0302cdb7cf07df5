use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};

use super::OrderBoard;

/// Periodically re-fetches orders so status changes made elsewhere show up.
/// It never changes an order's status itself.
pub struct OrderPoller;

impl OrderPoller {
    /// Starts polling. Returns `None` when `interval` is zero.
    pub fn spawn(board: OrderBoard, interval: Duration) -> Option<PollerHandle> {
        if interval.is_zero() {
            info!("Order polling disabled");
            return None;
        }

        let (stop, mut stopped) = oneshot::channel::<()>();
        let task = async move {
            info!(interval_secs = interval.as_secs_f64(), "Order poller starting");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the caller has just loaded.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => match board.fetch().await {
                        Ok(count) => debug!(count, "Orders polled"),
                        Err(e) => warn!(error = %e, "Order poll failed"),
                    },
                }
            }
            info!("Order poller stopped");
        };

        let handle = tokio::spawn(task.instrument(info_span!("order_poller")));
        Some(PollerHandle { stop, handle })
    }
}

pub struct PollerHandle {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(self) -> Result<(), String> {
        let _ = self.stop.send(());
        self.handle.await.map_err(|e| format!("Poller task failed: {:?}", e))
    }
}
