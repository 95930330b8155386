// lib/src/simulator/scheduler.rs

use log::{debug, error};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A cancellable task that runs a blocking handler on a fixed period.
///
/// The handler runs on the blocking pool and is awaited before the next fire
/// is polled; fires missed while it runs are skipped, never queued. The first
/// fire happens one period after spawning.
pub struct RepeatingTask {
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    /// Must be called from within a tokio runtime.
    pub fn spawn<H>(period: Duration, handler: H) -> Self
    where
        H: Fn() + Send + Sync + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let handler = Arc::new(handler);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    _ = ticker.tick() => {}
                }
                let fire = Arc::clone(&handler);
                if let Err(e) = tokio::task::spawn_blocking(move || fire()).await {
                    error!("Repeating task handler failed: {}", e);
                }
            }
            debug!("Repeating task cancelled");
        });

        RepeatingTask { cancel_tx: Some(cancel_tx), handle }
    }

    /// Stops future fires. A fire already running is left to finish.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Cancels and waits until the task, including any running fire, has ended.
    pub async fn cancel_and_join(mut self) {
        self.cancel();
        if let Err(e) = self.handle.await {
            error!("Repeating task ended abnormally: {}", e);
        }
    }
}
