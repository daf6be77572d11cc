//! Background push loop.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use liftsync_core::sync::AUTO_SYNC_INTERVAL_SECS;

use crate::session::SyncSession;

/// Owns the periodic push task for one session.
#[derive(Debug)]
pub struct AutoSync {
    interval: Duration,
    background_task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for AutoSync {
    fn default() -> Self {
        Self::new(Duration::from_secs(AUTO_SYNC_INTERVAL_SECS))
    }
}

impl AutoSync {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            background_task: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the loop. A second call while the loop is alive is a no-op.
    pub async fn start(&self, session: Arc<SyncSession>) {
        let mut guard = self.background_task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
            guard.take();
        }

        let period = self.interval;
        info!("[Sync] Auto sync every {}s", period.as_secs());
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = session.periodic_push().await;
                debug!("[Sync] Periodic push finished: {:?}", outcome);
            }
        });
        *guard = Some(handle);
    }

    pub async fn stop(&self) {
        let mut guard = self.background_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
            info!("[Sync] Auto sync stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.background_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
