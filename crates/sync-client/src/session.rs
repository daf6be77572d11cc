//! Client sync session.
//!
//! Every network operation is gated on the `available` flag, which only a
//! successful connectivity test sets. Operations that move data share one
//! in-flight guard; a request arriving while another runs is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{Mutex, MutexGuard};

use liftsync_core::sync::{SyncCycleTrigger, SyncOutcome, SyncSeverity};

use crate::client::SyncApiClient;
use crate::dataset::LocalDataset;
use crate::error::SyncClientError;
use crate::status::SyncStatusSink;

pub struct SyncSession {
    client: SyncApiClient,
    user_id: String,
    dataset: Arc<dyn LocalDataset>,
    status: Arc<dyn SyncStatusSink>,
    available: AtomicBool,
    network_online: AtomicBool,
    in_flight: Mutex<()>,
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("endpoint", &self.client.endpoint())
            .field("user_id", &self.user_id)
            .field("available", &self.is_available())
            .field("network_online", &self.is_network_online())
            .finish_non_exhaustive()
    }
}

impl SyncSession {
    pub fn new(
        client: SyncApiClient,
        user_id: impl Into<String>,
        dataset: Arc<dyn LocalDataset>,
        status: Arc<dyn SyncStatusSink>,
    ) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            dataset,
            status,
            available: AtomicBool::new(false),
            network_online: AtomicBool::new(true),
            in_flight: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &SyncApiClient {
        &self.client
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn is_network_online(&self) -> bool {
        self.network_online.load(Ordering::SeqCst)
    }

    fn notify(&self, message: &str, severity: SyncSeverity) {
        self.status.notify(message, severity);
    }

    fn try_begin(&self, trigger: SyncCycleTrigger) -> Option<MutexGuard<'_, ()>> {
        match self.in_flight.try_lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                debug!(
                    "[Sync] Dropping {} request: another sync operation is in flight",
                    trigger.as_str()
                );
                None
            }
        }
    }

    fn record_transport_failure(&self, context: &str, err: &SyncClientError) {
        self.available.store(false, Ordering::SeqCst);
        warn!("[Sync] {} failed: {}", context, err);
        if err.is_auth_rejected() {
            self.notify("Server rejected the API key", SyncSeverity::Error);
        }
    }

    /// Startup: probe the server and pull when it answers.
    pub async fn initialize(&self) -> SyncOutcome {
        if !self.test_connectivity().await {
            info!("[Sync] Server unavailable at startup, working offline");
            return SyncOutcome::Failed;
        }
        let Some(_guard) = self.try_begin(SyncCycleTrigger::Startup) else {
            return SyncOutcome::Skipped;
        };
        self.pull().await
    }

    /// Probe the server once. Sets the availability flag from the result.
    pub async fn test_connectivity(&self) -> bool {
        match self.client.test().await {
            Ok(response) if response.success => {
                self.available.store(true, Ordering::SeqCst);
                debug!(
                    "[Sync] Server online (version {})",
                    response.version.as_deref().unwrap_or("unknown")
                );
                true
            }
            Ok(_) => {
                self.available.store(false, Ordering::SeqCst);
                warn!("[Sync] Connectivity test answered without success");
                false
            }
            Err(err) => {
                self.record_transport_failure("Connectivity test", &err);
                false
            }
        }
    }

    /// Pull the user's record into the local dataset.
    pub async fn load(&self) -> SyncOutcome {
        if !self.is_available() {
            return SyncOutcome::Failed;
        }
        let Some(_guard) = self.try_begin(SyncCycleTrigger::Manual) else {
            return SyncOutcome::Skipped;
        };
        self.pull().await
    }

    /// Push the local dataset as the user's whole record.
    pub async fn save(&self) -> SyncOutcome {
        if !self.is_available() {
            return SyncOutcome::Failed;
        }
        let Some(_guard) = self.try_begin(SyncCycleTrigger::Manual) else {
            return SyncOutcome::Skipped;
        };
        self.push().await
    }

    /// Push then pull, testing connectivity first when the server was unavailable.
    pub async fn sync_now(&self) -> SyncOutcome {
        let Some(_guard) = self.try_begin(SyncCycleTrigger::Manual) else {
            return SyncOutcome::Skipped;
        };
        self.run_full_sync().await
    }

    /// Persist to host storage, then push when the server is available.
    ///
    /// The local persist always runs; only the push is subject to the in-flight guard.
    pub async fn persist_locally_then_sync(&self) -> SyncOutcome {
        if let Err(err) = self.dataset.persist_locally() {
            warn!("[Sync] Local persist failed: {}", err);
            self.notify(&format!("Local save failed: {}", err), SyncSeverity::Error);
            return SyncOutcome::Failed;
        }
        if !self.is_available() {
            self.notify("Saved locally, server unavailable", SyncSeverity::Warning);
            return SyncOutcome::Failed;
        }
        let Some(_guard) = self.try_begin(SyncCycleTrigger::LocalMutation) else {
            return SyncOutcome::Skipped;
        };
        self.push().await
    }

    /// Timer-driven push. Does nothing while offline or unavailable.
    pub async fn periodic_push(&self) -> SyncOutcome {
        if !self.is_available() || !self.is_network_online() {
            debug!("[Sync] Periodic push skipped: session offline");
            return SyncOutcome::Skipped;
        }
        let Some(_guard) = self.try_begin(SyncCycleTrigger::Periodic) else {
            return SyncOutcome::Skipped;
        };
        self.push().await
    }

    pub async fn handle_network_online(&self) -> SyncOutcome {
        self.network_online.store(true, Ordering::SeqCst);
        info!("[Sync] Network online, testing server");
        if !self.test_connectivity().await {
            return SyncOutcome::Failed;
        }
        let Some(_guard) = self.try_begin(SyncCycleTrigger::NetworkOnline) else {
            return SyncOutcome::Skipped;
        };
        self.run_full_sync().await
    }

    pub fn handle_network_offline(&self) {
        self.network_online.store(false, Ordering::SeqCst);
        self.available.store(false, Ordering::SeqCst);
        info!("[Sync] Network offline");
        self.notify("Offline: changes stay local", SyncSeverity::Warning);
    }

    async fn run_full_sync(&self) -> SyncOutcome {
        self.notify("Syncing...", SyncSeverity::Info);
        if !self.is_available() && !self.test_connectivity().await {
            self.notify("Server unreachable", SyncSeverity::Error);
            return SyncOutcome::Failed;
        }

        // Pull only after the push has settled so the server copy echoes ours.
        let pushed = self.push().await;
        if !pushed.is_success() {
            return pushed;
        }
        self.pull().await
    }

    async fn pull(&self) -> SyncOutcome {
        let response = match self.client.load(&self.user_id).await {
            Ok(response) => response,
            Err(err) => {
                self.record_transport_failure("Load", &err);
                self.notify("Offline mode: using local data", SyncSeverity::Warning);
                return SyncOutcome::Failed;
            }
        };

        let data = match response.data {
            Some(data) if response.success => data,
            _ => {
                let reason = response.error.as_deref().unwrap_or("no data");
                info!("[Sync] Load for '{}' returned nothing: {}", self.user_id, reason);
                self.notify(
                    &format!("Offline mode: {}", reason),
                    SyncSeverity::Warning,
                );
                return SyncOutcome::Failed;
            }
        };

        if let Err(err) = self.dataset.replace(data) {
            warn!("[Sync] Could not apply pulled data: {}", err);
            self.notify(&format!("Load failed: {}", err), SyncSeverity::Error);
            return SyncOutcome::Failed;
        }
        debug!(
            "[Sync] Pulled record for '{}' (last update {})",
            self.user_id,
            response.last_update.as_deref().unwrap_or("unknown")
        );
        self.notify("Data loaded from server", SyncSeverity::Success);
        SyncOutcome::Completed
    }

    async fn push(&self) -> SyncOutcome {
        let data = match self.dataset.snapshot() {
            Ok(data) => data,
            Err(err) => {
                self.notify(&format!("Save failed: {}", err), SyncSeverity::Error);
                return SyncOutcome::Failed;
            }
        };

        match self.client.save(&self.user_id, &data).await {
            Ok(response) if response.success => {
                debug!("[Sync] Pushed record for '{}'", self.user_id);
                self.notify("Data saved to server", SyncSeverity::Success);
                SyncOutcome::Completed
            }
            Ok(response) => {
                let reason = response.error.unwrap_or_else(|| "unknown error".to_string());
                self.notify(&format!("Save failed: {}", reason), SyncSeverity::Error);
                SyncOutcome::Failed
            }
            Err(err) => {
                self.record_transport_failure("Save", &err);
                self.notify(&format!("Save failed: {}", err), SyncSeverity::Error);
                SyncOutcome::Failed
            }
        }
    }
}
