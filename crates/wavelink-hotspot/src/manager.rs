//! Join orchestration and the public connectivity surface.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::applier::{ConfigApplier, SETTLE_DELAY};
use crate::backend::HotspotBackend;
use crate::diag::Diagnostics;
use crate::error::WifiError;
use crate::resolver::{SsidResolver, FETCH_TIMEOUT};
use crate::ssid;
use crate::wait::wait_until;

/// Tunables for one manager instance. The defaults are the values the
/// production flow was tuned around; tests shrink them freely.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Gates operational-failure logging.
    pub diagnostics: bool,
    /// Delay between association probes while polling.
    pub poll_interval: Duration,
    /// Pause after configuration removal before the next native call.
    pub settle_delay: Duration,
    /// Upper bound on one modern asynchronous SSID readout.
    pub fetch_timeout: Duration,
    /// Cap on each non-final polling slice; the final slice runs on
    /// whatever budget remains.
    pub poll_slice_cap: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            diagnostics: true,
            poll_interval: Duration::from_millis(200),
            settle_delay: SETTLE_DELAY,
            fetch_timeout: FETCH_TIMEOUT,
            poll_slice_cap: Duration::from_secs(15),
        }
    }
}

/// Best-effort snapshot of the connectivity state.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityStatus {
    /// Best-effort current SSID.
    pub ssid: Option<String>,
    /// Device-specific network identifier, when the platform has one.
    pub network_id: Option<String>,
    /// The SSID a successful `connect` recorded, still awaiting disconnect.
    pub joined: Option<String>,
}

/// Wi-Fi join orchestrator over a [`HotspotBackend`].
///
/// `connect` and `disconnect` never fail with an error: they settle to a
/// `bool`, and every native failure on the way is logged and folded into
/// the retry or failure path. Mutating operations are serialized per
/// instance; a second call issued mid-flight waits for the first.
pub struct HotspotManager<B: HotspotBackend> {
    backend: Arc<B>,
    resolver: SsidResolver<B>,
    applier: ConfigApplier<B>,
    diag: Diagnostics,
    config: ManagerConfig,
    joined: Mutex<Option<String>>,
    op_lock: tokio::sync::Mutex<()>,
}

impl<B: HotspotBackend> HotspotManager<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ManagerConfig::default())
    }

    pub fn with_config(backend: B, config: ManagerConfig) -> Self {
        let backend = Arc::new(backend);
        let diag = Diagnostics::new(config.diagnostics);
        let resolver = SsidResolver::new(Arc::clone(&backend), diag, config.fetch_timeout);
        let applier = ConfigApplier::new(Arc::clone(&backend), diag, config.settle_delay);
        Self {
            backend,
            resolver,
            applier,
            diag,
            config,
            joined: Mutex::new(None),
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The backend this manager drives.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Best-effort current SSID: kicks a background refresh and answers
    /// from the cache or the legacy synchronous readout.
    pub fn ssid(&self) -> Option<String> {
        self.resolver.current()
    }

    /// Confirmed current SSID, resolved through every readout layer.
    pub async fn ssid_confirmed(&self) -> Option<String> {
        self.resolver.confirmed().await
    }

    /// Device-specific identifier of the associated network.
    pub fn network_id(&self) -> Option<String> {
        match self.backend.current_network_id() {
            Ok(id) => id.filter(|v| !v.trim().is_empty()),
            Err(err) => {
                self.diag.failure("network id readout failed", &err);
                None
            }
        }
    }

    /// Best-effort snapshot for status displays.
    pub fn status(&self) -> ConnectivityStatus {
        ConnectivityStatus {
            ssid: self.ssid(),
            network_id: self.network_id(),
            joined: self.joined.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        }
    }

    /// Join `target` and confirm the association within `budget`.
    ///
    /// An empty passphrase means an open network. Returns true iff the
    /// confirmed SSID equals the target before the budget runs out; a
    /// failed attempt leaves the recorded join state untouched.
    pub async fn connect(&self, target: &str, passphrase: Option<&str>, budget: Duration) -> bool {
        let Some(target) = ssid::normalize(Some(target)) else {
            self.diag
                .failure("connect rejected", &"target ssid is empty or unknown");
            return false;
        };
        let passphrase = passphrase.filter(|p| !p.is_empty());

        let _op = self.op_lock.lock().await;
        let deadline = Instant::now() + budget;

        // Idempotent shortcut: already associated, no configuration touched.
        if self.resolver.confirmed().await.as_deref() == Some(target.as_str()) {
            debug!("already associated with {target}");
            self.record_joined(&target);
            return true;
        }

        if let Some(err) = self.applier.apply_with_fallback(&target, passphrase).await {
            self.diag.failure("join configuration rejected", &err);
            return false;
        }

        let observed = Mutex::new(BTreeSet::new());

        if self.poll_for(&target, &observed, self.slice(deadline, true)).await {
            self.record_joined(&target);
            return true;
        }

        if !self.remaining(deadline).is_zero() {
            if !self.reapply_persistent(&target, passphrase).await {
                return false;
            }
            if self.poll_for(&target, &observed, self.slice(deadline, true)).await {
                self.record_joined(&target);
                return true;
            }
        }

        if !self.remaining(deadline).is_zero() {
            if let Some(err) = self.applier.reset_and_apply(&target, passphrase).await {
                self.diag.failure("join configuration rejected after reset", &err);
                return false;
            }
            // Last attempt: no cap, whatever the budget still holds.
            if self.poll_for(&target, &observed, self.slice(deadline, false)).await {
                self.record_joined(&target);
                return true;
            }
        }

        let seen = observed.lock().unwrap_or_else(|e| e.into_inner());
        self.diag.failure(
            "association not confirmed",
            &format!("target {target:?} never observed; networks seen while polling: {seen:?}"),
        );
        false
    }

    /// Undo the most recent successful join and confirm the device left the
    /// network within `budget`.
    ///
    /// With no recorded join there is nothing to undo and the call succeeds
    /// without touching native state. On timeout all state is left as-is so
    /// the caller can retry with a fresh budget.
    pub async fn disconnect(&self, budget: Duration) -> bool {
        let _op = self.op_lock.lock().await;

        let Some(previous) = self
            .joined
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        else {
            return true;
        };

        if let Err(err) = self.backend.remove_configuration(&previous).await {
            self.diag.failure("configuration removal failed", &err);
        }

        let left_of = previous.as_str();
        let left = wait_until(
            || async move {
                Ok::<_, WifiError>(self.resolver.confirmed().await.as_deref() != Some(left_of))
            },
            budget,
            self.config.poll_interval,
        )
        .await;

        if left {
            info!("left {previous}");
            *self.joined.lock().unwrap_or_else(|e| e.into_inner()) = None;
            self.resolver.store(None);
            true
        } else {
            false
        }
    }

    async fn poll_for(
        &self,
        target: &str,
        observed: &Mutex<BTreeSet<String>>,
        slice: Duration,
    ) -> bool {
        wait_until(
            || async move {
                let current = self.resolver.confirmed().await;
                if let Some(current) = &current {
                    if current.as_str() != target {
                        observed
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .insert(current.clone());
                    }
                }
                Ok::<_, WifiError>(current.as_deref() == Some(target))
            },
            slice,
            self.config.poll_interval,
        )
        .await
    }

    /// Persistent re-apply between polling slices. True means keep polling.
    async fn reapply_persistent(&self, target: &str, passphrase: Option<&str>) -> bool {
        let Some(err) = self.applier.apply(target, passphrase, false).await else {
            return true;
        };
        if err.wants_reset_retry() {
            self.diag
                .failure("persistent re-apply failed, removing and retrying", &err);
            if let Some(err) = self.applier.reset_and_apply(target, passphrase).await {
                self.diag.failure("join configuration rejected after reset", &err);
                return false;
            }
            return true;
        }
        if err.recoverable() {
            self.diag
                .failure("configuration error treated as associated", &err);
            return true;
        }
        self.diag.failure("join configuration rejected", &err);
        false
    }

    fn record_joined(&self, target: &str) {
        *self.joined.lock().unwrap_or_else(|e| e.into_inner()) = Some(target.to_string());
        self.resolver.store(Some(target.to_string()));
    }

    fn remaining(&self, deadline: Instant) -> Duration {
        deadline.saturating_duration_since(Instant::now())
    }

    fn slice(&self, deadline: Instant, capped: bool) -> Duration {
        let remaining = self.remaining(deadline);
        if capped {
            remaining.min(self.config.poll_slice_cap)
        } else {
            remaining
        }
    }

    // The remaining queries have no implementation on this platform
    // variant. They fail loudly instead of guessing, so callers cannot
    // mistake "not implemented" for "disabled".

    pub fn is_wifi_enabled(&self) -> Result<bool, WifiError> {
        Err(WifiError::Unsupported("wifi enabled state"))
    }

    pub fn is_wifi_connected(&self) -> Result<bool, WifiError> {
        Err(WifiError::Unsupported("wifi connected state"))
    }

    pub fn is_cellular_enabled(&self) -> Result<bool, WifiError> {
        Err(WifiError::Unsupported("cellular enabled state"))
    }

    pub fn is_cellular_connected(&self) -> Result<bool, WifiError> {
        Err(WifiError::Unsupported("cellular connected state"))
    }

    pub fn is_gps_enabled(&self) -> Result<bool, WifiError> {
        Err(WifiError::Unsupported("gps enabled state"))
    }

    pub fn is_gps_connected(&self) -> Result<bool, WifiError> {
        Err(WifiError::Unsupported("gps connected state"))
    }

    pub fn has_internet(&self) -> Result<bool, WifiError> {
        Err(WifiError::Unsupported("internet reachability"))
    }

    pub fn scan_networks(&self) -> Result<Vec<String>, WifiError> {
        Err(WifiError::Unsupported("wifi network scan"))
    }
}
