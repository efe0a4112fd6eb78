//! Join-configuration submission with layered fallback.
//!
//! The native configuration manager rejects requests for reasons that are
//! frequently worth retrying under a different policy: some devices refuse
//! transient ("join once") configurations, and the internal-error code often
//! clears after removing the stale configuration and letting native state
//! settle. The applier encodes that ladder; it classifies instead of
//! propagating, so a failed native call can never unwind an orchestration in
//! progress.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::backend::{HotspotBackend, HotspotError, JoinConfiguration};
use crate::diag::Diagnostics;

/// Pause after removing or re-applying a configuration, letting native
/// state converge before it is read again.
pub const SETTLE_DELAY: Duration = Duration::from_millis(400);

pub(crate) struct ConfigApplier<B: HotspotBackend> {
    backend: Arc<B>,
    diag: Diagnostics,
    settle_delay: Duration,
}

impl<B: HotspotBackend> ConfigApplier<B> {
    pub fn new(backend: Arc<B>, diag: Diagnostics, settle_delay: Duration) -> Self {
        Self {
            backend,
            diag,
            settle_delay,
        }
    }

    /// Submit one join configuration. `None` on success, the native error
    /// otherwise; never panics or propagates.
    pub async fn apply(
        &self,
        target: &str,
        passphrase: Option<&str>,
        join_once: bool,
    ) -> Option<HotspotError> {
        let config = JoinConfiguration::new(target, passphrase, join_once);
        self.backend.apply_configuration(&config).await.err()
    }

    /// Best-effort removal of any stale configuration for `target`, plus
    /// the settle pause.
    pub async fn remove_and_settle(&self, target: &str) {
        if let Err(err) = self.backend.remove_configuration(target).await {
            self.diag
                .failure("stale configuration removal failed", &err);
        }
        sleep(self.settle_delay).await;
    }

    /// Join-once apply with the persistent and reset-retry fallbacks.
    ///
    /// `None` means proceed to polling: the apply succeeded, or failed with
    /// a code close enough to success. `Some` is non-recoverable and the
    /// caller must fail fast.
    pub async fn apply_with_fallback(
        &self,
        target: &str,
        passphrase: Option<&str>,
    ) -> Option<HotspotError> {
        self.remove_and_settle(target).await;

        let Some(err) = self.apply(target, passphrase, true).await else {
            return None;
        };

        if err.wants_persistent_retry() {
            self.diag
                .failure("transient configuration rejected, retrying as persistent", &err);
            let Some(err) = self.apply(target, passphrase, false).await else {
                return None;
            };
            if err.wants_reset_retry() {
                self.diag
                    .failure("persistent apply failed, removing and retrying", &err);
                return self.reset_and_apply(target, passphrase).await;
            }
            return self.accept_if_recoverable(err);
        }

        if err.wants_reset_retry() {
            self.diag
                .failure("apply failed, removing and retrying", &err);
            return self.reset_and_apply(target, passphrase).await;
        }

        self.accept_if_recoverable(err)
    }

    /// Remove the configuration, settle, and apply fresh as persistent.
    /// Classified like [`Self::apply_with_fallback`]: `None` means proceed.
    pub async fn reset_and_apply(
        &self,
        target: &str,
        passphrase: Option<&str>,
    ) -> Option<HotspotError> {
        self.remove_and_settle(target).await;
        match self.apply(target, passphrase, false).await {
            None => None,
            Some(err) => self.accept_if_recoverable(err),
        }
    }

    fn accept_if_recoverable(&self, err: HotspotError) -> Option<HotspotError> {
        if err.recoverable() {
            self.diag
                .failure("configuration error treated as associated", &err);
            None
        } else {
            Some(err)
        }
    }
}
