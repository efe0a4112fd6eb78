//! Native hotspot seam.
//!
//! The OS surface this crate drives (SSID readout primitives and the
//! configuration manager) is partially reliable and differs between OS
//! builds. It is modeled as the [`HotspotBackend`] trait so the orchestration
//! logic stays platform-free; the phone-side shell implements it over the
//! real native calls, and [`crate::sim::SimBackend`] implements it for host
//! development and tests.

use std::future::Future;

use thiserror::Error;

use crate::error::WifiError;

/// Native configuration-manager error codes the retry policy keys on.
///
/// Values match the numeric codes emitted by the mobile configuration
/// subsystem; everything else is treated as non-recoverable.
pub const CODE_INTERNAL: i64 = 8;
pub const CODE_PENDING: i64 = 9;
pub const CODE_JOIN_ONCE_NOT_SUPPORTED: i64 = 12;
pub const CODE_ALREADY_ASSOCIATED: i64 = 13;

/// A native configuration error: numeric code plus the OS message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct HotspotError {
    pub code: i64,
    pub message: String,
}

impl HotspotError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Close enough to success to proceed to polling for the target SSID.
    pub fn recoverable(&self) -> bool {
        matches!(
            self.code,
            CODE_ALREADY_ASSOCIATED | CODE_PENDING | CODE_INTERNAL
        )
    }

    /// The device rejects transient configurations; retry as persistent.
    pub fn wants_persistent_retry(&self) -> bool {
        self.code == CODE_JOIN_ONCE_NOT_SUPPORTED
    }

    /// Worth removing the stale configuration and applying fresh.
    pub fn wants_reset_retry(&self) -> bool {
        self.code == CODE_INTERNAL
    }
}

/// A join request as submitted to the native configuration manager.
///
/// Secured when a passphrase is present, open otherwise. `join_once` asks
/// the OS not to persist the configuration after use; not every device
/// supports that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinConfiguration {
    pub ssid: String,
    pub passphrase: Option<String>,
    pub join_once: bool,
}

impl JoinConfiguration {
    pub fn new(ssid: &str, passphrase: Option<&str>, join_once: bool) -> Self {
        Self {
            ssid: ssid.to_string(),
            passphrase: passphrase.map(str::to_string),
            join_once,
        }
    }

    pub fn is_open(&self) -> bool {
        self.passphrase.is_none()
    }
}

/// The native calls the orchestration core depends on.
///
/// Every method is fallible; callers treat failures as "nothing learned"
/// rather than propagating them. Readouts return the raw value as emitted by
/// the OS; normalization happens in [`crate::ssid::normalize`].
pub trait HotspotBackend: Send + Sync + 'static {
    /// Legacy synchronous readout of the associated SSID.
    fn copy_current_ssid(&self) -> Result<Option<String>, WifiError>;

    /// Whether the modern completion-based readout exists on this OS build.
    /// When false the resolver never calls [`Self::fetch_current_ssid`].
    fn supports_fetch(&self) -> bool {
        true
    }

    /// Modern asynchronous readout of the associated SSID.
    fn fetch_current_ssid(&self) -> impl Future<Output = Result<Option<String>, WifiError>> + Send;

    /// Submit a join configuration to the native configuration manager.
    fn apply_configuration(
        &self,
        config: &JoinConfiguration,
    ) -> impl Future<Output = Result<(), HotspotError>> + Send;

    /// Remove any installed configuration for `ssid`. Removing a
    /// configuration that was never installed is not an error.
    fn remove_configuration(&self, ssid: &str)
        -> impl Future<Output = Result<(), WifiError>> + Send;

    /// Device-specific identifier of the associated network, if the platform
    /// exposes one.
    fn current_network_id(&self) -> Result<Option<String>, WifiError>;
}
