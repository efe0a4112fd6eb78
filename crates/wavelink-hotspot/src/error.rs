use thiserror::Error;

use crate::backend::HotspotError;

/// Unified error type for wavelink-hotspot operations.
///
/// Join and disconnect never surface this type; their contract is a plain
/// `bool`. It exists for the read-style queries and for backends reporting
/// readout failures.
#[derive(Error, Debug)]
pub enum WifiError {
    /// The query has no implementation on this platform variant. Callers
    /// must not mistake this for "disabled" or "disconnected".
    #[error("operation not supported on this platform: {0}")]
    Unsupported(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A native readout call failed or the subsystem was unavailable.
    #[error("native readout failed: {0}")]
    Readout(String),

    #[error("hotspot configuration error: {0}")]
    Configuration(#[from] HotspotError),
}

pub type Result<T> = std::result::Result<T, WifiError>;
