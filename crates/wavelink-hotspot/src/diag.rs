//! Operational-failure logging gate.

use std::fmt::Display;

use tracing::warn;

/// Controls whether native-call failures are written to the log.
///
/// Injected at construction rather than read from process-wide state, so two
/// managers in one process can disagree. Defaults to on.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Record an operational failure that was folded into a negative result.
    pub(crate) fn failure(&self, context: &str, err: &dyn Display) {
        if self.enabled {
            warn!("{context}: {err}");
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self { enabled: true }
    }
}
