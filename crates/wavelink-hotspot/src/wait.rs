//! Bounded condition polling.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

/// Lower bound on the poll interval, whatever the caller asked for.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Repeatedly evaluate `predicate` until it reports true or `timeout`
/// elapses.
///
/// The predicate is evaluated at least once, immediately, even with a zero
/// timeout. A predicate error counts as a transient "not yet" and is logged
/// once per call to keep noisy probes out of the log. Performs no I/O of its
/// own (the probe supplies all of it) and runs entirely on the tokio clock,
/// so paused-clock tests drive it deterministically.
pub async fn wait_until<F, Fut, E>(mut predicate: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    let interval = interval.max(MIN_POLL_INTERVAL);
    let deadline = Instant::now() + timeout;
    let mut probe_error_logged = false;

    loop {
        match predicate().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(err) => {
                if !probe_error_logged {
                    debug!("condition probe failed, treating as not met: {err}");
                    probe_error_logged = true;
                }
            }
        }

        if Instant::now() >= deadline {
            return false;
        }
        sleep(interval).await;
    }
}
