//! Layered SSID resolution.
//!
//! No single native readout is authoritative across OS builds: the legacy
//! synchronous call lies on newer systems, the modern asynchronous call is
//! slow and sometimes absent. The resolver layers them, fast path first,
//! bounded async path second, legacy value as the fallback, so every caller
//! gets *a* value within bounded latency, trading accuracy for availability.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::backend::HotspotBackend;
use crate::diag::Diagnostics;
use crate::ssid;

/// Upper bound on one modern asynchronous readout.
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(1500);

/// One readout layer of the confirmed resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadoutLayer {
    /// Legacy synchronous readout.
    Sync,
    /// Modern completion-based readout, bounded by the fetch timeout and
    /// skipped when the OS build does not expose it.
    Fetch,
}

/// The confirmed-read fallback order: fast synchronous path, the bounded
/// modern fetch, and the synchronous readout again for builds where the
/// modern path answers without knowing anything.
pub const CONFIRMED_CHAIN: [ReadoutLayer; 3] =
    [ReadoutLayer::Sync, ReadoutLayer::Fetch, ReadoutLayer::Sync];

/// Cached, coalescing front-end over the native SSID readouts.
///
/// Holds a single-slot cache of the last resolved SSID (process lifetime, no
/// expiry) and at most one in-flight background refresh; refresh requests
/// arriving while one is outstanding are coalesced onto it. Cheap to clone;
/// clones share the cache and the refresh slot.
pub struct SsidResolver<B: HotspotBackend> {
    inner: Arc<Inner<B>>,
}

struct Inner<B: HotspotBackend> {
    backend: Arc<B>,
    diag: Diagnostics,
    fetch_timeout: Duration,
    cached: Mutex<Option<String>>,
    in_flight: Mutex<Option<watch::Receiver<bool>>>,
}

impl<B: HotspotBackend> Clone for SsidResolver<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: HotspotBackend> SsidResolver<B> {
    pub fn new(backend: Arc<B>, diag: Diagnostics, fetch_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                diag,
                fetch_timeout,
                cached: Mutex::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Last resolved SSID, if any.
    pub fn cached(&self) -> Option<String> {
        self.inner.cached_value()
    }

    pub(crate) fn store(&self, value: Option<String>) {
        self.inner.store(value);
    }

    /// Best-effort read: kick a background refresh, answer with what is
    /// known right now. Never awaits the refresh.
    ///
    /// Outside a tokio runtime no refresh task is spawned; the synchronous
    /// fallback still serves the caller.
    pub fn current(&self) -> Option<String> {
        self.spawn_refresh();
        if let Some(known) = self.inner.cached_value() {
            return Some(known);
        }
        let legacy = self.inner.read_legacy();
        if legacy.is_some() {
            self.inner.store(legacy.clone());
        }
        legacy
    }

    /// Confirmed read: fast synchronous path first, then the bounded modern
    /// fetch, then the legacy value as fallback. Whatever resolves is
    /// written to the cache before being returned.
    pub async fn confirmed(&self) -> Option<String> {
        self.inner.confirmed().await
    }

    /// Start a background refresh unless one is already in flight.
    pub fn spawn_refresh(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let mut slot = self.inner.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return;
        }

        let (tx, rx) = watch::channel(false);
        *slot = Some(rx);
        drop(slot);

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            let _ = inner.confirmed().await;
            *inner.in_flight.lock().unwrap_or_else(|e| e.into_inner()) = None;
            let _ = tx.send(true);
        });
    }

    /// Wait for the in-flight refresh (if any) to settle, then return the
    /// cache. Callers arriving mid-refresh observe that refresh's result.
    pub async fn refreshed(&self) -> Option<String> {
        let pending = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(mut rx) = pending {
            // A dropped sender means the refresh already settled.
            let _ = rx.wait_for(|done| *done).await;
        }
        self.inner.cached_value()
    }
}

impl<B: HotspotBackend> Inner<B> {
    fn cached_value(&self) -> Option<String> {
        self.cached
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn store(&self, value: Option<String>) {
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }

    fn read_legacy(&self) -> Option<String> {
        match self.backend.copy_current_ssid() {
            Ok(raw) => ssid::normalize(raw.as_deref()),
            Err(err) => {
                self.diag.failure("synchronous ssid readout failed", &err);
                None
            }
        }
    }

    /// Walk the confirmed chain: first layer to yield a value wins; the
    /// result, whatever it is, overwrites the cache.
    async fn confirmed(&self) -> Option<String> {
        let mut resolved = None;
        for layer in CONFIRMED_CHAIN {
            if let Some(value) = self.probe(layer).await {
                resolved = Some(value);
                break;
            }
        }
        self.store(resolved.clone());
        resolved
    }

    async fn probe(&self, layer: ReadoutLayer) -> Option<String> {
        match layer {
            ReadoutLayer::Sync => self.read_legacy(),
            ReadoutLayer::Fetch => {
                if !self.backend.supports_fetch() {
                    return None;
                }
                match tokio::time::timeout(self.fetch_timeout, self.backend.fetch_current_ssid())
                    .await
                {
                    Ok(Ok(raw)) => ssid::normalize(raw.as_deref()),
                    Ok(Err(err)) => {
                        self.diag.failure("asynchronous ssid readout failed", &err);
                        None
                    }
                    Err(_) => {
                        debug!(
                            "asynchronous ssid readout timed out after {:?}",
                            self.fetch_timeout
                        );
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HotspotError, JoinConfiguration};
    use crate::error::WifiError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Readout-only fake; apply/remove are unreachable in these tests.
    struct ReadoutBackend {
        legacy: Mutex<VecDeque<Result<Option<String>, WifiError>>>,
        fetch: Mutex<VecDeque<Result<Option<String>, WifiError>>>,
        fetch_delay: Duration,
        fetch_calls: AtomicUsize,
        has_fetch: bool,
    }

    impl ReadoutBackend {
        fn new() -> Self {
            Self {
                legacy: Mutex::new(VecDeque::new()),
                fetch: Mutex::new(VecDeque::new()),
                fetch_delay: Duration::ZERO,
                fetch_calls: AtomicUsize::new(0),
                has_fetch: true,
            }
        }

        fn legacy_returns(self, values: &[Option<&str>]) -> Self {
            let mut queue = self.legacy.lock().unwrap();
            for v in values {
                queue.push_back(Ok(v.map(str::to_string)));
            }
            drop(queue);
            self
        }

        fn fetch_returns(self, values: &[Option<&str>]) -> Self {
            let mut queue = self.fetch.lock().unwrap();
            for v in values {
                queue.push_back(Ok(v.map(str::to_string)));
            }
            drop(queue);
            self
        }

        fn fetch_delayed(mut self, delay: Duration) -> Self {
            self.fetch_delay = delay;
            self
        }

        fn without_fetch(mut self) -> Self {
            self.has_fetch = false;
            self
        }

        fn pop(
            queue: &Mutex<VecDeque<Result<Option<String>, WifiError>>>,
        ) -> Result<Option<String>, WifiError> {
            queue.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    impl HotspotBackend for ReadoutBackend {
        fn copy_current_ssid(&self) -> Result<Option<String>, WifiError> {
            Self::pop(&self.legacy)
        }

        fn supports_fetch(&self) -> bool {
            self.has_fetch
        }

        async fn fetch_current_ssid(&self) -> Result<Option<String>, WifiError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.fetch_delay).await;
            Self::pop(&self.fetch)
        }

        async fn apply_configuration(
            &self,
            _config: &JoinConfiguration,
        ) -> Result<(), HotspotError> {
            unreachable!("readout-only fake")
        }

        async fn remove_configuration(&self, _ssid: &str) -> Result<(), WifiError> {
            unreachable!("readout-only fake")
        }

        fn current_network_id(&self) -> Result<Option<String>, WifiError> {
            Ok(None)
        }
    }

    fn resolver(backend: ReadoutBackend) -> (Arc<ReadoutBackend>, SsidResolver<ReadoutBackend>) {
        let backend = Arc::new(backend);
        let resolver = SsidResolver::new(Arc::clone(&backend), Diagnostics::default(), FETCH_TIMEOUT);
        (backend, resolver)
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn confirmed_prefers_the_fast_path() {
        let (backend, r) = resolver(ReadoutBackend::new().legacy_returns(&[Some("\"Cafe\"")]));
        assert_eq!(r.confirmed().await.as_deref(), Some("Cafe"));
        assert_eq!(r.cached().as_deref(), Some("Cafe"));
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn confirmed_falls_through_to_the_modern_path() {
        let (_backend, r) = resolver(
            ReadoutBackend::new()
                .legacy_returns(&[None])
                .fetch_returns(&[Some("Cafe")]),
        );
        assert_eq!(r.confirmed().await.as_deref(), Some("Cafe"));
        assert_eq!(r.cached().as_deref(), Some("Cafe"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn empty_modern_answer_falls_back_to_legacy() {
        let (_backend, r) = resolver(
            ReadoutBackend::new()
                .legacy_returns(&[None, Some("Home")])
                .fetch_returns(&[Some("<unknown ssid>")]),
        );
        assert_eq!(r.confirmed().await.as_deref(), Some("Home"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn fetch_timeout_resolves_with_the_legacy_value() {
        let (_backend, r) = resolver(
            ReadoutBackend::new()
                .legacy_returns(&[None, Some("Home")])
                .fetch_returns(&[Some("Cafe")])
                .fetch_delayed(Duration::from_secs(5)),
        );
        assert_eq!(r.confirmed().await.as_deref(), Some("Home"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn missing_modern_path_is_detected_before_use() {
        let (backend, r) = resolver(
            ReadoutBackend::new()
                .without_fetch()
                .legacy_returns(&[None, Some("Home")]),
        );
        assert_eq!(r.confirmed().await.as_deref(), Some("Home"));
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn confirmed_overwrites_the_cache_even_with_nothing() {
        let (_backend, r) = resolver(ReadoutBackend::new().legacy_returns(&[Some("Cafe")]));
        assert_eq!(r.confirmed().await.as_deref(), Some("Cafe"));
        // Second resolution finds nothing anywhere; the stale value goes.
        assert_eq!(r.confirmed().await, None);
        assert_eq!(r.cached(), None);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn concurrent_refreshes_coalesce_onto_one_fetch() {
        let (backend, r) = resolver(
            ReadoutBackend::new()
                .fetch_returns(&[Some("Cafe")])
                .fetch_delayed(Duration::from_millis(300)),
        );

        r.spawn_refresh();
        r.spawn_refresh();
        r.spawn_refresh();

        assert_eq!(r.refreshed().await.as_deref(), Some("Cafe"));
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn best_effort_serves_the_legacy_value_when_cold() {
        let (_backend, r) = resolver(
            ReadoutBackend::new()
                .legacy_returns(&[Some("Home")])
                .fetch_delayed(Duration::from_secs(1)),
        );
        assert_eq!(r.current().as_deref(), Some("Home"));
    }
}
