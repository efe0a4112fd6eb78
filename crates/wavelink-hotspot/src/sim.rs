//! Deterministic device simulation.
//!
//! The real backend only exists on the phone; this one models enough of a
//! device for host-side development, the demo CLI, and end-to-end tests:
//! known networks with passphrases, association that takes a configurable
//! number of readout polls to land, installable configurations, an optional
//! network the device drifts back to when its current one is torn down, and
//! a queue of scripted apply failures for exercising the retry ladder.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::backend::{HotspotBackend, HotspotError, JoinConfiguration};
use crate::error::WifiError;

#[derive(Default)]
struct SimState {
    current: Option<String>,
    networks: HashMap<String, Option<String>>,
    installed: HashSet<String>,
    pending: Option<PendingJoin>,
    scripted_apply_failures: VecDeque<HotspotError>,
    fetch_calls: usize,
    apply_calls: usize,
    remove_calls: usize,
}

struct PendingJoin {
    ssid: String,
    reads_left: u32,
}

/// In-process device model implementing [`HotspotBackend`].
pub struct SimBackend {
    state: Mutex<SimState>,
    join_latency_reads: u32,
    rejoin: Option<String>,
}

impl SimBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            join_latency_reads: 2,
            rejoin: None,
        }
    }

    /// Register a network the device can associate with. `None` passphrase
    /// means open.
    pub fn with_network(self, ssid: &str, passphrase: Option<&str>) -> Self {
        self.lock()
            .networks
            .insert(ssid.to_string(), passphrase.map(str::to_string));
        self
    }

    /// Start the simulation already associated with `ssid`.
    pub fn with_current(self, ssid: &str) -> Self {
        self.lock().current = Some(ssid.to_string());
        self
    }

    /// Number of readout polls before a join lands.
    pub fn with_join_latency(mut self, reads: u32) -> Self {
        self.join_latency_reads = reads;
        self
    }

    /// Network the device drifts back to after its current one is removed.
    pub fn with_rejoin(mut self, ssid: &str) -> Self {
        self.rejoin = Some(ssid.to_string());
        self
    }

    /// Fail the next apply with `err`, once.
    pub fn fail_next_apply(&self, err: HotspotError) {
        self.lock().scripted_apply_failures.push_back(err);
    }

    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    pub fn apply_calls(&self) -> usize {
        self.lock().apply_calls
    }

    pub fn remove_calls(&self) -> usize {
        self.lock().remove_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// One readout tick: pending joins creep closer and land.
    fn advance_and_read(&self) -> Option<String> {
        let mut state = self.lock();
        if let Some(pending) = &mut state.pending {
            if pending.reads_left == 0 {
                let landed = pending.ssid.clone();
                state.pending = None;
                state.current = Some(landed);
            } else {
                pending.reads_left -= 1;
            }
        }
        state.current.clone()
    }

    fn schedule_join(&self, state: &mut SimState, ssid: &str) {
        state.pending = Some(PendingJoin {
            ssid: ssid.to_string(),
            reads_left: self.join_latency_reads,
        });
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HotspotBackend for SimBackend {
    fn copy_current_ssid(&self) -> Result<Option<String>, WifiError> {
        Ok(self.advance_and_read())
    }

    async fn fetch_current_ssid(&self) -> Result<Option<String>, WifiError> {
        self.lock().fetch_calls += 1;
        Ok(self.advance_and_read())
    }

    async fn apply_configuration(&self, config: &JoinConfiguration) -> Result<(), HotspotError> {
        let mut state = self.lock();
        state.apply_calls += 1;

        if let Some(err) = state.scripted_apply_failures.pop_front() {
            return Err(err);
        }

        state.installed.insert(config.ssid.clone());

        // A matching known network associates after the latency window; a
        // wrong passphrase or unknown network installs fine but never lands,
        // which is how the real device behaves.
        let credentials_match = match state.networks.get(&config.ssid) {
            Some(expected) => expected.as_deref() == config.passphrase.as_deref(),
            None => false,
        };
        if credentials_match && state.current.as_deref() != Some(config.ssid.as_str()) {
            let ssid = config.ssid.clone();
            self.schedule_join(&mut state, &ssid);
        }
        Ok(())
    }

    async fn remove_configuration(&self, ssid: &str) -> Result<(), WifiError> {
        let mut state = self.lock();
        state.remove_calls += 1;
        state.installed.remove(ssid);

        if state.current.as_deref() == Some(ssid) {
            state.current = None;
            if let Some(rejoin) = &self.rejoin {
                let rejoin = rejoin.clone();
                self.schedule_join(&mut state, &rejoin);
            }
        } else if let Some(pending) = &state.pending {
            if pending.ssid == ssid {
                state.pending = None;
            }
        }
        Ok(())
    }

    fn current_network_id(&self) -> Result<Option<String>, WifiError> {
        // The simulated device exposes the SSID as its network identifier.
        Ok(self.lock().current.clone())
    }
}
