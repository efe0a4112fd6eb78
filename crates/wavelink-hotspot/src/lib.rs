//! # wavelink-hotspot
//!
//! Wi-Fi join orchestration and SSID resolution for mobile device control.
//! Built for the one job of "temporarily join a known SSID, do work, rejoin
//! the previous network", with best-effort read APIs layered on top.
//!
//! ## Features
//!
//! - **SSID resolution**: layered readout over the unreliable native paths
//!   (cached, synchronous best-effort, and confirmed asynchronous accessors)
//! - **Join orchestration**: apply a join configuration with join-once →
//!   persistent → reset-and-retry fallback, polling for confirmation inside
//!   a caller-supplied time budget
//! - **Disconnect**: remove the joined configuration and confirm the device
//!   left the network
//! - **Backend seam**: the native calls live behind [`HotspotBackend`]; a
//!   deterministic [`sim::SimBackend`] ships for host development and tests
//!
//! `connect`/`disconnect` settle to a `bool` and never panic or propagate
//! native failures; queries a platform variant cannot answer return
//! [`WifiError::Unsupported`] instead of a misleading value.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use wavelink_hotspot::{sim::SimBackend, HotspotManager};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let device = SimBackend::new()
//!         .with_network("Cafe", Some("espresso"))
//!         .with_current("Home");
//!     let manager = HotspotManager::new(device);
//!
//!     if manager.connect("Cafe", Some("espresso"), Duration::from_secs(20)).await {
//!         // do work on the Cafe network
//!         manager.disconnect(Duration::from_secs(10)).await;
//!     }
//! }
//! ```

mod applier;
pub mod backend;
mod diag;
pub mod error;
pub mod manager;
pub mod resolver;
pub mod sim;
pub mod ssid;
pub mod wait;

pub use backend::{HotspotBackend, HotspotError, JoinConfiguration};
pub use diag::Diagnostics;
pub use error::{Result, WifiError};
pub use manager::{ConnectivityStatus, HotspotManager, ManagerConfig};
pub use resolver::{ReadoutLayer, SsidResolver, CONFIRMED_CHAIN};
pub use ssid::normalize;
pub use wait::wait_until;
