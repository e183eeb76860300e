//! # ftms-rs
//!
//! Async Rust client for Bluetooth fitness equipment: indoor bikes and
//! rowing/ski ergometers speaking the standard Fitness Machine Service
//! (FTMS), plus heart-rate straps speaking Heart Rate Measurement.
//!
//! The library does three things, all tuned around how roughly BLE host
//! stacks (BlueZ in particular) treat fresh links:
//!
//! * **Decode** the FTMS Indoor Bike Data / Rower Data and Heart Rate
//!   Measurement notification formats into typed [`types::MetricFrame`]s.
//! * **Manage the link**: retried connect + subscribe, debounced handling
//!   of spurious disconnect signals, and bounded silent reconnection when
//!   the link genuinely drops — the caller just sees a `Reconnecting`
//!   event and then metrics again.
//! * **Hand out sessions**: connect by scanning
//!   ([`client::FtmsClient::connect_fresh`]) or resume on a known device
//!   without scanning ([`client::FtmsClient::reconnect_known`]).
//!
//! ## Quick start
//!
//! ```no_run
//! use ftms_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), FtmsError> {
//!     let client = FtmsClient::new(ClientConfig::default());
//!     let (mut rx, handle) = client.connect_fresh(MachineProfile::IndoorBike).await?;
//!
//!     while let Some(event) = rx.recv().await {
//!         match event {
//!             SessionEvent::Metrics(m) => println!("{:?} W  {:?} rpm", m.power_watts, m.cadence),
//!             SessionEvent::Reconnecting => eprintln!("link lost, reconnecting …"),
//!             SessionEvent::ConnectionLost => break,
//!             _ => {}
//!         }
//!     }
//!     handle.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`prelude`] | One-line glob import of the commonly needed types |
//! | [`client`] | The [`client::FtmsClient`] connect entry points |
//! | [`session`] | Per-session lifecycle: config, handle, state machine |
//! | [`types`] | Metric frames, session events, connection states |
//! | [`parse`] | Pure byte-to-frame decoders |
//! | [`protocol`] | GATT UUIDs and notification field layouts |
//! | [`transport`] | The capability traits the core runs on |
//! | [`ble`] | btleplug implementations of those traits |
//! | [`error`] | The public error taxonomy |

pub mod ble;
pub mod client;
pub mod error;
pub mod parse;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

// ── Prelude ───────────────────────────────────────────────────────────────────

/// Convenience re-exports for downstream crates.
///
/// A single glob import covers scanning, connecting, and consuming events:
///
/// ```no_run
/// use ftms_rs::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), FtmsError> {
/// let client = FtmsClient::new(ClientConfig::default());
/// let (mut rx, handle) = client.reconnect_known(MachineProfile::HeartRateMonitor).await?;
/// while let Some(SessionEvent::Metrics(m)) = rx.recv().await {
///     println!("{:?} bpm", m.heart_rate_bpm);
/// }
/// # handle.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    // ── Client ────────────────────────────────────────────────────────────────
    pub use crate::client::{ClientConfig, FtmsClient};

    // ── Sessions and events ───────────────────────────────────────────────────
    pub use crate::session::{SessionConfig, SessionHandle};
    pub use crate::types::{ConnectionState, MetricFrame, SessionEvent};

    // ── Profiles and errors ───────────────────────────────────────────────────
    pub use crate::error::FtmsError;
    pub use crate::parse::DecodeError;
    pub use crate::protocol::MachineProfile;
}
