//! Transport capability traits consumed by the session core.
//!
//! The state machine in [`crate::session`] never touches btleplug directly;
//! it drives a [`DeviceLink`] and the facade obtains links through a
//! [`Discovery`]. The production implementations live in [`crate::ble`];
//! tests drive the same machinery with a scripted in-memory link.
//!
//! A link is exclusively owned by its session once handed over — nothing
//! else may issue transport calls against the same device while a session
//! is running on it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::MachineProfile;

// ── Errors ───────────────────────────────────────────────────────────────────

/// Transport-level failure.
///
/// Cloneable (platform errors are carried as strings) so the last attempt's
/// error can be both logged and embedded in
/// [`crate::error::FtmsError::ConnectPhaseExhausted`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// No usable Bluetooth adapter on this host.
    #[error("no Bluetooth adapter available")]
    AdapterUnavailable,

    /// The platform cannot scan for devices at all.
    #[error("device discovery is not supported on this platform")]
    DiscoveryUnsupported,

    /// The scan window closed without a matching device being picked.
    #[error("no device was selected")]
    NoDeviceSelected,

    /// Starting or running a scan failed.
    #[error("scan failed: {0}")]
    ScanFailed(String),

    /// The transport-level connect call failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// The transport-level connect call hung past its deadline.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The device does not expose the requested service.
    #[error("service {0} not found on device")]
    ServiceNotFound(Uuid),

    /// The service does not expose the requested characteristic.
    #[error("characteristic {0} not found on device")]
    CharacteristicNotFound(Uuid),

    /// Enabling notifications failed.
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),

    /// The notification or link-event stream could not be obtained.
    #[error("stream unavailable: {0}")]
    StreamUnavailable(String),
}

// ── Link events ───────────────────────────────────────────────────────────────

/// Unsolicited link-level signals for one device, delivered by
/// [`DeviceLink::link_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The platform reports the device as connected again. Cancels a pending
    /// disconnect debounce.
    Connected,
    /// The platform reports link loss. Debounced by the session before any
    /// reconnect is attempted — several stacks emit spurious ones.
    Disconnected,
}

// ── Traits ───────────────────────────────────────────────────────────────────

/// One physical device, connectable and subscribable.
///
/// All methods suspend at the platform call; none of them retries — retry
/// policy belongs to the session state machine.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Advertised display name (or an identifier when the device has none).
    fn name(&self) -> String;

    /// Establish (or re-establish) the transport-level connection.
    async fn connect(&self) -> Result<(), LinkError>;

    /// Current transport-level liveness. Must be cheap; polled around
    /// stabilization waits and at debounce expiry.
    async fn is_connected(&self) -> bool;

    /// Resolve the one target service, failing with
    /// [`LinkError::ServiceNotFound`] if the device lacks it.
    async fn resolve_service(&self, service: Uuid) -> Result<(), LinkError>;

    /// Enumerate the characteristics of `service`. Best-effort: callers only
    /// log the result, failures are non-fatal.
    async fn list_characteristics(&self, service: Uuid) -> Result<Vec<Uuid>, LinkError>;

    /// Enable notifications on one characteristic of `service`.
    async fn subscribe(&self, service: Uuid, characteristic: Uuid) -> Result<(), LinkError>;

    /// Raw notification payloads for one characteristic, in arrival order.
    /// The stream ends when the platform tears the link down.
    async fn notifications(
        &self,
        characteristic: Uuid,
    ) -> Result<BoxStream<'static, Vec<u8>>, LinkError>;

    /// Unsolicited connect/disconnect signals for this device.
    async fn link_events(&self) -> Result<BoxStream<'static, LinkEvent>, LinkError>;

    /// Tear the transport connection down. Idempotent.
    async fn disconnect(&self) -> Result<(), LinkError>;
}

/// How sessions obtain device links.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Scan for a device matching `profile` and return it.
    ///
    /// Implementations first filter the scan on the profile's service UUID
    /// and fall back to an unfiltered scan when the filter sees nothing —
    /// some machines only carry the service UUID in a secondary advertising
    /// channel the filtered path misses. Fails [`LinkError::NoDeviceSelected`]
    /// when the scan window closes empty.
    async fn request_device(&self, profile: MachineProfile)
        -> Result<Arc<dyn DeviceLink>, LinkError>;

    /// Previously seen/bonded devices matching `profile`, without scanning.
    ///
    /// May legitimately return an empty list. Fails
    /// [`LinkError::AdapterUnavailable`] where the platform cannot recall
    /// devices at all.
    async fn authorized_devices(
        &self,
        profile: MachineProfile,
    ) -> Result<Vec<Arc<dyn DeviceLink>>, LinkError>;
}
