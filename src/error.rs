use thiserror::Error;

use crate::transport::LinkError;

/// Errors surfaced by the public connect entry points.
///
/// Only the connect phase produces errors. Once a session is established,
/// failures become events: decode errors are contained per-notification,
/// and reconnect exhaustion arrives as
/// [`crate::types::SessionEvent::ConnectionLost`], never as an `Err`.
#[derive(Error, Debug)]
pub enum FtmsError {
    /// This host has no usable Bluetooth adapter. Fatal, no retry.
    #[error("no usable Bluetooth adapter on this platform")]
    UnsupportedPlatform,

    /// The platform cannot scan for devices. Fatal, no retry.
    #[error("device discovery is not supported on this platform")]
    DiscoveryUnsupported,

    /// The scan window closed without a device being picked. Callers should
    /// treat this as a silent return to idle, not an error dialog.
    #[error("no device was selected")]
    NoDeviceSelected,

    /// `reconnect_known` found no previously authorized device to try.
    /// Fall back to [`crate::client::FtmsClient::connect_fresh`].
    #[error("no previously authorized device is known")]
    NoKnownDevice,

    /// Every connect attempt within the ceiling failed; `source` is the last
    /// attempt's error (a subscribe failure that outlived its retry lands
    /// here too). The caller decides whether to try the other entry point.
    #[error("all {attempts} connect attempts failed")]
    ConnectPhaseExhausted {
        attempts: u32,
        #[source]
        source: LinkError,
    },

    /// A transport failure outside the retried connect sequence.
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl FtmsError {
    /// Map a discovery-phase [`LinkError`] onto the public taxonomy.
    pub(crate) fn from_discovery(err: LinkError) -> Self {
        match err {
            LinkError::AdapterUnavailable => FtmsError::UnsupportedPlatform,
            LinkError::DiscoveryUnsupported => FtmsError::DiscoveryUnsupported,
            LinkError::NoDeviceSelected => FtmsError::NoDeviceSelected,
            other => FtmsError::Link(other),
        }
    }
}
