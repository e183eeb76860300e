//! The public connect facade.
//!
//! [`FtmsClient`] owns the discovery mechanism and the session defaults and
//! exposes the two ways a workout can start:
//!
//! * [`FtmsClient::connect_fresh`] — scan for a device (filtered on the
//!   profile's service, unfiltered fallback) and run the full retried
//!   connect phase against the pick.
//! * [`FtmsClient::reconnect_known`] — no scan: walk the host's previously
//!   authorized devices with a single, shorter-settle attempt each and take
//!   the first that completes connect + subscribe. Meant for "resume the
//!   workout after a page reload / app restart" flows; fall back to
//!   `connect_fresh` when it fails.
//!
//! The facade is built for one active machine session and, independently,
//! at most one active heart-rate session. The two run concurrently and know
//! nothing about each other — a strap session keeps streaming while the
//! machine session drops and reconnects.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;

use crate::ble::BtleDiscovery;
use crate::error::FtmsError;
use crate::protocol::MachineProfile;
use crate::session::{establish, SessionConfig, SessionHandle};
use crate::transport::Discovery;
use crate::types::SessionEvent;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Client-level configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long a scan may run before `connect_fresh` gives up with
    /// [`FtmsError::NoDeviceSelected`]. Split between the filtered pass and
    /// the unfiltered fallback. Default: 15 s.
    pub scan_timeout: Duration,
    /// Session tunables applied to every session this client starts.
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(15),
            session: SessionConfig::default(),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Entry point for connecting to fitness machines and heart-rate monitors.
pub struct FtmsClient {
    config: ClientConfig,
    discovery: Arc<dyn Discovery>,
}

impl FtmsClient {
    /// A client backed by the platform Bluetooth stack.
    pub fn new(config: ClientConfig) -> Self {
        let discovery = Arc::new(BtleDiscovery::new(config.scan_timeout));
        Self { config, discovery }
    }

    /// A client with a custom discovery mechanism. Used by the tests; also
    /// the hook for embedding on platforms with their own pairing UI.
    pub fn with_discovery(config: ClientConfig, discovery: Arc<dyn Discovery>) -> Self {
        Self { config, discovery }
    }

    /// Scan for a `profile` device and start a session on the pick.
    ///
    /// Fails [`FtmsError::NoDeviceSelected`] when the scan window closes
    /// empty; treat that as a silent return to idle, the user simply did
    /// not bring a device into range. [`FtmsError::ConnectPhaseExhausted`]
    /// means a device was found but would not come up.
    pub async fn connect_fresh(
        &self,
        profile: MachineProfile,
    ) -> Result<(mpsc::Receiver<SessionEvent>, SessionHandle), FtmsError> {
        info!("scanning for a {}", profile.label());
        let link = self
            .discovery
            .request_device(profile)
            .await
            .map_err(FtmsError::from_discovery)?;
        establish(link, profile, &self.config.session, self.config.session.fresh_settle).await
    }

    /// Try to resume on a previously authorized device, without scanning.
    ///
    /// Each candidate gets exactly one connect attempt with the shorter
    /// reconnect settle; the first one that completes the full connect +
    /// subscribe sequence wins. One pass only; a candidate that fails is
    /// not revisited. Fails [`FtmsError::NoKnownDevice`] immediately when
    /// the host knows no matching device.
    pub async fn reconnect_known(
        &self,
        profile: MachineProfile,
    ) -> Result<(mpsc::Receiver<SessionEvent>, SessionHandle), FtmsError> {
        let candidates = self
            .discovery
            .authorized_devices(profile)
            .await
            .map_err(FtmsError::from_discovery)?;
        if candidates.is_empty() {
            return Err(FtmsError::NoKnownDevice);
        }
        info!(
            "trying {} previously authorized {} device(s)",
            candidates.len(),
            profile.label()
        );

        let single_attempt = SessionConfig {
            connect_attempts: 1,
            ..self.config.session.clone()
        };
        let mut last = FtmsError::NoKnownDevice;
        for link in candidates {
            let name = link.name();
            match establish(link, profile, &single_attempt, single_attempt.reconnect_settle).await
            {
                Ok(session) => return Ok(session),
                Err(e) => {
                    warn!("{name}: quick reconnect failed: {e}");
                    last = e;
                }
            }
        }
        Err(last)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
