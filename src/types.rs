/// One decoded telemetry notification.
///
/// Every field is independently optional: machines choose per message which
/// fields to include, signalled by the flags word at the head of the
/// notification. `None` means "not reported in this frame" — it is **not**
/// zero, and a field absent in one frame may well appear in the next.
///
/// Field availability by profile:
///
/// | Field | Indoor bike | Rowing erg | HR monitor |
/// |---|---|---|---|
/// | `power_watts` | ✓ | ✓ | ✗ |
/// | `cadence` | crank rpm | strokes/min | ✗ |
/// | `distance_m` | ✓ | ✓ | ✗ |
/// | `energy_kcal` | ✓ | ✓ | ✗ |
/// | `elapsed_secs` | ✓ | ✓ | ✗ |
/// | `heart_rate_bpm` | ✗ | ✗ | ✓ |
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MetricFrame {
    /// Instantaneous power in watts, 1 W resolution. Signed: some trainers
    /// report small negative values when freewheeling.
    pub power_watts: Option<i16>,
    /// Crank cadence (bike) or stroke rate (erg). On-wire resolution is
    /// 0.5 per minute, so half values occur.
    pub cadence: Option<f64>,
    /// Cumulative distance in meters since the machine's counter reset.
    pub distance_m: Option<u32>,
    /// Cumulative energy in kilocalories.
    pub energy_kcal: Option<u16>,
    /// Elapsed workout time in seconds, as tracked by the machine.
    pub elapsed_secs: Option<u16>,
    /// Heart rate in beats per minute. Only produced by the heart-rate
    /// profile; machine-reported heart rate fields are discarded.
    pub heart_rate_bpm: Option<u16>,
}

/// Lifecycle state of one session, readable via
/// [`crate::session::SessionHandle::state`].
///
/// ```text
/// Connecting ──► Connected ◄──► Reconnecting ──► Disconnected
///                    │                               ▲
///                    └───────── disconnect() ────────┘
/// ```
///
/// `Disconnected` is terminal for the session; recovering means starting a
/// new session through [`crate::client::FtmsClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial connect/subscribe sequence (with retries) in progress.
    Connecting,
    /// Steady state — telemetry is flowing.
    Connected,
    /// The link dropped and outlived the debounce window; silent reconnect
    /// cycles are running. Leaves this state on the first decoded frame
    /// after a successful re-subscribe.
    Reconnecting,
    /// Terminal: the session ended, either by request or after reconnect
    /// exhaustion.
    Disconnected,
}

/// Events delivered on the receiver returned by
/// [`crate::client::FtmsClient::connect_fresh`] /
/// [`crate::client::FtmsClient::reconnect_known`].
///
/// Ordering guarantees:
/// * `Metrics` frames arrive in notification order, one per successfully
///   decoded notification. Malformed notifications are dropped silently
///   (logged at warn) and never end the session.
/// * `Reconnecting` is sent each time the session enters
///   [`ConnectionState::Reconnecting`] — possibly more than once per session
///   if the link drops repeatedly.
/// * `ConnectionLost` is sent at most once, only for unrecoverable link
///   loss. An intentional [`crate::session::SessionHandle::disconnect`]
///   never produces it. After it the channel is closed.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Link established and subscribed; the `String` is the device's
    /// advertised name. Sent once, before any metric.
    Connected(String),
    /// One decoded telemetry notification.
    Metrics(MetricFrame),
    /// The session lost the link and is attempting silent recovery. Show a
    /// "reconnecting" indicator; telemetry resumes on success.
    Reconnecting,
    /// All reconnect cycles failed; the session is over. The channel closes
    /// after this event.
    ConnectionLost,
}
