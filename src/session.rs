//! The per-session connection state machine.
//!
//! One session = one logical connection to one physical device for one
//! profile. [`establish`] runs the retried connect/subscribe phase and, on
//! success, spawns a single task that owns the session for its whole life:
//! decoding notifications, debouncing disconnect signals, running bounded
//! silent-reconnect cycles, and reporting terminal failure. The
//! [`crate::types::ConnectionState`] value held by that task is the only
//! source of truth for the lifecycle; there are no shared flags.
//!
//! # Why the connect phase is so paranoid
//!
//! BLE host stacks (BlueZ above all) love to kill a fresh link within the
//! first couple of seconds, sometimes right after reporting it up. So each
//! attempt connects, waits a settle window, re-checks liveness (connecting
//! once more if the link died meanwhile), resolves only the one target
//! service, and retries a failed subscribe once. The whole sequence repeats
//! up to the attempt ceiling before the caller sees an error.
//!
//! Unsolicited disconnect signals get the same treatment on the other end:
//! they are debounced, because several stacks emit a spurious one right
//! after subscription while the link is demonstrably still alive.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Sleep};

use crate::error::FtmsError;
use crate::parse;
use crate::protocol::MachineProfile;
use crate::transport::{DeviceLink, LinkError, LinkEvent};
use crate::types::{ConnectionState, SessionEvent};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tunables for one session. The defaults are what the kiosk hardware was
/// calibrated against; override per-field with struct update syntax.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Full connect-sequence attempts before the entry point fails.
    pub connect_attempts: u32,
    /// Pause between failed connect attempts.
    pub connect_backoff: Duration,
    /// Settle window after a first-time (picker) connect, before the link's
    /// liveness is re-checked and services are resolved.
    pub fresh_settle: Duration,
    /// Settle window for reconnects — both silent recovery cycles and the
    /// no-picker entry point.
    pub reconnect_settle: Duration,
    /// Delay before the single subscribe retry.
    pub subscribe_retry_delay: Duration,
    /// Silent reconnect cycles before the session gives up for good.
    pub reconnect_cycles: u32,
    /// Pause between failed reconnect cycles.
    pub reconnect_backoff: Duration,
    /// Debounce window for unsolicited disconnect signals. `None` uses the
    /// profile default ([`MachineProfile::disconnect_debounce`]).
    pub disconnect_debounce: Option<Duration>,
    /// Capacity of the session event channel.
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 3,
            connect_backoff: Duration::from_secs(1),
            fresh_settle: Duration::from_secs(2),
            reconnect_settle: Duration::from_secs(1),
            subscribe_retry_delay: Duration::from_secs(1),
            reconnect_cycles: 3,
            reconnect_backoff: Duration::from_secs(1),
            disconnect_debounce: None,
            event_buffer: 256,
        }
    }
}

// ── Handle ───────────────────────────────────────────────────────────────────

/// Caller-owned handle to a running session.
///
/// The session keeps only the device identity for reconnection; the handle
/// is the sole owner of the session's lifetime. Dropping it without calling
/// [`SessionHandle::disconnect`] also ends the session (the task notices the
/// closed shutdown channel), but `disconnect()` is the orderly way: it
/// returns only after the task has torn everything down, so no event of any
/// kind is delivered afterwards.
#[derive(Debug)]
pub struct SessionHandle {
    device_name: String,
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Advertised name of the connected device.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// End the session on purpose: cancel pending timers, stop all
    /// listeners, and close the transport. Never produces
    /// [`SessionEvent::ConnectionLost`] — an intentional disconnect is not
    /// an error.
    pub async fn disconnect(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

// ── Establishment ─────────────────────────────────────────────────────────────

/// Run the retried connect phase against `link` and, on success, start the
/// session task. `settle` distinguishes the picker path (longer) from the
/// no-picker path.
///
/// On failure nothing is returned and the link is left for the caller to
/// drop; on success the returned receiver carries
/// [`SessionEvent::Connected`] first.
pub(crate) async fn establish(
    link: Arc<dyn DeviceLink>,
    profile: MachineProfile,
    config: &SessionConfig,
    settle: Duration,
) -> Result<(mpsc::Receiver<SessionEvent>, SessionHandle), FtmsError> {
    let attempts = config.connect_attempts.max(1);
    let mut outcome: Result<(), LinkError> = Ok(());

    for attempt in 1..=attempts {
        outcome = connect_sequence(link.as_ref(), profile, config, settle).await;
        match &outcome {
            Ok(()) => break,
            Err(e) => {
                warn!(
                    "{}: connect attempt {attempt}/{attempts} failed: {e}",
                    link.name()
                );
                if attempt < attempts {
                    time::sleep(config.connect_backoff).await;
                }
            }
        }
    }
    if let Err(source) = outcome {
        return Err(FtmsError::ConnectPhaseExhausted { attempts, source });
    }

    let notifications = link.notifications(profile.data_characteristic()).await?;
    let link_events = link.link_events().await?;

    let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
    let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let name = link.name();
    info!("{name}: connected and subscribed ({})", profile.label());
    let _ = event_tx.send(SessionEvent::Connected(name.clone())).await;

    let task = SessionTask {
        link,
        profile,
        config: config.clone(),
        event_tx,
        state_tx,
        shutdown_rx,
        notifications,
        link_events,
    };

    Ok((
        event_rx,
        SessionHandle {
            device_name: name,
            shutdown: shutdown_tx,
            state: state_rx,
            task: tokio::spawn(task.run()),
        },
    ))
}

/// One full connect attempt: connect, settle, liveness re-check, resolve the
/// target service, subscribe (with one retry). Shared between the initial
/// connect phase and silent reconnect cycles.
async fn connect_sequence(
    link: &dyn DeviceLink,
    profile: MachineProfile,
    config: &SessionConfig,
    settle: Duration,
) -> Result<(), LinkError> {
    link.connect().await?;

    // Let the link stabilise; if the stack killed it during the wait, one
    // immediate re-connect usually sticks.
    time::sleep(settle).await;
    if !link.is_connected().await {
        debug!("{}: link died during the settle window, connecting again", link.name());
        link.connect().await?;
    }

    // Resolve only the service we need. A blanket service enumeration is a
    // known link-killer on some machine firmware, so it is never the primary
    // path — the characteristic listing below is informational only.
    link.resolve_service(profile.service_uuid()).await?;

    match link.list_characteristics(profile.service_uuid()).await {
        Ok(chars) => debug!(
            "{}: service exposes {} characteristic(s)",
            link.name(),
            chars.len()
        ),
        Err(e) => debug!("{}: characteristic listing failed (ignored): {e}", link.name()),
    }

    let service = profile.service_uuid();
    let characteristic = profile.data_characteristic();
    if let Err(e) = link.subscribe(service, characteristic).await {
        warn!(
            "{}: subscribe failed, retrying once in {:?}: {e}",
            link.name(),
            config.subscribe_retry_delay
        );
        time::sleep(config.subscribe_retry_delay).await;
        link.subscribe(service, characteristic).await?;
    }

    Ok(())
}

// ── The session task ──────────────────────────────────────────────────────────

enum EndReason {
    /// `disconnect()` was called or the handle was dropped.
    Shutdown,
    /// The event receiver was dropped; nobody is listening.
    CallerGone,
    /// Reconnect cycles exhausted — the one path that emits `ConnectionLost`.
    Exhausted,
}

struct SessionTask {
    link: Arc<dyn DeviceLink>,
    profile: MachineProfile,
    config: SessionConfig,
    event_tx: mpsc::Sender<SessionEvent>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_rx: watch::Receiver<bool>,
    notifications: BoxStream<'static, Vec<u8>>,
    link_events: BoxStream<'static, LinkEvent>,
}

impl SessionTask {
    async fn run(self) {
        let SessionTask {
            link,
            profile,
            config,
            event_tx,
            state_tx,
            mut shutdown_rx,
            notifications,
            link_events,
        } = self;

        let debounce_window = config
            .disconnect_debounce
            .unwrap_or_else(|| profile.disconnect_debounce());

        // `None` for a stream means it ended; the select arm then parks on a
        // pending future instead of spinning on a closed stream.
        let mut notifications = Some(notifications);
        let mut link_events = Some(link_events);
        // Single-shot, cancel-by-replace: arming overwrites any pending
        // timer, recovery drops it.
        let mut debounce: Option<Pin<Box<Sleep>>> = None;

        let _ = state_tx.send(ConnectionState::Connected);

        let reason = loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break EndReason::Shutdown,

                maybe = next_or_pending(notifications.as_mut()) => match maybe {
                    Some(bytes) => match parse::decode(profile, &bytes) {
                        Ok(frame) => {
                            if *state_tx.borrow() == ConnectionState::Reconnecting {
                                // Valid telemetry is the proof of recovery.
                                info!("{}: telemetry resumed", link.name());
                                let _ = state_tx.send(ConnectionState::Connected);
                            }
                            if event_tx.send(SessionEvent::Metrics(frame)).await.is_err() {
                                break EndReason::CallerGone;
                            }
                        }
                        Err(e) => {
                            warn!("{}: dropping malformed notification: {e}", link.name());
                        }
                    },
                    None => {
                        // BlueZ closes the stream on link loss, frequently
                        // before any disconnect event shows up. Same
                        // debounce as an explicit signal.
                        debug!("{}: notification stream ended", link.name());
                        notifications = None;
                        debounce = Some(Box::pin(time::sleep(debounce_window)));
                    }
                },

                maybe = next_or_pending(link_events.as_mut()) => match maybe {
                    Some(LinkEvent::Disconnected) => {
                        debug!(
                            "{}: disconnect signal, debouncing for {:?}",
                            link.name(),
                            debounce_window
                        );
                        debounce = Some(Box::pin(time::sleep(debounce_window)));
                    }
                    Some(LinkEvent::Connected) => {
                        if debounce.take().is_some() {
                            debug!("{}: link recovered within the debounce window", link.name());
                        }
                    }
                    None => {
                        debug!("{}: link event stream ended", link.name());
                        link_events = None;
                    }
                },

                () = fire_or_pending(debounce.as_mut()) => {
                    debounce = None;

                    let mut link_down = !link.is_connected().await;
                    if !link_down && notifications.is_none() {
                        // The stream died but the link reports alive — take
                        // a fresh stream and carry on.
                        match link.notifications(profile.data_characteristic()).await {
                            Ok(s) => notifications = Some(s),
                            Err(e) => {
                                warn!("{}: could not re-acquire notifications: {e}", link.name());
                                link_down = true;
                            }
                        }
                    }
                    if !link_down {
                        debug!("{}: disconnect signal was spurious, still connected", link.name());
                        if link_events.is_none() {
                            link_events = link.link_events().await.ok();
                        }
                        continue;
                    }

                    // The drop outlived the debounce; recover silently. The
                    // event fires on *entering* Reconnecting, so a link that
                    // dies again before any telemetry does not repeat it.
                    let entering = *state_tx.borrow() != ConnectionState::Reconnecting;
                    let _ = state_tx.send(ConnectionState::Reconnecting);
                    if entering
                        && event_tx.send(SessionEvent::Reconnecting).await.is_err()
                    {
                        break EndReason::CallerGone;
                    }

                    let cycles = tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => None,
                        r = run_reconnect_cycles(link.as_ref(), profile, &config) => Some(r),
                    };
                    match cycles {
                        None => break EndReason::Shutdown,
                        Some(Ok(())) => {
                            match link.notifications(profile.data_characteristic()).await {
                                Ok(s) => {
                                    notifications = Some(s);
                                    link_events = link.link_events().await.ok();
                                    // State stays Reconnecting until the
                                    // first decoded frame lands.
                                    info!("{}: link re-established, waiting for telemetry", link.name());
                                }
                                Err(e) => {
                                    warn!("{}: no notification stream after reconnect: {e}", link.name());
                                    break EndReason::Exhausted;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            warn!("{}: silent reconnect exhausted: {e}", link.name());
                            break EndReason::Exhausted;
                        }
                    }
                }
            }
        };

        let _ = state_tx.send(ConnectionState::Disconnected);
        if matches!(reason, EndReason::Exhausted) {
            let _ = event_tx.send(SessionEvent::ConnectionLost).await;
        }
        if let Err(e) = link.disconnect().await {
            debug!("{}: disconnect on teardown: {e}", link.name());
        }
        // Dropping event_tx here closes the channel; nothing can be
        // delivered after this point.
    }
}

/// Bounded silent-reconnect loop. Success means the connect sequence (incl.
/// re-subscribe) completed; the caller re-acquires streams and waits for
/// telemetry before calling the link recovered.
async fn run_reconnect_cycles(
    link: &dyn DeviceLink,
    profile: MachineProfile,
    config: &SessionConfig,
) -> Result<(), LinkError> {
    let cycles = config.reconnect_cycles.max(1);
    let mut outcome: Result<(), LinkError> = Ok(());

    for cycle in 1..=cycles {
        outcome = connect_sequence(link, profile, config, config.reconnect_settle).await;
        match &outcome {
            Ok(()) => {
                info!("{}: reconnect cycle {cycle} succeeded", link.name());
                return Ok(());
            }
            Err(e) => {
                warn!("{}: reconnect cycle {cycle}/{cycles} failed: {e}", link.name());
                if cycle < cycles {
                    time::sleep(config.reconnect_backoff).await;
                }
            }
        }
    }
    outcome
}

// ── Select helpers ────────────────────────────────────────────────────────────

/// Next stream item, or park forever when the stream has already ended.
async fn next_or_pending<T>(stream: Option<&mut BoxStream<'static, T>>) -> Option<T> {
    match stream {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}

/// Await an armed debounce timer, or park forever when none is armed.
async fn fire_or_pending(timer: Option<&mut Pin<Box<Sleep>>>) {
    match timer {
        Some(t) => t.as_mut().await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLink;
    use tokio::task::yield_now;
    use tokio::time::advance;

    /// flags: more-data set (no speed), cadence (90 rpm), power (300 W)
    fn bike_frame() -> Vec<u8> {
        vec![0x45, 0x00, 0xB4, 0x00, 0x2C, 0x01]
    }

    /// Let the session task drain everything that is ready without moving
    /// the (paused) clock.
    async fn settle() {
        for _ in 0..20 {
            yield_now().await;
        }
    }

    async fn establish_bike(
        link: &Arc<MockLink>,
        config: &SessionConfig,
    ) -> (mpsc::Receiver<SessionEvent>, SessionHandle) {
        let (mut rx, handle) = establish(
            link.clone() as Arc<dyn DeviceLink>,
            MachineProfile::IndoorBike,
            config,
            config.fresh_settle,
        )
        .await
        .expect("establish");
        assert!(matches!(rx.recv().await, Some(SessionEvent::Connected(_))));
        settle().await;
        (rx, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn establishes_after_transient_connect_failures() {
        let link = MockLink::new("KICKR 1234");
        link.script_connects(vec![
            Err(LinkError::ConnectFailed("host stack busy".into())),
            Err(LinkError::ConnectFailed("host stack busy".into())),
            Ok(()),
        ]);

        let (_rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        assert_eq!(link.connect_calls(), 3);
        assert_eq!(handle.state(), ConnectionState::Connected);
        handle.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn connect_exhaustion_surfaces_the_last_error() {
        let link = MockLink::new("bike");
        link.script_connects(vec![
            Err(LinkError::ConnectFailed("a".into())),
            Err(LinkError::ConnectFailed("b".into())),
            Err(LinkError::ConnectTimeout(Duration::from_secs(10))),
        ]);

        let err = establish(
            link.clone() as Arc<dyn DeviceLink>,
            MachineProfile::IndoorBike,
            &SessionConfig::default(),
            Duration::from_secs(2),
        )
        .await
        .expect_err("must exhaust");

        assert_eq!(link.connect_calls(), 3);
        assert!(matches!(
            err,
            FtmsError::ConnectPhaseExhausted {
                attempts: 3,
                source: LinkError::ConnectTimeout(_),
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_service_lookup_retries_the_whole_sequence() {
        let link = MockLink::new("bike");
        link.script_resolves(vec![
            Err(LinkError::ServiceNotFound(
                MachineProfile::IndoorBike.service_uuid(),
            )),
            Ok(()),
        ]);

        let (_rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        // The retry is of the full sequence, not just the lookup.
        assert_eq!(link.connect_calls(), 2);
        handle.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscribe_is_retried_once() {
        let link = MockLink::new("bike");
        link.script_subscribes(vec![
            Err(LinkError::SubscribeFailed("GATT busy".into())),
            Ok(()),
        ]);

        let (_rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        assert_eq!(link.connect_calls(), 1);
        assert_eq!(link.subscribe_calls(), 2);
        handle.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscribe_failure_escalates_to_connect_exhaustion() {
        let link = MockLink::new("bike");
        link.script_subscribes(vec![
            Err(LinkError::SubscribeFailed("nope".into())),
            Err(LinkError::SubscribeFailed("still nope".into())),
        ]);
        let config = SessionConfig {
            connect_attempts: 1,
            ..SessionConfig::default()
        };

        let err = establish(
            link.clone() as Arc<dyn DeviceLink>,
            MachineProfile::IndoorBike,
            &config,
            config.fresh_settle,
        )
        .await
        .expect_err("must fail");

        assert_eq!(link.subscribe_calls(), 2);
        assert!(matches!(
            err,
            FtmsError::ConnectPhaseExhausted {
                source: LinkError::SubscribeFailed(_),
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_flow_and_malformed_frames_are_dropped() {
        let link = MockLink::new("bike");
        let (mut rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        link.push_notification(vec![0x05]); // truncated: cadence claimed, missing
        link.push_notification(bike_frame());

        match rx.recv().await {
            Some(SessionEvent::Metrics(frame)) => {
                assert_eq!(frame.power_watts, Some(300));
                assert_eq!(frame.cadence, Some(90.0));
            }
            other => panic!("expected metrics, got {other:?}"),
        }

        // Session survived the bad frame.
        link.push_notification(bike_frame());
        assert!(matches!(rx.recv().await, Some(SessionEvent::Metrics(_))));
        handle.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_swallows_spurious_disconnects() {
        let link = MockLink::new("bike");
        let (mut rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        // Two rapid signals must not stack timers, and recovery before the
        // window expires must cancel cleanly.
        link.emit(LinkEvent::Disconnected);
        link.emit(LinkEvent::Disconnected);
        settle().await;
        link.emit(LinkEvent::Connected);
        settle().await;

        advance(Duration::from_secs(10)).await;
        settle().await;

        link.push_notification(bike_frame());
        assert!(matches!(rx.recv().await, Some(SessionEvent::Metrics(_))));
        assert!(rx.try_recv().is_err(), "no Reconnecting may have been sent");
        assert_eq!(handle.state(), ConnectionState::Connected);
        assert_eq!(link.connect_calls(), 1, "no reconnect may have run");
        handle.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_exhaustion_is_terminal() {
        let link = MockLink::new("erg");
        link.script_connects(vec![
            Ok(()),
            Err(LinkError::ConnectFailed("gone".into())),
            Err(LinkError::ConnectFailed("gone".into())),
            Err(LinkError::ConnectFailed("gone".into())),
        ]);
        let (mut rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        link.set_connected(false);
        link.emit(LinkEvent::Disconnected);

        assert!(matches!(rx.recv().await, Some(SessionEvent::Reconnecting)));
        assert!(matches!(rx.recv().await, Some(SessionEvent::ConnectionLost)));
        assert!(rx.recv().await.is_none(), "channel must close after ConnectionLost");

        assert_eq!(link.connect_calls(), 4, "initial + 3 cycles, nothing more");
        assert_eq!(handle.state(), ConnectionState::Disconnected);
        assert!(link.disconnect_calls() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn telemetry_flips_reconnecting_back_to_connected() {
        let link = MockLink::new("bike");
        link.script_connects(vec![
            Ok(()),
            Err(LinkError::ConnectFailed("first cycle fails".into())),
            Ok(()),
        ]);
        let (mut rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        link.set_connected(false);
        link.emit(LinkEvent::Disconnected);
        assert!(matches!(rx.recv().await, Some(SessionEvent::Reconnecting)));

        // Give the reconnect cycles room to run to completion.
        for _ in 0..60 {
            if link.notification_streams() >= 2 {
                break;
            }
            advance(Duration::from_millis(500)).await;
            settle().await;
        }
        assert_eq!(link.connect_calls(), 3);
        assert_eq!(handle.state(), ConnectionState::Reconnecting);

        // Recovery is only acknowledged once telemetry actually flows.
        link.push_notification(bike_frame());
        assert!(matches!(rx.recv().await, Some(SessionEvent::Metrics(_))));
        settle().await;
        assert_eq!(handle.state(), ConnectionState::Connected);
        assert!(rx.try_recv().is_err(), "exactly one Reconnecting");
        handle.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn intentional_disconnect_is_silent() {
        let link = MockLink::new("bike");
        let (mut rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        handle.disconnect().await;
        assert_eq!(link.disconnect_calls(), 1);

        // The device is detached: nothing that happens to it afterwards may
        // produce an event, and ConnectionLost in particular must not fire.
        link.emit(LinkEvent::Disconnected);
        link.push_notification(bike_frame());
        settle().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dead_stream_on_live_link_reacquires_quietly() {
        let link = MockLink::new("bike");
        let (mut rx, handle) = establish_bike(&link, &SessionConfig::default()).await;

        // Stream collapses but the transport stays up (seen on BlueZ after
        // an adapter hiccup): the session must re-acquire, not reconnect.
        link.close_notification_streams();
        settle().await;
        advance(Duration::from_secs(6)).await;
        settle().await;

        assert_eq!(link.notification_streams(), 2);
        assert_eq!(link.connect_calls(), 1);

        link.push_notification(bike_frame());
        assert!(matches!(rx.recv().await, Some(SessionEvent::Metrics(_))));
        assert!(rx.try_recv().is_err(), "no Reconnecting for a live link");
        handle.disconnect().await;
    }
}
