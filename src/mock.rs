//! Scripted in-memory transport for state-machine tests.
//!
//! `MockLink` plays back per-call results for `connect`/`subscribe`/
//! `resolve_service` (an empty script means "always Ok"), counts every call,
//! and lets tests inject notifications and link events or collapse the
//! notification streams, all without hardware or a Bluetooth stack.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::MachineProfile;
use crate::transport::{DeviceLink, Discovery, LinkError, LinkEvent};

fn channel_stream<T: Send + 'static>(rx: mpsc::UnboundedReceiver<T>) -> BoxStream<'static, T> {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}

// ── MockLink ─────────────────────────────────────────────────────────────────

pub(crate) struct MockLink {
    name: String,
    connect_script: Mutex<VecDeque<Result<(), LinkError>>>,
    resolve_script: Mutex<VecDeque<Result<(), LinkError>>>,
    subscribe_script: Mutex<VecDeque<Result<(), LinkError>>>,
    connected: AtomicBool,
    connect_calls: AtomicU32,
    subscribe_calls: AtomicU32,
    disconnect_calls: AtomicU32,
    notification_streams: AtomicU32,
    note_subs: Mutex<Vec<mpsc::UnboundedSender<Vec<u8>>>>,
    event_subs: Mutex<Vec<mpsc::UnboundedSender<LinkEvent>>>,
}

impl MockLink {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            connect_script: Mutex::new(VecDeque::new()),
            resolve_script: Mutex::new(VecDeque::new()),
            subscribe_script: Mutex::new(VecDeque::new()),
            connected: AtomicBool::new(false),
            connect_calls: AtomicU32::new(0),
            subscribe_calls: AtomicU32::new(0),
            disconnect_calls: AtomicU32::new(0),
            notification_streams: AtomicU32::new(0),
            note_subs: Mutex::new(Vec::new()),
            event_subs: Mutex::new(Vec::new()),
        })
    }

    /// Queue results for the next `connect` calls, oldest first. A
    /// successful scripted connect marks the link up; once the script runs
    /// dry, further connects succeed.
    pub fn script_connects(&self, results: Vec<Result<(), LinkError>>) {
        self.connect_script.lock().unwrap().extend(results);
    }

    pub fn script_resolves(&self, results: Vec<Result<(), LinkError>>) {
        self.resolve_script.lock().unwrap().extend(results);
    }

    pub fn script_subscribes(&self, results: Vec<Result<(), LinkError>>) {
        self.subscribe_script.lock().unwrap().extend(results);
    }

    /// Deliver one raw notification to every open notification stream.
    pub fn push_notification(&self, bytes: Vec<u8>) {
        self.note_subs
            .lock()
            .unwrap()
            .retain(|tx| tx.send(bytes.clone()).is_ok());
    }

    /// Deliver one link event to every open link-event stream.
    pub fn emit(&self, event: LinkEvent) {
        self.event_subs
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event).is_ok());
    }

    /// Force transport-level liveness, e.g. to make a debounce expiry find
    /// the link genuinely dead.
    pub fn set_connected(&self, up: bool) {
        self.connected.store(up, Ordering::SeqCst);
    }

    /// End every open notification stream without touching liveness.
    /// Models a stack that tears the stream down while the link stays up.
    pub fn close_notification_streams(&self) {
        self.note_subs.lock().unwrap().clear();
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> u32 {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn notification_streams(&self) -> u32 {
        self.notification_streams.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceLink for MockLink {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), LinkError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .connect_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        if result.is_ok() {
            self.connected.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn resolve_service(&self, _service: Uuid) -> Result<(), LinkError> {
        self.resolve_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn list_characteristics(&self, _service: Uuid) -> Result<Vec<Uuid>, LinkError> {
        Ok(Vec::new())
    }

    async fn subscribe(&self, _service: Uuid, _characteristic: Uuid) -> Result<(), LinkError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.subscribe_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn notifications(
        &self,
        _characteristic: Uuid,
    ) -> Result<BoxStream<'static, Vec<u8>>, LinkError> {
        self.notification_streams.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.note_subs.lock().unwrap().push(tx);
        Ok(channel_stream(rx))
    }

    async fn link_events(&self) -> Result<BoxStream<'static, LinkEvent>, LinkError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_subs.lock().unwrap().push(tx);
        Ok(channel_stream(rx))
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ── MockDiscovery ────────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct MockDiscovery {
    request_script: Mutex<VecDeque<Result<Arc<dyn DeviceLink>, LinkError>>>,
    authorized: Mutex<Vec<Arc<dyn DeviceLink>>>,
}

impl MockDiscovery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_request(&self, result: Result<Arc<dyn DeviceLink>, LinkError>) {
        self.request_script.lock().unwrap().push_back(result);
    }

    pub fn set_authorized(&self, links: Vec<Arc<dyn DeviceLink>>) {
        *self.authorized.lock().unwrap() = links;
    }
}

#[async_trait]
impl Discovery for MockDiscovery {
    async fn request_device(
        &self,
        _profile: MachineProfile,
    ) -> Result<Arc<dyn DeviceLink>, LinkError> {
        self.request_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LinkError::NoDeviceSelected))
    }

    async fn authorized_devices(
        &self,
        _profile: MachineProfile,
    ) -> Result<Vec<Arc<dyn DeviceLink>>, LinkError> {
        Ok(self.authorized.lock().unwrap().clone())
    }
}
