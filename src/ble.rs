//! btleplug-backed implementations of the transport traits.
//!
//! All the platform lore lives here so the session core stays clean:
//! BlueZ's hanging `Connect`, its lazily populated GATT cache, CoreBluetooth
//! needing a beat to reach `PoweredOn`, and machines that only advertise
//! their service UUID in the scan response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info};
use uuid::Uuid;

use crate::protocol::MachineProfile;
use crate::transport::{DeviceLink, Discovery, LinkError, LinkEvent};

/// BlueZ's `org.bluez.Device1.Connect` can block forever when the device is
/// out of range or the stack is wedged; ten seconds is generous for a link
/// that normally comes up in under two.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const DISCOVER_TIMEOUT: Duration = Duration::from_secs(15);

/// Poll interval while waiting for a scan to surface a matching device.
const SCAN_POLL: Duration = Duration::from_millis(250);

// ── BtleLink ─────────────────────────────────────────────────────────────────

/// One physical device as seen through btleplug.
pub struct BtleLink {
    peripheral: Peripheral,
    /// Kept so link events can be read from the adapter that discovered the
    /// device without creating a second `Manager`.
    adapter: Adapter,
    name: String,
}

#[async_trait]
impl DeviceLink for BtleLink {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), LinkError> {
        match tokio::time::timeout(CONNECT_TIMEOUT, self.peripheral.connect()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LinkError::ConnectFailed(e.to_string())),
            Err(_) => Err(LinkError::ConnectTimeout(CONNECT_TIMEOUT)),
        }
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn resolve_service(&self, service: Uuid) -> Result<(), LinkError> {
        // BlueZ signals connection completion before the remote GATT cache
        // is populated; discovering too early returns an empty set and every
        // later characteristic lookup fails.
        #[cfg(target_os = "linux")]
        tokio::time::sleep(Duration::from_millis(600)).await;

        tokio::time::timeout(DISCOVER_TIMEOUT, self.peripheral.discover_services())
            .await
            .map_err(|_| LinkError::ConnectTimeout(DISCOVER_TIMEOUT))?
            .map_err(|e| LinkError::ConnectFailed(e.to_string()))?;

        if self.peripheral.services().iter().any(|s| s.uuid == service) {
            Ok(())
        } else {
            Err(LinkError::ServiceNotFound(service))
        }
    }

    async fn list_characteristics(&self, service: Uuid) -> Result<Vec<Uuid>, LinkError> {
        Ok(self
            .peripheral
            .services()
            .into_iter()
            .filter(|s| s.uuid == service)
            .flat_map(|s| s.characteristics.into_iter().map(|c| c.uuid))
            .collect())
    }

    async fn subscribe(&self, service: Uuid, characteristic: Uuid) -> Result<(), LinkError> {
        let chars = self.peripheral.characteristics();
        let target = chars
            .iter()
            .find(|c| c.uuid == characteristic && c.service_uuid == service)
            .ok_or(LinkError::CharacteristicNotFound(characteristic))?;
        self.peripheral
            .subscribe(target)
            .await
            .map_err(|e| LinkError::SubscribeFailed(e.to_string()))
    }

    async fn notifications(
        &self,
        characteristic: Uuid,
    ) -> Result<BoxStream<'static, Vec<u8>>, LinkError> {
        let stream = self
            .peripheral
            .notifications()
            .await
            .map_err(|e| LinkError::StreamUnavailable(e.to_string()))?;
        Ok(stream
            .filter_map(move |n| async move { (n.uuid == characteristic).then_some(n.value) })
            .boxed())
    }

    async fn link_events(&self) -> Result<BoxStream<'static, LinkEvent>, LinkError> {
        let events = self
            .adapter
            .events()
            .await
            .map_err(|e| LinkError::StreamUnavailable(e.to_string()))?;
        let id = self.peripheral.id();
        Ok(events
            .filter_map(move |event| {
                let id = id.clone();
                async move {
                    match event {
                        CentralEvent::DeviceConnected(dev) if dev == id => {
                            Some(LinkEvent::Connected)
                        }
                        CentralEvent::DeviceDisconnected(dev) if dev == id => {
                            Some(LinkEvent::Disconnected)
                        }
                        _ => None,
                    }
                }
            })
            .boxed())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.peripheral
            .disconnect()
            .await
            .map_err(|e| LinkError::ConnectFailed(e.to_string()))
    }
}

// ── BtleDiscovery ────────────────────────────────────────────────────────────

/// Scans and recalls devices through the first available Bluetooth adapter.
pub struct BtleDiscovery {
    scan_timeout: Duration,
}

impl BtleDiscovery {
    pub fn new(scan_timeout: Duration) -> Self {
        Self { scan_timeout }
    }

    async fn adapter() -> Result<Adapter, LinkError> {
        let manager = Manager::new()
            .await
            .map_err(|e| LinkError::ScanFailed(e.to_string()))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|_| LinkError::AdapterUnavailable)?
            .into_iter()
            .next()
            .ok_or(LinkError::AdapterUnavailable)?;

        // CBCentralManager starts in an "unknown" state right after launch;
        // scanning before it reaches PoweredOn is a silent no-op. Wait up to
        // 3 s, then a small margin for the delegate to settle.
        #[cfg(target_os = "macos")]
        {
            use btleplug::api::CentralState;

            let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
            loop {
                match adapter.adapter_state().await {
                    Ok(CentralState::PoweredOn) => break,
                    Ok(_) if tokio::time::Instant::now() >= deadline => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        Ok(adapter)
    }

    /// Poll the adapter's peripheral set until one advertises `profile`'s
    /// service or the window expires.
    async fn poll_for_match(
        adapter: &Adapter,
        profile: MachineProfile,
        window: Duration,
    ) -> Option<(Peripheral, String)> {
        let service = profile.service_uuid();
        let scan = async {
            loop {
                for p in adapter.peripherals().await.unwrap_or_default() {
                    if let Ok(Some(props)) = p.properties().await {
                        if props.services.contains(&service) {
                            let name = props
                                .local_name
                                .unwrap_or_else(|| p.id().to_string());
                            return (p, name);
                        }
                    }
                }
                tokio::time::sleep(SCAN_POLL).await;
            }
        };
        tokio::time::timeout(window, scan).await.ok()
    }
}

#[async_trait]
impl Discovery for BtleDiscovery {
    async fn request_device(
        &self,
        profile: MachineProfile,
    ) -> Result<Arc<dyn DeviceLink>, LinkError> {
        let adapter = Self::adapter().await?;
        let window = self.scan_timeout / 2;

        // First pass: scan filtered on the profile's service UUID.
        adapter
            .start_scan(ScanFilter {
                services: vec![profile.service_uuid()],
            })
            .await
            .map_err(|e| LinkError::ScanFailed(e.to_string()))?;
        let mut found = Self::poll_for_match(&adapter, profile, window).await;
        adapter.stop_scan().await.ok();

        // Some machines only carry the service UUID in the scan response,
        // which a filtered scan can miss entirely. Second pass: unfiltered,
        // matched against the merged advertisement data.
        if found.is_none() {
            info!(
                "filtered scan found no {}, retrying unfiltered",
                profile.label()
            );
            adapter
                .start_scan(ScanFilter::default())
                .await
                .map_err(|e| LinkError::ScanFailed(e.to_string()))?;
            found = Self::poll_for_match(&adapter, profile, window).await;
            adapter.stop_scan().await.ok();
        }

        let (peripheral, name) = found.ok_or(LinkError::NoDeviceSelected)?;
        info!("selected {name} ({})", profile.label());
        Ok(Arc::new(BtleLink {
            peripheral,
            adapter,
            name,
        }))
    }

    async fn authorized_devices(
        &self,
        profile: MachineProfile,
    ) -> Result<Vec<Arc<dyn DeviceLink>>, LinkError> {
        let adapter = Self::adapter().await?;
        let service = profile.service_uuid();

        // No scan: only devices the host already knows about (bonded or
        // seen earlier in this adapter's lifetime).
        let mut links: Vec<Arc<dyn DeviceLink>> = Vec::new();
        for p in adapter
            .peripherals()
            .await
            .map_err(|_| LinkError::AdapterUnavailable)?
        {
            if let Ok(Some(props)) = p.properties().await {
                if props.services.contains(&service) {
                    let name = props.local_name.unwrap_or_else(|| p.id().to_string());
                    debug!("known {}: {name}", profile.label());
                    links.push(Arc::new(BtleLink {
                        peripheral: p,
                        adapter: adapter.clone(),
                        name,
                    }));
                }
            }
        }
        Ok(links)
    }
}
