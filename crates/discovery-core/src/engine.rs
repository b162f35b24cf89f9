//! SSDP discovery loop.
//!
//! Each attempt sends one `M-SEARCH` probe and listens for a fixed window.
//! Every response carrying a `LOCATION` header spawns a description fetch
//! onto a [`JoinSet`]; fetched devices land in a set keyed by UDN where the
//! first answer wins. A location is fetched once per run unless its fetch
//! fails, in which case the next answer naming it is fetched again. Progress
//! is reported on an event channel handed out by [`DiscoveryEngine::new`].

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::{Host, Url};

use crate::config::DiscoveryConfig;
use crate::description::{parse_device_description, DeviceDescriptor};
use crate::error::{DiscoveryError, Result};
use crate::ssdp::{build_msearch, SsdpResponse};

// Large enough for any SSDP response seen in practice
const RECV_BUFFER_SIZE: usize = 2048;

/// Progress notifications emitted during a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    ProbeSent { attempt: u32 },
    DeviceFound(DeviceDescriptor),
    ResolveFailed { location: String, error: String },
    Finished(DiscoveryStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Found(usize),
    NoDevicesFound,
    Cancelled,
}

impl fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryStatus::Found(1) => write!(f, "Found 1 camera"),
            DiscoveryStatus::Found(n) => write!(f, "Found {} cameras", n),
            DiscoveryStatus::NoDevicesFound => write!(
                f,
                "No cameras found. Make sure the camera is on the same network and the control API is enabled"
            ),
            DiscoveryStatus::Cancelled => write!(f, "Discovery cancelled"),
        }
    }
}

/// Outcome of one [`DiscoveryEngine::discover`] run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub status: DiscoveryStatus,
    /// Devices in the order they were resolved
    pub devices: Vec<DeviceDescriptor>,
    pub probes_sent: u32,
}

/// Fetches and records device descriptions. Cloned into each fetch task.
#[derive(Clone)]
struct Resolver {
    http: reqwest::Client,
    devices: Arc<Mutex<IndexMap<String, DeviceDescriptor>>>,
    /// Locations with a fetch in flight or already resolved this run
    claimed: Arc<Mutex<HashSet<String>>>,
    events_tx: mpsc::Sender<DiscoveryEvent>,
}

impl Resolver {
    fn emit(&self, event: DiscoveryEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            trace!("Discovery event not delivered: {}", e);
        }
    }

    /// Marks a location as being fetched. False if it already is, or was
    /// resolved earlier in the run.
    fn claim(&self, location: &str) -> bool {
        self.claimed.lock().insert(location.to_string())
    }

    /// Returns the device if it was not already known.
    async fn resolve(
        &self,
        location: &str,
        source: SocketAddr,
    ) -> Result<Option<DeviceDescriptor>> {
        let url = Url::parse(location).map_err(|e| DiscoveryError::InvalidLocation {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

        let source_ip = match url.host() {
            Some(Host::Ipv6(ip)) => ip.to_string(),
            Some(host) => host.to_string(),
            None => source.ip().to_string(),
        };

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::NetworkFailure(format!(
                "description request returned HTTP {}",
                status.as_u16()
            )));
        }
        let body = response.bytes().await?;
        let xml = std::str::from_utf8(&body).map_err(|e| {
            DiscoveryError::InvalidDeviceDescription(format!("body is not UTF-8: {}", e))
        })?;

        let device = parse_device_description(xml)?.into_descriptor(source_ip);

        let inserted = match self.devices.lock().entry(device.udn.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(device.clone());
                true
            }
        };

        if !inserted {
            debug!(udn = %device.udn, "Ignoring duplicate device");
            return Ok(None);
        }

        info!(
            udn = %device.udn,
            name = device.display_name(),
            control_url = %device.control_base_url,
            "Discovered camera"
        );
        self.emit(DiscoveryEvent::DeviceFound(device.clone()));
        Ok(Some(device))
    }

    async fn resolve_logged(self, location: String, source: SocketAddr) {
        if let Err(e) = self.resolve(&location, source).await {
            warn!(%location, %source, "Failed to resolve device description: {}", e);
            // A later answer for this location gets another try
            self.claimed.lock().remove(&location);
            self.emit(DiscoveryEvent::ResolveFailed {
                location,
                error: e.to_string(),
            });
        }
    }
}

/// Finds cameras on the local network.
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    resolver: Resolver,
}

impl DiscoveryEngine {
    /// Creates an engine and the receiving end of its event channel.
    pub fn new(config: DiscoveryConfig) -> Result<(Self, mpsc::Receiver<DiscoveryEvent>)> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| DiscoveryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let (events_tx, events_rx) = mpsc::channel(config.event_channel_capacity);

        let engine = DiscoveryEngine {
            config,
            resolver: Resolver {
                http,
                devices: Arc::new(Mutex::new(IndexMap::new())),
                claimed: Arc::new(Mutex::new(HashSet::new())),
                events_tx,
            },
        };
        Ok((engine, events_rx))
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Devices found by the current or most recent run.
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.resolver.devices.lock().values().cloned().collect()
    }

    /// Resolves a single SSDP response inline.
    ///
    /// Returns `Ok(None)` when the device's UDN is already in the set.
    pub async fn resolve_response(
        &self,
        datagram: &str,
        source: SocketAddr,
    ) -> Result<Option<DeviceDescriptor>> {
        let response = SsdpResponse::parse(datagram).ok_or_else(|| DiscoveryError::InvalidLocation {
            location: String::new(),
            reason: "response has no LOCATION header".to_string(),
        })?;
        self.resolver.resolve(response.location, source).await
    }

    /// Runs a full discovery: probes, listens, and waits for pending
    /// description fetches.
    ///
    /// Cancelling `cancel` closes the socket, stops further probes and
    /// abandons in-flight fetches. Finding nothing is reported through
    /// [`DiscoveryStatus::NoDevicesFound`], not as an error.
    pub async fn discover(&mut self, cancel: CancellationToken) -> Result<DiscoveryReport> {
        self.resolver.devices.lock().clear();
        self.resolver.claimed.lock().clear();

        let socket = UdpSocket::bind(self.config.bind_addr).await?;
        if let Some(ttl) = self.config.multicast_ttl {
            socket.set_multicast_ttl_v4(ttl)?;
        }
        debug!(local = ?socket.local_addr().ok(), target = %self.config.target, "Starting discovery");

        let probe = build_msearch(
            &self.config.target.to_string(),
            &self.config.service_type,
            self.config.mx,
        );
        let mut fetches = JoinSet::new();
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let mut probes_sent = 0;
        let mut cancelled = false;

        'attempts: for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break 'attempts;
                    }
                    _ = sleep(self.config.attempt_interval()) => {}
                }
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            match socket.send_to(probe.as_bytes(), self.config.target).await {
                Ok(_) => {
                    probes_sent += 1;
                    debug!(attempt, "Sent M-SEARCH probe");
                    self.resolver.emit(DiscoveryEvent::ProbeSent { attempt });
                }
                Err(e) => warn!(attempt, "Failed to send M-SEARCH probe: {}", e),
            }

            let deadline = Instant::now() + self.config.receive_timeout();
            loop {
                let received = tokio::select! {
                    _ = cancel.cancelled() => None,
                    res = timeout_at(deadline, socket.recv_from(&mut buf)) => Some(res),
                };

                match received {
                    None => {
                        cancelled = true;
                        break 'attempts;
                    }
                    Some(Err(_elapsed)) => {
                        trace!(attempt, "Receive window closed");
                        break;
                    }
                    Some(Ok(Ok((len, source)))) => {
                        self.handle_datagram(&mut fetches, &buf[..len], source);
                    }
                    Some(Ok(Err(e))) => {
                        warn!(attempt, "SSDP receive failed: {}", e);
                        break;
                    }
                }
            }
        }

        drop(socket);

        if cancelled {
            debug!(pending = fetches.len(), "Discovery cancelled");
            fetches.shutdown().await;
        } else {
            while let Some(joined) = fetches.join_next().await {
                if let Err(e) = joined {
                    warn!("Description fetch task failed: {}", e);
                }
            }
        }

        if probes_sent == 0 && !cancelled {
            return Err(DiscoveryError::NetworkFailure(format!(
                "no probe could be sent to {}",
                self.config.target
            )));
        }

        let devices = self.devices();
        let status = if cancelled {
            DiscoveryStatus::Cancelled
        } else if devices.is_empty() {
            DiscoveryStatus::NoDevicesFound
        } else {
            DiscoveryStatus::Found(devices.len())
        };

        info!(probes_sent, devices = devices.len(), "{}", status);
        self.resolver.emit(DiscoveryEvent::Finished(status));

        Ok(DiscoveryReport {
            status,
            devices,
            probes_sent,
        })
    }

    fn handle_datagram(
        &self,
        fetches: &mut JoinSet<()>,
        datagram: &[u8],
        source: SocketAddr,
    ) {
        let text = String::from_utf8_lossy(datagram);
        let Some(response) = SsdpResponse::parse(&text) else {
            trace!(%source, "Ignoring SSDP datagram without LOCATION");
            return;
        };

        // Cameras answer every probe; refetch only after a failed attempt
        if !self.resolver.claim(response.location) {
            trace!(location = response.location, "Location already fetched or in flight");
            return;
        }

        debug!(
            %source,
            location = response.location,
            usn = response.usn.unwrap_or_default(),
            "SSDP response"
        );

        let location = response.location.to_string();
        let resolver = self.resolver.clone();
        fetches.spawn(resolver.resolve_logged(location, source));
    }
}
