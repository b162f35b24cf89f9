//! # Discovery-Core - finding CCAPI cameras on the local network
//!
//! Discovery is a two step process: an SSDP `M-SEARCH` multicast probe
//! collects `LOCATION` URLs, and each URL is fetched and parsed as a UPnP
//! device description to obtain the camera's control API base URL.
//!
//! ```no_run
//! use ccapi_discovery_core::{CancellationToken, DiscoveryConfig, DiscoveryEngine};
//!
//! # async fn example() -> ccapi_discovery_core::Result<()> {
//! let (mut engine, _events) = DiscoveryEngine::new(DiscoveryConfig::default())?;
//! let report = engine.discover(CancellationToken::new()).await?;
//! for device in &report.devices {
//!     println!("{} at {}", device.display_name(), device.control_base_url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod description;
pub mod engine;
pub mod error;
pub mod ssdp;

pub use config::DiscoveryConfig;
pub use description::{parse_device_description, DeviceDescription, DeviceDescriptor};
pub use engine::{DiscoveryEngine, DiscoveryEvent, DiscoveryReport, DiscoveryStatus};
pub use error::{DiscoveryError, Result};
pub use ssdp::{build_msearch, extract_header, SsdpResponse, CCAPI_SERVICE_TYPE, SSDP_MULTICAST_ADDR};

pub use tokio_util::sync::CancellationToken;
