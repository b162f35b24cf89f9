//! # Client-Core - camera control client
//!
//! Ties the Digest authentication engine and SSDP discovery together into a
//! client that reads and writes camera settings:
//!
//! ```no_run
//! use ccapi_client_core::{settings, CameraClient, ClientConfig};
//!
//! # async fn example() -> ccapi_client_core::Result<()> {
//! let config = ClientConfig::new()
//!     .with_credentials("admin", "canon")
//!     .with_base_url("https://192.168.1.2:443/ccapi");
//! let client = CameraClient::new(&config)?;
//!
//! let iso = client.get_setting(settings::ISO).await?;
//! println!("ISO {:?}, accepts {:?}", iso.value, iso.ability);
//! client.put_setting(settings::ISO, "800").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod settings;

pub use client::config::{ClientConfig, DEFAULT_API_VERSION, SUPPORTED_API_VERSIONS};
pub use client::CameraClient;
pub use error::{ClientError, Result};
pub use settings::{SettingResponse, SettingValue};

pub use ccapi_auth_core::{AuthSession, CameraResponse, Method};
pub use ccapi_discovery_core::{CancellationToken, DeviceDescriptor};
