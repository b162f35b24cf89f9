//! Shared infrastructure for the CCAPI client crates.
//!
//! - [`logging`]: tracing-subscriber setup
//! - [`config`]: layered TOML + environment configuration loading
//! - [`errors`]: the error type both of them return

pub mod config;
pub mod errors;
pub mod logging;

pub use self::config::{load_config, write_config, ENV_PREFIX};
pub use errors::{Error, Result};
pub use logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
