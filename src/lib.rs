//! # priority-config
//!
//! Startup configuration resolved from prioritized sources.
//!
//! ## Overview
//!
//! `priority-config` reads a set of independently defined configuration
//! sources once at startup and merges them into a single finalized snapshot:
//! - Every source has an integer priority; **higher priorities override lower
//!   ones** on key collisions, regardless of registration order
//! - File sources search an ordered list of directories for `<name>.<type>`
//! - Sources are either required (failures abort startup) or optional
//!   (failures are logged as warnings and contribute nothing)
//! - The snapshot is published atomically using `arc-swap`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use priority_config::prelude::*;
//! use priority_config::sources::{FileSource, MapSource};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct ServerConfig {
//!     port: u16,
//! }
//!
//! # fn example() -> priority_config::error::Result<()> {
//! let config = ConfigAggregator::builder()
//!     .with_source(MapSource::new("defaults", 0).with_value("log_level", "info"))
//!     .with_source(FileSource::new(["/etc/myapp", "config"], true, "myapp", "yaml", 100)?)
//!     .with_source(FileSource::new(["config"], false, "myapp.local", "yaml", 200)?)
//!     .with_env_overrides("MYAPP", "__")
//!     .build_or_exit();
//!
//! let level: String = config.get_as("log_level").transpose()?.unwrap_or_default();
//! let server: Option<ServerConfig> = config.get_as("server").transpose()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `yaml`, `toml`, `json`: file formats accepted by
//!   [`FileSource`](sources::FileSource). All enabled by default.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod fs;
pub mod logging;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{AggregatorBuilder, ConfigAggregator};
    pub use crate::error::{ConfigError, ErrorCode, Result};
    pub use crate::sources::{ConfigMap, ConfigSource};
}
