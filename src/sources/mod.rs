//! Configuration source implementations.

mod config_source;
mod env;
mod file;
mod map;

pub use config_source::{ConfigMap, ConfigSource};
pub use env::EnvSource;
pub use file::{FileSource, FileSourceBuilder};
pub use map::MapSource;
