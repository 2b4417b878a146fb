//! In-memory configuration source.

use super::{ConfigMap, ConfigSource};
use crate::error::Result;

/// Configuration source over a fixed map.
///
/// Typically holds packaged defaults at a low priority, or programmatic
/// overrides at a high one.
///
/// # Examples
///
/// ```rust
/// use priority_config::sources::{ConfigSource, MapSource};
///
/// let defaults = MapSource::new("defaults", 0)
///     .with_value("port", 8080i64)
///     .with_value("host", "localhost");
/// assert_eq!(defaults.read().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MapSource {
    name: String,
    priority: i32,
    values: ConfigMap,
}

impl MapSource {
    /// Create an empty source.
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self::from_map(name, priority, ConfigMap::new())
    }

    /// Create a source over an existing map.
    pub fn from_map(name: impl Into<String>, priority: i32, values: ConfigMap) -> Self {
        Self {
            name: name.into(),
            priority,
            values,
        }
    }

    /// Add or replace a value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<config::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapSource {
    fn read(&self) -> Result<ConfigMap> {
        Ok(self.values.clone())
    }

    fn name(&self) -> String {
        format!("map:{}", self.name)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
