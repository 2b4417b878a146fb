//! Configuration source trait.

use crate::error::Result;

/// Key/value mapping produced by a source and held by the aggregator.
///
/// Values use the `config` crate's value model, so nested tables and arrays
/// from structured files are preserved.
pub type ConfigMap = config::Map<String, config::Value>;

/// Trait for configuration sources.
///
/// Implement this trait to add new kinds of sources (remote stores, databases)
/// without touching the aggregator.
pub trait ConfigSource: Send + Sync {
    /// Read the source's configuration.
    ///
    /// The aggregator calls this exactly once per initialization.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures the source cannot recover from
    /// itself. Optional sources degrade to an empty map instead.
    fn read(&self) -> Result<ConfigMap>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;

    /// Get the priority of this source (higher = takes precedence).
    ///
    /// Default priorities:
    /// - Environment variables: 300
    /// - Default file: 100
    fn priority(&self) -> i32 {
        100
    }
}
