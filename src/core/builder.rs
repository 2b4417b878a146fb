//! Builder for constructing ConfigAggregator instances.

use crate::core::ConfigAggregator;
use crate::error::Result;
use crate::logging::{Logger, default_logger};
use crate::sources::{ConfigSource, EnvSource};
use std::sync::Arc;

/// Builder for constructing a [`ConfigAggregator`].
///
/// Sources are read in the order they are registered. Registration order
/// never decides which value wins a conflict; priority does, except between
/// sources that share a priority, where the later one replaces the earlier.
///
/// # Examples
///
/// ```rust,no_run
/// use priority_config::prelude::*;
/// use priority_config::sources::FileSource;
///
/// # fn example() -> Result<()> {
/// let config = ConfigAggregator::builder()
///     .with_source(FileSource::new(["/etc/myapp"], true, "myapp", "yaml", 100)?)
///     .with_source(FileSource::new(["config"], false, "myapp.local", "yaml", 200)?)
///     .with_env_overrides("MYAPP", "__")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct AggregatorBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    logger: Option<Arc<dyn Logger>>,
}

impl AggregatorBuilder {
    /// Create a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            logger: None,
        }
    }

    /// Add a configuration source.
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Add an already boxed configuration source.
    pub fn with_boxed_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Add environment variable source with custom prefix.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__" for APP_DB__HOST)
    ///
    /// Environment variables have the highest priority by default (300).
    pub fn with_env_overrides(self, prefix: &str, separator: &str) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Report diagnostics through `logger` instead of `tracing`.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Read all sources and build the aggregator.
    ///
    /// # Errors
    ///
    /// Returns an error if any source fails to read; see
    /// [`ConfigAggregator::initialize`].
    pub fn build(self) -> Result<ConfigAggregator> {
        let logger = self.logger.unwrap_or_else(default_logger);
        ConfigAggregator::initialize(&self.sources, logger)
    }

    /// Build the aggregator, exiting the process with status 1 on failure.
    ///
    /// The failure is logged through the configured logger first.
    pub fn build_or_exit(self) -> ConfigAggregator {
        match self.build() {
            Ok(aggregator) => aggregator,
            Err(_) => std::process::exit(1),
        }
    }
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
