//! Environment variable configuration source.

use super::{ConfigMap, ConfigSource};
use crate::error::{ConfigError, Result};
use config::Environment;

/// Environment variable configuration source.
///
/// Loads configuration from environment variables with a specified prefix
/// and separator for nested keys. Keys are lowercased, and numeric or boolean
/// values are parsed.
///
/// # Examples
///
/// ```rust
/// use priority_config::sources::EnvSource;
///
/// // APP_SERVER__PORT=8080 -> server.port = 8080
/// let source = EnvSource::new("APP", "__");
/// ```
pub struct EnvSource {
    prefix: String,
    separator: String,
    priority: i32,
    vars: Option<config::Map<String, String>>,
}

impl EnvSource {
    /// Create a new environment variable source.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__" for APP_DB__HOST)
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            priority: 300, // Env vars have highest priority by default
            vars: None,
        }
    }

    /// Set the priority for this source.
    ///
    /// Higher priority sources override lower priority ones.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Read from a fixed set of variables instead of the process environment.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

impl EnvSource {
    /// Whether `key` is `PREFIX_` followed by a non-empty key that does not
    /// start with `_` or the separator.
    ///
    /// The prefix matches case-insensitively. Rejected variables would
    /// otherwise produce an empty top-level key.
    fn is_config_key(&self, key: &str) -> bool {
        let head_len = self.prefix.len() + 1;
        let (Some(head), Some(rest)) = (key.get(..head_len), key.get(head_len..)) else {
            return false;
        };
        match head.strip_suffix('_') {
            Some(prefix) if prefix.eq_ignore_ascii_case(&self.prefix) => {}
            _ => return false,
        }
        !rest.is_empty()
            && !rest.starts_with('_')
            && (self.separator.is_empty() || !rest.starts_with(self.separator.as_str()))
    }
}

impl ConfigSource for EnvSource {
    fn read(&self) -> Result<ConfigMap> {
        let vars = match &self.vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        };
        let vars = vars
            .into_iter()
            .filter(|(key, _)| self.is_config_key(key))
            .collect();

        let env_source = Environment::with_prefix(&self.prefix)
            .prefix_separator("_")
            .separator(&self.separator)
            .try_parsing(true)
            .source(Some(vars));

        config::Config::builder()
            .add_source(env_source)
            .build()
            .and_then(|cfg| cfg.try_deserialize::<ConfigMap>())
            .map_err(|e| ConfigError::Environment(e.to_string()))
    }

    fn name(&self) -> String {
        format!("env:{}*", self.prefix)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
