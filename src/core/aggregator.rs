//! The aggregator that reads every source once and merges by priority.

use crate::core::AggregatorBuilder;
use crate::error::{ConfigError, Result};
use crate::logging::{Fields, Logger, default_logger};
use crate::sources::{ConfigMap, ConfigSource};
use arc_swap::ArcSwap;
use config::{Value, ValueKind};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One complete aggregation result. Published as a unit.
#[derive(Debug, Default)]
struct Snapshot {
    /// Each priority's map; a later source at the same priority replaces the earlier one.
    per_priority: BTreeMap<i32, ConfigMap>,
    /// Source names in registration order.
    source_names: Vec<String>,
    finalized: Arc<ConfigMap>,
}

/// Resolved startup configuration.
///
/// Built from zero or more [`ConfigSource`]s. Each source is read exactly
/// once, in registration order. Its map is stored under its priority, and the
/// finalized configuration is the union of all maps with **higher priorities
/// overriding lower ones** on top-level key collisions.
///
/// Keys are case-insensitive. Every source's keys, including those of
/// nested tables, are lowercased before merging, matching what the `config`
/// crate does for files and environment variables, and lookups lowercase the
/// requested key. Two keys in one source that differ only by case collapse
/// into one; which value survives is unspecified.
///
/// The aggregator is an ordinary value owned by the host's startup routine.
/// Cloning it is cheap and clones share the same snapshot.
///
/// # Examples
///
/// ```rust
/// use priority_config::prelude::*;
/// use priority_config::sources::MapSource;
///
/// # fn example() -> Result<()> {
/// let defaults = MapSource::new("defaults", 100).with_value("x", 1i64).with_value("y", 2i64);
/// let overrides = MapSource::new("overrides", 500).with_value("y", 20i64).with_value("z", 3i64);
///
/// let config = ConfigAggregator::builder()
///     .with_source(overrides)
///     .with_source(defaults)
///     .build()?;
///
/// assert_eq!(config.get_as::<i64>("y").unwrap()?, 20);
/// assert_eq!(config.len(), 3);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Clone)]
pub struct ConfigAggregator {
    snapshot: Arc<ArcSwap<Snapshot>>,
    logger: Arc<dyn Logger>,
}

impl ConfigAggregator {
    /// Create a new builder for registering sources.
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::new()
    }

    /// Read every source and compute the finalized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceRead`] wrapping the first source error.
    /// The failure is reported through [`Logger::fatal`] before returning.
    pub fn initialize(sources: &[Box<dyn ConfigSource>], logger: Arc<dyn Logger>) -> Result<Self> {
        let snapshot = aggregate(sources, logger.as_ref())?;
        Ok(Self {
            snapshot: Arc::new(ArcSwap::from_pointee(snapshot)),
            logger,
        })
    }

    /// Like [`initialize`](Self::initialize) with the `tracing` logger, but
    /// terminates the process with exit status 1 on failure.
    pub fn initialize_or_exit(sources: &[Box<dyn ConfigSource>]) -> Self {
        match Self::initialize(sources, default_logger()) {
            Ok(aggregator) => aggregator,
            Err(_) => std::process::exit(1),
        }
    }

    /// Read `sources` again and replace the whole configuration.
    ///
    /// The new snapshot is computed separately and swapped in with a single
    /// atomic store, so readers see either the old configuration or the new
    /// one. If any source fails, the previous configuration stays in place.
    /// Concurrent calls are not serialized against each other.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceRead`] wrapping the first source error.
    pub fn reinitialize(&self, sources: &[Box<dyn ConfigSource>]) -> Result<()> {
        let snapshot = aggregate(sources, self.logger.as_ref())?;
        self.snapshot.store(Arc::new(snapshot));
        Ok(())
    }

    /// The finalized configuration.
    pub fn finalized(&self) -> Arc<ConfigMap> {
        Arc::clone(&self.snapshot.load().finalized)
    }

    /// Look up a top-level key, ignoring case.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.snapshot.load().finalized.get(&key.to_lowercase()).cloned()
    }

    /// Look up a top-level key and convert it to `T`.
    ///
    /// Returns `None` when the key is absent; conversion failures are
    /// reported as [`ConfigError::Deserialization`].
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T>> {
        self.get(key).map(|value| {
            value
                .try_deserialize::<T>()
                .map_err(|e| ConfigError::Deserialization(format!("key '{}': {}", key, e)))
        })
    }

    /// Whether `key` is present in the finalized configuration, ignoring case.
    pub fn contains_key(&self, key: &str) -> bool {
        self.snapshot.load().finalized.contains_key(&key.to_lowercase())
    }

    /// Number of top-level keys in the finalized configuration.
    pub fn len(&self) -> usize {
        self.snapshot.load().finalized.len()
    }

    /// Whether the finalized configuration has no keys.
    pub fn is_empty(&self) -> bool {
        self.snapshot.load().finalized.is_empty()
    }

    /// Deserialize the whole finalized configuration into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Deserialization`] if the shape does not match `T`.
    pub fn try_deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let table = (*self.finalized()).clone();
        Value::new(None, ValueKind::Table(table))
            .try_deserialize::<T>()
            .map_err(|e| ConfigError::Deserialization(e.to_string()))
    }

    /// The map stored for `priority`, if any source used it.
    pub fn source_config(&self, priority: i32) -> Option<ConfigMap> {
        self.snapshot.load().per_priority.get(&priority).cloned()
    }

    /// Distinct priorities in ascending (merge) order.
    pub fn priorities(&self) -> Vec<i32> {
        self.snapshot.load().per_priority.keys().copied().collect()
    }

    /// Names of the aggregated sources in registration order.
    pub fn source_names(&self) -> Vec<String> {
        self.snapshot.load().source_names.clone()
    }
}

/// Read every source, then merge in ascending priority order.
fn aggregate(sources: &[Box<dyn ConfigSource>], logger: &dyn Logger) -> Result<Snapshot> {
    let mut per_priority = BTreeMap::new();
    let mut source_names = Vec::with_capacity(sources.len());

    for source in sources {
        let name = source.name();
        let priority = source.priority();

        let values = match source.read() {
            Ok(values) => lowercase_keys(values),
            Err(cause) => {
                let mut fields = Fields::new();
                fields.insert("source", name.clone());
                fields.insert("priority", priority.to_string());
                let err = ConfigError::SourceRead {
                    source_name: name,
                    priority,
                    source: Box::new(cause),
                };
                logger.fatal("Error reading config", &err, &fields);
                return Err(err);
            }
        };

        tracing::debug!(source = %name, priority, keys = values.len(), "read config source");
        if per_priority.insert(priority, values).is_some() {
            tracing::debug!(
                source = %name,
                priority,
                "config source replaced an earlier source with the same priority"
            );
        }
        source_names.push(name);
    }

    let finalized = merge(&per_priority);
    Ok(Snapshot {
        per_priority,
        source_names,
        finalized: Arc::new(finalized),
    })
}

/// Lowercase every key, descending into tables and arrays.
fn lowercase_keys(values: ConfigMap) -> ConfigMap {
    values
        .into_iter()
        .map(|(key, mut value)| {
            lowercase_nested_keys(&mut value);
            (key.to_lowercase(), value)
        })
        .collect()
}

fn lowercase_nested_keys(value: &mut Value) {
    match &mut value.kind {
        ValueKind::Table(table) => {
            let table_values = std::mem::take(table);
            *table = lowercase_keys(table_values);
        }
        ValueKind::Array(items) => items.iter_mut().for_each(lowercase_nested_keys),
        _ => {}
    }
}

/// Union all maps, lowest priority first, so higher priorities win.
fn merge(per_priority: &BTreeMap<i32, ConfigMap>) -> ConfigMap {
    let mut finalized = ConfigMap::new();
    for values in per_priority.values() {
        for (key, value) in values {
            finalized.insert(key.clone(), value.clone());
        }
    }
    finalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::logging::MemoryLogger;
    use crate::sources::{FileSource, MapSource};

    struct FailingSource;

    impl ConfigSource for FailingSource {
        fn read(&self) -> Result<ConfigMap> {
            Err(ConfigError::RequiredFileNotFound {
                file: "app.yaml".to_string(),
            })
        }

        fn name(&self) -> String {
            "failing".to_string()
        }
    }

    fn boxed<S: ConfigSource + 'static>(source: S) -> Box<dyn ConfigSource> {
        Box::new(source)
    }

    fn int(aggregator: &ConfigAggregator, key: &str) -> i64 {
        aggregator.get(key).unwrap().into_int().unwrap()
    }

    #[test]
    fn test_no_sources() {
        let aggregator = ConfigAggregator::initialize(&[], default_logger()).unwrap();
        assert!(aggregator.is_empty());
        assert!(aggregator.finalized().is_empty());
        assert!(aggregator.priorities().is_empty());
    }

    #[test]
    fn test_higher_priority_wins() {
        let low = MapSource::new("low", 100).with_value("x", 1i64).with_value("y", 2i64);
        let high = MapSource::new("high", 500).with_value("y", 20i64).with_value("z", 3i64);

        for sources in [
            vec![boxed(low.clone()), boxed(high.clone())],
            vec![boxed(high), boxed(low)],
        ] {
            let aggregator = ConfigAggregator::initialize(&sources, default_logger()).unwrap();
            assert_eq!(aggregator.len(), 3);
            assert_eq!(int(&aggregator, "x"), 1);
            assert_eq!(int(&aggregator, "y"), 20);
            assert_eq!(int(&aggregator, "z"), 3);
            assert_eq!(aggregator.priorities(), vec![100, 500]);
        }
    }

    #[test]
    fn test_equal_priority_replaces_slot() {
        let first = MapSource::new("first", 100).with_value("a", 1i64).with_value("b", 2i64);
        let second = MapSource::new("second", 100).with_value("b", 20i64);

        let sources = vec![boxed(first), boxed(second)];
        let aggregator = ConfigAggregator::initialize(&sources, default_logger()).unwrap();

        assert!(!aggregator.contains_key("a"));
        assert_eq!(int(&aggregator, "b"), 20);
        assert_eq!(aggregator.source_config(100).unwrap().len(), 1);
        assert_eq!(aggregator.source_names(), vec!["map:first", "map:second"]);
    }

    #[test]
    fn test_source_error_is_fatal() {
        let logger = Arc::new(MemoryLogger::new());
        let sources = vec![
            boxed(MapSource::new("defaults", 0).with_value("a", 1i64)),
            boxed(FailingSource),
        ];

        let err = ConfigAggregator::initialize(&sources, logger.clone())
            .err()
            .expect("aggregation should fail");
        assert!(matches!(err, ConfigError::SourceRead { priority: 100, .. }));

        let fatals = logger.fatals();
        assert_eq!(fatals.len(), 1);
        assert_eq!(fatals[0].message, "Error reading config");
        assert_eq!(fatals[0].fields["code"], "1800");
        assert_eq!(fatals[0].fields["component"], "ConfigAggregator");
        assert_eq!(fatals[0].fields["source"], "failing");
    }

    #[test]
    fn test_reinitialize_replaces_everything() {
        let sources = vec![boxed(MapSource::new("a", 1).with_value("old", 1i64))];
        let aggregator = ConfigAggregator::initialize(&sources, default_logger()).unwrap();
        let before = aggregator.finalized();

        let sources = vec![boxed(MapSource::new("b", 2).with_value("new", 2i64))];
        aggregator.reinitialize(&sources).unwrap();

        assert!(!aggregator.contains_key("old"));
        assert_eq!(int(&aggregator, "new"), 2);
        assert_eq!(aggregator.priorities(), vec![2]);
        // Previously handed-out snapshots are unaffected.
        assert!(before.contains_key("old"));
    }

    #[test]
    fn test_failed_reinitialize_keeps_previous() {
        let logger = Arc::new(MemoryLogger::new());
        let sources = vec![boxed(MapSource::new("a", 1).with_value("kept", 1i64))];
        let aggregator = ConfigAggregator::initialize(&sources, logger.clone()).unwrap();

        let sources = vec![
            boxed(MapSource::new("b", 2).with_value("new", 2i64)),
            boxed(FailingSource),
        ];
        assert!(aggregator.reinitialize(&sources).is_err());

        assert_eq!(int(&aggregator, "kept"), 1);
        assert!(!aggregator.contains_key("new"));
        assert_eq!(logger.fatals().len(), 1);
    }

    #[test]
    fn test_clones_share_snapshot() {
        let aggregator = ConfigAggregator::initialize(&[], default_logger()).unwrap();
        let clone = aggregator.clone();

        let sources = vec![boxed(MapSource::new("a", 1).with_value("k", 7i64))];
        aggregator.reinitialize(&sources).unwrap();
        assert_eq!(int(&clone, "k"), 7);
    }

    #[test]
    fn test_get_as_and_missing_key() {
        let sources = vec![boxed(
            MapSource::new("a", 1)
                .with_value("port", 8080i64)
                .with_value("host", "localhost"),
        )];
        let aggregator = ConfigAggregator::initialize(&sources, default_logger()).unwrap();

        assert_eq!(aggregator.get_as::<u16>("port").unwrap().unwrap(), 8080);
        assert_eq!(aggregator.get_as::<String>("host").unwrap().unwrap(), "localhost");
        assert!(aggregator.get_as::<u16>("host").unwrap().is_err());
        assert!(aggregator.get_as::<u16>("missing").is_none());
        assert!(aggregator.get("missing").is_none());
    }

    #[test]
    fn test_mixed_case_keys_follow_priority() {
        let fs = MemoryFileSystem::new("/")
            .with_file("/etc/app.yaml", "logLevel: debug\nServer:\n  Port: 9090\n");
        let file = FileSource::builder("app", "yaml")
            .search_path("/etc")
            .priority(100)
            .file_system(Arc::new(fs))
            .build()
            .unwrap();
        let mut nested = ConfigMap::new();
        nested.insert("Port".to_string(), Value::from(8080i64));
        nested.insert("Host".to_string(), Value::from("localhost"));
        let defaults = MapSource::new("defaults", 0)
            .with_value("logLevel", "info")
            .with_value("Server", Value::new(None, ValueKind::Table(nested)))
            .with_value("Workers", 4i64);

        let sources = vec![boxed(defaults), boxed(file)];
        let aggregator = ConfigAggregator::initialize(&sources, default_logger()).unwrap();

        let mut keys: Vec<String> = aggregator.finalized().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["loglevel", "server", "workers"]);

        assert_eq!(aggregator.get_as::<String>("logLevel").unwrap().unwrap(), "debug");
        assert_eq!(aggregator.get_as::<String>("LOGLEVEL").unwrap().unwrap(), "debug");
        assert!(aggregator.contains_key("workers"));
        assert_eq!(int(&aggregator, "WORKERS"), 4);

        // The file's table replaces the defaults' table wholesale.
        let server = aggregator.get("server").unwrap().into_table().unwrap();
        assert_eq!(server["port"].clone().into_int().unwrap(), 9090);
        assert!(!server.contains_key("host"));

        let low = aggregator.source_config(0).unwrap();
        let low_server = low["server"].clone().into_table().unwrap();
        assert!(low_server.contains_key("host"));
    }

    #[test]
    fn test_lowercase_keys_descends_into_arrays() {
        let mut entry = ConfigMap::new();
        entry.insert("Name".to_string(), Value::from("a"));
        let mut values = ConfigMap::new();
        values.insert(
            "Items".to_string(),
            Value::new(None, ValueKind::Array(vec![Value::new(None, ValueKind::Table(entry))])),
        );

        let values = lowercase_keys(values);
        let items = values["items"].clone().into_array().unwrap();
        let entry = items[0].clone().into_table().unwrap();
        assert!(entry.contains_key("name"));
    }
}
