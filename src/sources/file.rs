//! File-based configuration source.

use super::{ConfigMap, ConfigSource};
use crate::error::{ConfigError, Result};
use crate::fs::{FileSystem, os_filesystem};
use crate::logging::{Fields, Logger, default_logger};
use config::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File-based configuration source.
///
/// Looks for a file named `<name>.<file_type>` in an ordered list of candidate
/// directories and parses the first one found. The file type selects the
/// format: `yaml`/`yml`, `toml` or `json`.
///
/// Candidate directories are made absolute when the source is built. A
/// required source fails to build if any candidate cannot be resolved; an
/// optional source logs a warning and drops that candidate.
///
/// # Examples
///
/// ```rust,no_run
/// use priority_config::sources::FileSource;
///
/// # fn example() -> priority_config::error::Result<()> {
/// let defaults = FileSource::new(["/etc/myapp", "config"], true, "myapp", "yaml", 100)?;
///
/// let overrides = FileSource::builder("myapp.local", "toml")
///     .search_path("config")
///     .required(false)
///     .priority(200)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct FileSource {
    search_paths: Vec<PathBuf>,
    name: String,
    file_type: String,
    required: bool,
    priority: i32,
    fs: Arc<dyn FileSystem>,
    logger: Arc<dyn Logger>,
}

impl FileSource {
    /// Build a source on the OS filesystem, logging through `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PathResolution`] when `required` is set and a
    /// search path cannot be made absolute.
    pub fn new<I, P>(
        search_paths: I,
        required: bool,
        name: impl Into<String>,
        file_type: impl Into<String>,
        priority: i32,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::builder(name, file_type)
            .search_paths(search_paths)
            .required(required)
            .priority(priority)
            .build()
    }

    /// Start building a source for `<name>.<file_type>`.
    pub fn builder(name: impl Into<String>, file_type: impl Into<String>) -> FileSourceBuilder {
        FileSourceBuilder::new(name, file_type)
    }

    /// The resolved candidate directories, in search order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Whether a missing or unreadable file is an error.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The file name searched for, `<name>.<file_type>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.file_type)
    }

    fn resolve_search_paths(&mut self) -> Result<()> {
        let candidates = std::mem::take(&mut self.search_paths);
        let mut resolved = Vec::with_capacity(candidates.len());

        for path in candidates {
            match self.fs.absolute(&path) {
                Ok(absolute) => resolved.push(absolute),
                Err(source) => {
                    if self.required {
                        return Err(ConfigError::PathResolution { path, source });
                    }
                    let err = ConfigError::PathResolution {
                        path: path.clone(),
                        source,
                    };
                    self.warn(
                        "Failed to resolve absolute path for optional config file",
                        &path,
                        &err,
                    );
                }
            }
        }

        self.search_paths = resolved;
        Ok(())
    }

    fn parse(&self, path: &Path, format: config::FileFormat) -> Result<ConfigMap> {
        let bytes = self.fs.read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let text = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config::Config::builder()
            .add_source(File::from_str(&text, format))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<ConfigMap>())
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Required sources propagate `err`; optional ones warn and contribute nothing.
    fn recover(&self, message: &str, path: &Path, err: ConfigError) -> Result<ConfigMap> {
        if self.required {
            return Err(err);
        }
        self.warn(message, path, &err);
        Ok(ConfigMap::new())
    }

    fn warn(&self, message: &str, path: &Path, err: &ConfigError) {
        let mut fields = Fields::new();
        fields.insert("path", path.display().to_string());
        fields.insert("error", err.to_string());
        fields.insert("file_name", self.name.clone());
        fields.insert("file_type", self.file_type.clone());
        fields.insert("code", err.code().to_string());
        self.logger.warn(message, &fields);
    }
}

impl ConfigSource for FileSource {
    fn read(&self) -> Result<ConfigMap> {
        let file_name = self.file_name();

        let Some(format) = file_format(&self.file_type) else {
            let err = ConfigError::UnsupportedFormat {
                file_type: self.file_type.clone(),
            };
            return self.recover(
                "Unsupported file type for optional config file",
                Path::new(&file_name),
                err,
            );
        };

        for base in &self.search_paths {
            let path = base.join(&file_name);
            if self.fs.exists(&path) {
                return match self.parse(&path, format) {
                    Ok(map) => Ok(map),
                    Err(err) => self.recover("Failed to load optional config file", &path, err),
                };
            }
        }

        let err = ConfigError::RequiredFileNotFound {
            file: file_name.clone(),
        };
        self.recover("Optional config file not found", Path::new(&file_name), err)
    }

    fn name(&self) -> String {
        format!("file:{}", self.file_name())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Map a file type tag to a parser, if that format is enabled.
fn file_format(file_type: &str) -> Option<config::FileFormat> {
    match file_type.to_ascii_lowercase().as_str() {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Some(config::FileFormat::Yaml),
        #[cfg(feature = "toml")]
        "toml" => Some(config::FileFormat::Toml),
        #[cfg(feature = "json")]
        "json" => Some(config::FileFormat::Json),
        _ => None,
    }
}

/// Builder for [`FileSource`].
///
/// Defaults: no search paths, required, priority 100, OS filesystem,
/// `tracing` logger.
pub struct FileSourceBuilder {
    search_paths: Vec<PathBuf>,
    name: String,
    file_type: String,
    required: bool,
    priority: i32,
    fs: Option<Arc<dyn FileSystem>>,
    logger: Option<Arc<dyn Logger>>,
}

impl FileSourceBuilder {
    fn new(name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            search_paths: Vec::new(),
            name: name.into(),
            file_type: file_type.into(),
            required: true,
            priority: 100,
            fs: None,
            logger: None,
        }
    }

    /// Append a candidate directory.
    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Append several candidate directories, searched in the given order.
    pub fn search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set whether the source is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the priority for this source.
    ///
    /// Higher priority sources override lower priority ones.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Use a different filesystem.
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Use a different logger.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Resolve the search paths and build the source.
    ///
    /// No files are opened; only path normalization happens here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PathResolution`] for a required source with an
    /// unresolvable search path.
    pub fn build(self) -> Result<FileSource> {
        let mut source = FileSource {
            search_paths: self.search_paths,
            name: self.name,
            file_type: self.file_type,
            required: self.required,
            priority: self.priority,
            fs: self.fs.unwrap_or_else(os_filesystem),
            logger: self.logger.unwrap_or_else(default_logger),
        };
        source.resolve_search_paths()?;
        Ok(source)
    }
}
