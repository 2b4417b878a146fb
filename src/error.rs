//! Error types for priority-config.
//!
//! Every error carries an [`ErrorCode`] from a fixed taxonomy and names the
//! component it originated from, so log entries and callers can classify
//! failures without matching on message text.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for priority-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Component name reported by file-backed sources.
pub const FILE_SOURCE_COMPONENT: &str = "config";

/// Component name reported by the environment source.
pub const ENV_SOURCE_COMPONENT: &str = "env";

/// Component name reported by the aggregator.
pub const AGGREGATOR_COMPONENT: &str = "ConfigAggregator";

/// Standardized error codes.
///
/// Codes are grouped by numeric range:
///
/// | Range     | Category      |
/// |-----------|---------------|
/// | 1000-1099 | General       |
/// | 1800-1899 | Configuration |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Unknown or unexpected error
    Unknown,
    /// Internal error
    Internal,
    /// System configuration error
    Configuration,
    /// Startup and setup failure
    Initialization,
    /// General configuration error; used for aggregation failures
    Config,
    /// Required configuration is missing
    ConfigMissing,
    /// Configuration value is invalid
    ConfigInvalid,
    /// Configuration value has the wrong type
    ConfigType,
    /// Configuration file could not be located, read or parsed
    ConfigFile,
    /// Environment variable error
    ConfigEnvironment,
    /// Conflicting configuration sources
    ConfigOverride,
    /// Missing configuration dependency
    ConfigDependency,
}

impl ErrorCode {
    /// Every defined code, in numeric order.
    pub const ALL: [ErrorCode; 12] = [
        ErrorCode::Unknown,
        ErrorCode::Internal,
        ErrorCode::Configuration,
        ErrorCode::Initialization,
        ErrorCode::Config,
        ErrorCode::ConfigMissing,
        ErrorCode::ConfigInvalid,
        ErrorCode::ConfigType,
        ErrorCode::ConfigFile,
        ErrorCode::ConfigEnvironment,
        ErrorCode::ConfigOverride,
        ErrorCode::ConfigDependency,
    ];

    /// The numeric code as it appears in logs, e.g. `"1804"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "1000",
            Self::Internal => "1001",
            Self::Configuration => "1002",
            Self::Initialization => "1003",
            Self::Config => "1800",
            Self::ConfigMissing => "1801",
            Self::ConfigInvalid => "1802",
            Self::ConfigType => "1803",
            Self::ConfigFile => "1804",
            Self::ConfigEnvironment => "1805",
            Self::ConfigOverride => "1806",
            Self::ConfigDependency => "1807",
        }
    }

    /// Human-readable description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown or unexpected error occurred",
            Self::Internal => "Internal error - please contact support",
            Self::Configuration => "System configuration error detected",
            Self::Initialization => "Application initialization failed",
            Self::Config => "Configuration error detected",
            Self::ConfigMissing => "Required configuration parameter is missing",
            Self::ConfigInvalid => "Configuration value is invalid or out of range",
            Self::ConfigType => "Configuration parameter has wrong data type",
            Self::ConfigFile => "Configuration file could not be read or parsed",
            Self::ConfigEnvironment => "Environment configuration variable error",
            Self::ConfigOverride => "Conflicting configuration sources detected",
            Self::ConfigDependency => "Missing configuration dependency",
        }
    }

    /// Category name derived from the numeric range.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Unknown | Self::Internal | Self::Configuration | Self::Initialization => {
                "general"
            }
            _ => "config",
        }
    }

    /// Codes belonging to a category (`"general"` or `"config"`/`"configuration"`).
    pub fn by_category(category: &str) -> Vec<ErrorCode> {
        let category = match category.to_ascii_lowercase().as_str() {
            "general" => "general",
            "config" | "configuration" => "config",
            _ => return Vec::new(),
        };
        Self::ALL
            .iter()
            .copied()
            .filter(|code| code.category() == category)
            .collect()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A candidate search directory could not be made absolute.
    #[error("File config path error: {}", path.display())]
    PathResolution {
        /// The path as supplied by the caller
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// No candidate directory contained the file of a required source.
    #[error("Required config file not found: {file}")]
    RequiredFileNotFound {
        /// `<name>.<file_type>`
        file: String,
    },

    /// The located configuration file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Absolute path of the file
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// The located configuration file could not be parsed.
    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse {
        /// Absolute path of the file
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// The file type tag does not name a supported (or enabled) format.
    #[error("Unsupported config file type: {file_type}. Supported: yaml, yml, toml, json")]
    UnsupportedFormat {
        /// The tag given at construction
        file_type: String,
    },

    /// Environment variables could not be collected.
    #[error("Failed to load environment variables: {0}")]
    Environment(String),

    /// A source returned an error to the aggregator.
    #[error("Error reading config from source '{source_name}'")]
    SourceRead {
        /// Diagnostic name of the failing source
        source_name: String,
        /// Priority the source was registered with
        priority: i32,
        /// The source's own error
        #[source]
        source: Box<ConfigError>,
    },

    /// The finalized configuration could not be converted to the requested type.
    #[error("Failed to deserialize configuration: {0}")]
    Deserialization(String),
}

impl ConfigError {
    /// The taxonomy code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PathResolution { .. } | Self::Io { .. } => ErrorCode::ConfigFile,
            Self::RequiredFileNotFound { .. } => ErrorCode::ConfigMissing,
            Self::Parse { .. } | Self::UnsupportedFormat { .. } => ErrorCode::ConfigInvalid,
            Self::Environment(_) => ErrorCode::ConfigEnvironment,
            Self::SourceRead { .. } => ErrorCode::Config,
            Self::Deserialization(_) => ErrorCode::ConfigType,
        }
    }

    /// Name of the component that raised the error.
    pub fn component(&self) -> &'static str {
        match self {
            Self::PathResolution { .. }
            | Self::RequiredFileNotFound { .. }
            | Self::Io { .. }
            | Self::Parse { .. }
            | Self::UnsupportedFormat { .. } => FILE_SOURCE_COMPONENT,
            Self::Environment(_) => ENV_SOURCE_COMPONENT,
            Self::SourceRead { .. } | Self::Deserialization(_) => AGGREGATOR_COMPONENT,
        }
    }
}
