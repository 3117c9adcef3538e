//! Configuration module for the duplicate finder
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\pixel_dedup\config.toml
//! - Linux: ~/.config/pixel_dedup/config.toml
//! - macOS: ~/Library/Application Support/pixel_dedup/config.toml

use crate::duplicate::{DuplicateIndex, DuplicatePolicy, ScanOptions};
use crate::fingerprint::Algorithm;
use crate::loader::SUPPORTED_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for config directory
const APP_NAME: &str = "pixel_dedup";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file looked up in the working directory before the standard location
const LOCAL_CONFIG_FILE: &str = "./pixel_dedup.toml";

/// Get the standard configuration directory for the application.
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Ensure the configuration directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = get_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::WriteError(config_dir.clone(), e.to_string()))?;
    }

    Ok(config_dir)
}

/// Initialize the configuration file if it doesn't exist.
///
/// Returns the path to the config file.
pub fn init_config() -> Result<PathBuf, ConfigError> {
    let config_dir = ensure_config_dir()?;
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        fs::write(&config_path, Config::generate_default_config())
            .map_err(|e| ConfigError::WriteError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Index settings
    pub index: IndexConfig,

    /// Folder scanning settings
    pub scan: ScanConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Fingerprint algorithm bound to the index
    pub algorithm: Algorithm,

    /// What to do when a second file maps to an occupied fingerprint
    pub duplicate_policy: DuplicatePolicy,

    /// Where the index snapshot lives
    pub snapshot_file: PathBuf,

    /// Save the snapshot after commands that change the index
    pub autosave: bool,
}

/// Scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into subdirectories
    pub recursive: bool,

    /// Follow symbolic links
    pub follow_symlinks: bool,

    /// File extensions to include
    pub extensions: Vec<String>,

    /// Skip files that cannot be loaded instead of aborting
    pub skip_unreadable: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Also write logs to a file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Patch,
            duplicate_policy: DuplicatePolicy::Append,
            snapshot_file: PathBuf::from("./output/hash_table.json"),
            autosave: true,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            skip_unreadable: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./pixel_dedup.log"),
        }
    }
}

impl ScanConfig {
    /// Convert to the scanner's option format
    pub fn to_scan_options(&self) -> ScanOptions {
        ScanOptions {
            recursive: self.recursive,
            follow_symlinks: self.follow_symlinks,
            extensions: self.extensions.clone(),
            skip_unreadable: self.skip_unreadable,
        }
    }
}

impl IndexConfig {
    /// Create an empty index with the configured algorithm and policy
    pub fn new_index(&self) -> DuplicateIndex {
        DuplicateIndex::new(self.algorithm, self.duplicate_policy)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        Self::parse(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./pixel_dedup.toml (current directory)
    /// 2. Standard config location
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Get the path where the config file is (or would be) located.
    pub fn get_active_config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return local;
        }

        get_config_path().unwrap_or(local)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::WriteError(path.as_ref().to_path_buf(), e.to_string()))?;

        Ok(())
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to serialize configuration to TOML
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
    /// Could not determine config directory
    ConfigDirNotFound,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), err)
            }
            ConfigError::ParseError(path, err) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), err)
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), err)
            }
            ConfigError::ConfigDirNotFound => {
                write!(f, "Could not determine configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.index.algorithm, Algorithm::Patch);
        assert_eq!(config.index.duplicate_policy, DuplicatePolicy::Append);
        assert_eq!(
            config.index.snapshot_file,
            PathBuf::from("./output/hash_table.json")
        );
        assert!(config.index.autosave);
        assert!(config.scan.recursive);
        assert!(config.scan.skip_unreadable);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.log_to_file);
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config = Config::parse(&Config::generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(config.index.algorithm, defaults.index.algorithm);
        assert_eq!(config.index.duplicate_policy, defaults.index.duplicate_policy);
        assert_eq!(config.index.snapshot_file, defaults.index.snapshot_file);
        assert_eq!(config.scan.extensions, defaults.scan.extensions);
        assert_eq!(config.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::parse(
            r#"
            [index]
            algorithm = "mean"
            duplicate_policy = "reject"

            [scan]
            recursive = false
            "#,
        )
        .unwrap();

        assert_eq!(config.index.algorithm, Algorithm::Mean);
        assert_eq!(config.index.duplicate_policy, DuplicatePolicy::Reject);
        assert!(config.index.autosave);
        assert!(!config.scan.recursive);
        assert_eq!(config.scan.extensions.len(), 4);
    }

    #[test]
    fn test_unknown_algorithm_is_parse_error() {
        assert!(Config::parse("[index]\nalgorithm = \"sha1\"\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.index.duplicate_policy = DuplicatePolicy::Replace;
        config.scan.extensions = vec!["txt".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.index.duplicate_policy, DuplicatePolicy::Replace);
        assert_eq!(loaded.scan.extensions, vec!["txt"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/pixel_dedup.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_conversions() {
        let config = Config::default();
        let options = config.scan.to_scan_options();
        assert_eq!(options.extensions, config.scan.extensions);

        let index = config.index.new_index();
        assert_eq!(*index.algorithm(), Algorithm::Patch);
        assert_eq!(index.policy(), DuplicatePolicy::Append);
    }
}
