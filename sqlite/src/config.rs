//! Store configuration.
//!
//! Defines the serializable settings used to open a [`Database`](crate::Database):
//! where the file lives, which schema version the application expects, and
//! connection pragmas. Files ending in `.json` are read and written as JSON;
//! anything else is treated as YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! path: data/app.db
//! version: 2
//! foreign_keys: true
//! busy_timeout_ms: 5000
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqliteError};

/// Path value that selects an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Settings for opening a store.
///
/// Missing keys in a configuration file take their [`Default`] values.
///
/// # Examples
///
/// ```
/// use recordlite_sqlite::StoreConfig;
///
/// let config = StoreConfig::new("app.db").with_version(3);
/// assert_eq!(config.version, 3);
/// assert!(!config.is_in_memory());
/// assert!(StoreConfig::in_memory().is_in_memory());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file, or `:memory:`.
    pub path: PathBuf,
    /// Schema version the application expects (at least 1).
    pub version: u32,
    /// Whether to enable `PRAGMA foreign_keys`.
    pub foreign_keys: bool,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            version: 1,
            foreign_keys: true,
            busy_timeout_ms: 5000,
        }
    }
}

impl StoreConfig {
    /// Configuration for a database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Returns `true` if the path selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }

    /// Checks values that cannot be expressed in the type.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::ConfigError`] if `version` is 0 or `path` is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(SqliteError::ConfigError(
                "version must be at least 1".to_string(),
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(SqliteError::ConfigError("path cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Loads configuration from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](SqliteError::IoError) if the file cannot be read,
    /// [`YamlError`](SqliteError::YamlError) or
    /// [`JsonError`](SqliteError::JsonError) if parsing fails, and
    /// [`ConfigError`](SqliteError::ConfigError) if the values are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let config: Self = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration, as JSON for `.json` paths and YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](SqliteError::IoError) if the file cannot be
    /// written, or a serialization error.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
path: data/app.db
version: 4
foreign_keys: false
busy_timeout_ms: 250
"#;
        let config: StoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.path, PathBuf::from("data/app.db"));
        assert_eq!(config.version, 4);
        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: StoreConfig = serde_yaml::from_str("version: 2\n").unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.version, 2);
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_validate_rejects_zero_version_and_empty_path() {
        assert!(StoreConfig::default().validate().is_ok());
        assert!(matches!(
            StoreConfig::default().with_version(0).validate(),
            Err(SqliteError::ConfigError(_))
        ));
        assert!(StoreConfig::new("").validate().is_err());
    }

    #[test]
    fn test_load_save_roundtrip_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let original = StoreConfig::new("records.db").with_version(7);

        for name in ["store.yml", "store.json"] {
            let path = dir.path().join(name);
            original.save(&path).unwrap();
            let loaded = StoreConfig::load(&path).unwrap();
            assert_eq!(loaded, original);
        }

        let json = std::fs::read_to_string(dir.path().join("store.json")).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "version: 0\n").unwrap();
        assert!(matches!(
            StoreConfig::load(&path),
            Err(SqliteError::ConfigError(_))
        ));
    }
}
