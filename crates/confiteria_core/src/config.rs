//! Registry configuration.
//!
//! # Responsibility
//! - Describe deployment inputs: data directory, storage backing, category
//!   catalog, on-sale tokens and logging.
//! - Load them from an optional JSON file where every field has a default.
//!
//! # Invariants
//! - Vocabularies are validated when they are turned into domain types, not
//!   when the file is parsed.

use crate::model::catalog::{CatalogError, CategoryCatalog, OnSaleTokens};
use crate::repo::csv_repo::PRODUCTS_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_DATA_DIR: &str = "datos_sinteticos";
const SQLITE_FILE_NAME: &str = "products.sqlite3";

/// Which storage backing persists products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Local delimited-text file.
    #[default]
    Csv,
    /// SQLite table store.
    Sqlite,
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Error raised while loading or interpreting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Catalog(CatalogError),
    UnknownBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::Catalog(err) => write!(f, "{err}"),
            Self::UnknownBackend(value) => {
                write!(f, "unknown storage backend `{value}`; expected csv|sqlite")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Catalog(err) => Some(err),
            Self::UnknownBackend(_) => None,
        }
    }
}

impl From<CatalogError> for ConfigError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

/// Deployment configuration for one registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Directory holding the store files.
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    /// Category catalog labels, in display order.
    pub categories: Vec<String>,
    /// Affirmative on-sale label.
    pub on_sale_yes: String,
    /// Negative on-sale label.
    pub on_sale_no: String,
    /// `trace|debug|info|warn|error`; build default when absent.
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; file logging is off when absent.
    pub log_dir: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let tokens = OnSaleTokens::default();
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage: StorageBackend::default(),
            categories: CategoryCatalog::default().labels().to_vec(),
            on_sale_yes: tokens.yes().to_string(),
            on_sale_no: tokens.no().to_string(),
            log_level: None,
            log_dir: None,
        }
    }
}

impl RegistryConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the validated category catalog.
    pub fn catalog(&self) -> Result<CategoryCatalog, ConfigError> {
        Ok(CategoryCatalog::new(self.categories.iter().cloned())?)
    }

    /// Builds the validated on-sale tokens.
    pub fn on_sale_tokens(&self) -> Result<OnSaleTokens, ConfigError> {
        Ok(OnSaleTokens::new(
            self.on_sale_yes.as_str(),
            self.on_sale_no.as_str(),
        )?)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join(PRODUCTS_FILE_NAME)
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(SQLITE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RegistryConfig, StorageBackend};
    use crate::model::catalog::CatalogError;
    use std::path::PathBuf;

    #[test]
    fn empty_object_yields_defaults() {
        let config: RegistryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.storage, StorageBackend::Csv);
        assert_eq!(config.csv_path(), PathBuf::from("datos_sinteticos/products.csv"));
        assert_eq!(config.catalog().unwrap().labels().len(), 6);
    }

    #[test]
    fn catalog_spelling_comes_from_config() {
        let config: RegistryConfig = serde_json::from_value(serde_json::json!({
            "storage": "sqlite",
            "categories": ["Chocolates", "Salamos"],
            "on_sale_yes": "Sí"
        }))
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Sqlite);
        let catalog = config.catalog().unwrap();
        assert!(catalog.contains("Salamos"));
        assert!(!catalog.contains("Salados"));
        assert_eq!(config.on_sale_tokens().unwrap().parse("Sí"), Some(true));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<RegistryConfig>(r#"{"catalogue": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_vocabularies_surface_as_catalog_errors() {
        let config = RegistryConfig {
            categories: Vec::new(),
            ..RegistryConfig::default()
        };
        assert!(matches!(
            config.catalog(),
            Err(ConfigError::Catalog(CatalogError::EmptyCatalog))
        ));
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("SQLite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!(matches!(
            "redis".parse::<StorageBackend>(),
            Err(ConfigError::UnknownBackend(value)) if value == "redis"
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegistryConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
