use crate::persistence::{
    CsvAssignmentStore, DynStore, JsonAssignmentStore, MemoryAssignmentStore, PersistenceResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown storage backend '{0}' (expected csv, json, sqlite or memory)")]
    UnknownStorage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Csv,
    Json,
    Sqlite,
    Memory,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(StorageKind::Csv),
            "json" => Ok(StorageKind::Json),
            "sqlite" => Ok(StorageKind::Sqlite),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(ConfigError::UnknownStorage(s.to_string())),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Csv => "csv",
            StorageKind::Json => "json",
            StorageKind::Sqlite => "sqlite",
            StorageKind::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotaConfig {
    pub data_path: PathBuf,
    pub storage: StorageKind,
    pub http_addr: String,
    /// `tracing-subscriber` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for RotaConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("rota_assignments.csv"),
            storage: StorageKind::Csv,
            http_addr: "127.0.0.1:3000".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl RotaConfig {
    /// Reads `ROTA_DATA_PATH`, `ROTA_STORAGE`, `ROTA_HTTP_ADDR` and `ROTA_LOG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies environment-style overrides looked up through `lookup`.
    /// Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(path) = get("ROTA_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(storage) = get("ROTA_STORAGE") {
            self.storage = storage.parse()?;
        }
        if let Some(addr) = get("ROTA_HTTP_ADDR") {
            self.http_addr = addr;
        }
        if let Some(filter) = get("ROTA_LOG") {
            self.log_filter = filter;
        }
        Ok(self)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

/// Opens the store selected by `config.storage`.
pub fn open_store(config: &RotaConfig) -> PersistenceResult<DynStore> {
    let store: DynStore = match config.storage {
        StorageKind::Csv => Box::new(CsvAssignmentStore::new(&config.data_path)),
        StorageKind::Json => Box::new(JsonAssignmentStore::new(&config.data_path)),
        StorageKind::Memory => Box::new(MemoryAssignmentStore::new()),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => Box::new(crate::persistence::sqlite::SqliteAssignmentStore::new(
            &config.data_path,
        )?),
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            return Err(crate::persistence::PersistenceError::InvalidData(
                "sqlite storage requires the `sqlite` feature".into(),
            ));
        }
    };
    tracing::info!(storage = %config.storage, path = %config.data_path.display(), "opened assignment store");
    Ok(store)
}
