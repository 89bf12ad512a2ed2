use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ratings_partition_core::{PartitionConfig, RatingsError, RatingsResult};

pub const DEFAULT_CONFIG_NAME: &str = "ratings.json";
pub const DEFAULT_DB_NAME: &str = "ratings.sqlite";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub partitioning: Option<PartitionConfig>,
}

impl StoreConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            partitioning: Some(PartitionConfig::default()),
        }
    }

    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> RatingsResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| RatingsError::io(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| RatingsError::config(format!("read config: {err}")))?;
            let config: StoreConfig =
                serde_json::from_str(&raw).map_err(|err| RatingsError::config(err.to_string()))?;
            config.partitioning().validate()?;
            return Ok(config);
        }
        let default = StoreConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| RatingsError::config(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| RatingsError::config(format!("write config: {err}")))?;
        Ok(default)
    }

    pub fn partitioning(&self) -> PartitionConfig {
        self.partitioning.clone().unwrap_or_default()
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> RatingsResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            _ => Err(RatingsError::config("config is not sqlite backend")),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
        }
    }

    pub fn connection_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => None,
            DatabaseConfig::Postgres { url } => Some(url.as_str()),
        }
    }
}
