use std::path::{Path, PathBuf};

use crate::config::DEFAULT_DB_NAME;
use crate::{RatingsResult, RatingsStore, StoreConfig};

pub fn load_or_init_config(base: &Path) -> RatingsResult<StoreConfig> {
    let default_sqlite = base.join(DEFAULT_DB_NAME);
    StoreConfig::load_or_init(base, &default_sqlite)
}

pub async fn open_store(base: &Path) -> RatingsResult<RatingsStore> {
    let config = load_or_init_config(base)?;
    RatingsStore::connect(&config, base).await
}

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_DB_NAME)
}
