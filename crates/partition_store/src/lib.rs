pub mod config;
pub mod datastore;
mod db;
mod loader;
mod partition;
pub mod store;

pub use config::{DatabaseConfig, PoolConfig, StoreConfig};
pub use datastore::{default_sqlite_path, load_or_init_config, open_store};
pub use ratings_partition_core::*;
pub use store::RatingsStore;
