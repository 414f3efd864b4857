pub mod cache_manager;
pub mod config;
pub mod stores;

pub use cache_manager::{CacheError, CacheManager, CacheStore, CacheStoreProxy, SharedCacheStore};
pub use config::CacheStoreConfig;
