use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum CacheStoreConfig {
  /// A Redis-backed store, shared between gateway instances.
  #[serde(rename = "redis")]
  #[schemars(title = "redis")]
  Redis { id: String, config: RedisConfig },
  /// A process-local store.
  #[serde(rename = "in_memory")]
  #[schemars(title = "in_memory")]
  InMemory {
    id: String,
    #[serde(default)]
    config: InMemoryConfig,
  },
}

impl CacheStoreConfig {
  pub fn id(&self) -> &str {
    match self {
      CacheStoreConfig::Redis { id, .. } => id,
      CacheStoreConfig::InMemory { id, .. } => id,
    }
  }
}

/// Configuration for Redis.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct RedisConfig {
  /// Connection string to the Redis server (e.g: "redis://localhost:6379").
  pub connection_string: String,

  /// Time-to-live for cache entries in seconds. Default is 600 seconds (10 minutes).
  #[serde(default = "default_cache_ttl_seconds")]
  pub cache_ttl_seconds: u64,

  /// The maximum number of connections in the Redis connection pool. Default is 10.
  #[serde(default = "redis_default_pool_size")]
  pub pool_size: u32,

  /// Timeout for acquiring a connection from the pool in seconds. Default is 5 seconds.
  #[serde(default = "redis_default_pool_timeout")]
  pub pool_timeout: u64,
}

fn default_cache_ttl_seconds() -> u64 {
  600
}

fn redis_default_pool_size() -> u32 {
  10
}

fn redis_default_pool_timeout() -> u64 {
  5
}

/// Configuration for In-Memory caching, it internally works using an LRU (Least Recently Used) eviction policy
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct InMemoryConfig {
  /// The maximum number of cache entries. Default is 1000 entries.
  /// When the cache reaches this size, it will start evicting entries
  /// based on the eviction policy.
  #[serde(default = "in_memory_default_max_size")]
  pub max_size: usize,

  /// Time-to-live for cache entries in seconds. Default is 600 seconds (10 minutes).
  /// This is the duration after which a cache entry will be automatically removed.
  #[serde(default = "default_cache_ttl_seconds")]
  pub cache_ttl_seconds: u64,
}

impl Default for InMemoryConfig {
  fn default() -> Self {
    Self {
      max_size: in_memory_default_max_size(),
      cache_ttl_seconds: default_cache_ttl_seconds(),
    }
  }
}

fn in_memory_default_max_size() -> usize {
  1000
}
