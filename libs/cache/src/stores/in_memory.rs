use std::sync::Mutex;

use cached::{Cached, TimedSizedCache};
use serde_json::Value;

use crate::{
  cache_manager::{CacheError, CacheStore},
  config::InMemoryConfig,
};

#[derive(Debug)]
pub struct InMemoryCacheStore {
  id: String,
  cache: Mutex<TimedSizedCache<String, Value>>,
}

impl InMemoryCacheStore {
  pub fn new(id: String, config: &InMemoryConfig) -> Self {
    let cache = TimedSizedCache::with_size_and_lifespan(config.max_size, config.cache_ttl_seconds);

    InMemoryCacheStore {
      id,
      cache: Mutex::new(cache),
    }
  }

  fn poisoned(&self) -> CacheError {
    CacheError::LockPoisoned {
      id: self.id.clone(),
    }
  }
}

#[async_trait::async_trait(?Send)]
impl CacheStore for InMemoryCacheStore {
  async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
    let mut cache = self.cache.lock().map_err(|_| self.poisoned())?;

    Ok(cache.cache_get(key).cloned())
  }

  async fn set(&self, key: String, value: Value) -> Result<(), CacheError> {
    let mut cache = self.cache.lock().map_err(|_| self.poisoned())?;
    cache.cache_set(key, value);

    Ok(())
  }

  fn id(&self) -> &str {
    &self.id
  }
}
