use crate::config::CacheStoreConfig;
use crate::stores::in_memory::InMemoryCacheStore;
use crate::stores::redis::RedisCacheStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
  #[error("failed to serialize or deserialize cached value: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("cache store \"{id}\" is unavailable: {reason}")]
  Unavailable { id: String, reason: String },
  #[error("cache store \"{id}\" lock is poisoned")]
  LockPoisoned { id: String },
}

/// A key/value backend. Both operations may fail independently; callers decide how to degrade.
#[async_trait::async_trait(?Send)]
pub trait CacheStore: fmt::Debug + Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;
  async fn set(&self, key: String, value: Value) -> Result<(), CacheError>;

  fn id(&self) -> &str;
}

pub type SharedCacheStore = Arc<dyn CacheStore>;

#[derive(Clone, Default)]
pub struct CacheManager {
  stores: HashMap<String, SharedCacheStore>,
}

impl fmt::Debug for CacheManager {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("CacheManager")
      .field("stores", &self.stores.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl CacheManager {
  pub fn new(config: &[CacheStoreConfig]) -> Result<Self, CacheError> {
    let mut manager = CacheManager::default();

    for store_config in config {
      let store: SharedCacheStore = match store_config {
        CacheStoreConfig::InMemory { id, config } => {
          Arc::new(InMemoryCacheStore::new(id.clone(), config))
        }
        CacheStoreConfig::Redis { id, config } => {
          Arc::new(RedisCacheStore::new(id.clone(), config)?)
        }
      };

      debug!("registering cache store \"{}\"", store.id());
      manager.register_store(store);
    }

    Ok(manager)
  }

  pub fn register_store(&mut self, store: SharedCacheStore) {
    self.stores.insert(store.id().to_string(), store);
  }

  pub fn get_store<T>(&self, store_id: &str) -> Option<CacheStoreProxy<T>>
  where
    T: DeserializeOwned + Serialize,
  {
    self
      .stores
      .get(store_id)
      .map(|store| CacheStoreProxy::new(store.clone()))
  }
}

/// Typed view over a [`CacheStore`], values travel as JSON.
pub struct CacheStoreProxy<T>
where
  T: DeserializeOwned + Serialize,
{
  store: SharedCacheStore,
  _phantom: PhantomData<T>,
}

impl<T: DeserializeOwned + Serialize> fmt::Debug for CacheStoreProxy<T> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("CacheStoreProxy")
      .field("store", &self.store.id())
      .finish()
  }
}

impl<T: DeserializeOwned + Serialize> Clone for CacheStoreProxy<T> {
  fn clone(&self) -> Self {
    CacheStoreProxy::new(self.store.clone())
  }
}

impl<T: DeserializeOwned + Serialize> CacheStoreProxy<T> {
  pub fn new(store: SharedCacheStore) -> Self {
    CacheStoreProxy {
      store,
      _phantom: PhantomData,
    }
  }

  pub async fn get(&self, key: &str) -> Result<Option<T>, CacheError> {
    match self.store.get(key).await? {
      Some(value) => Ok(Some(serde_json::from_value(value)?)),
      None => Ok(None),
    }
  }

  pub async fn set(&self, key: String, value: &T) -> Result<(), CacheError> {
    self.store.set(key, serde_json::to_value(value)?).await
  }
}
