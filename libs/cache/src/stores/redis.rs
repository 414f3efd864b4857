use std::time::Duration;

use r2d2_redis::r2d2::{Pool, PooledConnection};
use r2d2_redis::redis::Commands;
use r2d2_redis::RedisConnectionManager;
use serde_json::Value;

use crate::cache_manager::{CacheError, CacheStore};
use crate::config::RedisConfig;

#[derive(Debug)]
pub struct RedisCacheStore {
  id: String,
  pool: Pool<RedisConnectionManager>,
  cache_ttl_seconds: u64,
}

impl RedisCacheStore {
  pub fn new(id: String, config: &RedisConfig) -> Result<Self, CacheError> {
    let manager = RedisConnectionManager::new(config.connection_string.as_str()).map_err(|e| {
      CacheError::Unavailable {
        id: id.clone(),
        reason: e.to_string(),
      }
    })?;

    // Connections are established lazily, an unreachable server must not prevent startup.
    let pool = Pool::builder()
      .max_size(config.pool_size)
      .connection_timeout(Duration::from_secs(config.pool_timeout))
      .build_unchecked(manager);

    Ok(RedisCacheStore {
      id,
      pool,
      cache_ttl_seconds: config.cache_ttl_seconds,
    })
  }

  fn unavailable(&self, reason: impl ToString) -> CacheError {
    CacheError::Unavailable {
      id: self.id.clone(),
      reason: reason.to_string(),
    }
  }

  fn get_con(&self) -> Result<PooledConnection<RedisConnectionManager>, CacheError> {
    self.pool.get().map_err(|e| self.unavailable(e))
  }
}

#[async_trait::async_trait(?Send)]
impl CacheStore for RedisCacheStore {
  async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
    let mut con = self.get_con()?;
    let value: Option<String> = con.get(key).map_err(|e| self.unavailable(e))?;

    match value {
      Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      None => Ok(None),
    }
  }

  async fn set(&self, key: String, value: Value) -> Result<(), CacheError> {
    let mut con = self.get_con()?;
    let raw = serde_json::to_string(&value)?;

    con
      .set_ex::<_, _, ()>(key, raw, self.cache_ttl_seconds as usize)
      .map_err(|e| self.unavailable(e))
  }

  fn id(&self) -> &str {
    &self.id
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_invalid_connection_string() {
    let result = RedisCacheStore::new(
      "broken".to_string(),
      &RedisConfig {
        connection_string: "not a url".to_string(),
        cache_ttl_seconds: 10,
        pool_size: 1,
        pool_timeout: 1,
      },
    );

    assert!(matches!(result, Err(CacheError::Unavailable { .. })));
  }
}
