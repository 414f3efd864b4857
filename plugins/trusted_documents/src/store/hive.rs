use gateway_cache::CacheStoreProxy;
use gateway_common::http::{HeaderValue, HttpHeadersMap};
use gateway_common::http::header::InvalidHeaderValue;
use gateway_common::http_client::TracedHttpClient;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::TrustedDocumentsStore;
use crate::fetch::{fetch_with_retry, RetryPolicy};

/// Sent as `X-Hive-CDN-Key`, header names are case-insensitive.
pub const HIVE_CDN_KEY_HEADER: &str = "x-hive-cdn-key";

lazy_static! {
  static ref DOCUMENT_ID_REGEX: Regex =
    Regex::new(r"^[a-z0-9-]+/[a-z0-9-]+/[0-9a-z]+$").expect("document id regex is valid");
}

/// Hive document ids are `<app-name>/<app-version>/<document-hash>`.
pub fn is_valid_document_id(document_id: &str) -> bool {
  DOCUMENT_ID_REGEX.is_match(document_id)
}

/// The value written to the cache after a CDN lookup. Missing documents are cached too, so
/// repeated requests for an unknown id do not reach the CDN.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", content = "document", rename_all = "snake_case")]
pub enum CachedDocument {
  Found(String),
  KnownAbsent,
}

impl CachedDocument {
  pub fn into_document(self) -> Option<String> {
    match self {
      CachedDocument::Found(document) => Some(document),
      CachedDocument::KnownAbsent => None,
    }
  }
}

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
  Found(String),
  KnownAbsent,
  NotCached,
}

impl From<Option<CachedDocument>> for CacheLookup {
  fn from(value: Option<CachedDocument>) -> Self {
    match value {
      Some(CachedDocument::Found(document)) => CacheLookup::Found(document),
      Some(CachedDocument::KnownAbsent) => CacheLookup::KnownAbsent,
      None => CacheLookup::NotCached,
    }
  }
}

/// Cache-aside resolver for documents stored in the Hive CDN.
#[derive(Debug)]
pub struct HiveTrustedDocumentsStore {
  endpoint: String,
  headers: HttpHeadersMap,
  cache: CacheStoreProxy<CachedDocument>,
  http_client: TracedHttpClient,
  retry_policy: RetryPolicy,
}

impl HiveTrustedDocumentsStore {
  pub fn new(
    endpoint: &str,
    access_token: &str,
    cache: CacheStoreProxy<CachedDocument>,
    http_client: TracedHttpClient,
    retry_policy: RetryPolicy,
  ) -> Result<Self, InvalidHeaderValue> {
    let mut access_token = HeaderValue::from_str(access_token)?;
    access_token.set_sensitive(true);

    let mut headers = HttpHeadersMap::new();
    headers.insert(HIVE_CDN_KEY_HEADER, access_token);

    Ok(Self {
      endpoint: endpoint.trim_end_matches('/').to_string(),
      headers,
      cache,
      http_client,
      retry_policy,
    })
  }

  pub fn document_url(&self, document_id: &str) -> String {
    format!("{}/apps/{}", self.endpoint, document_id)
  }

  /// Reads the cache. A failing cache is logged and reported as [`CacheLookup::NotCached`].
  pub async fn lookup_cache(&self, document_id: &str) -> CacheLookup {
    match self.cache.get(document_id).await {
      Ok(value) => value.into(),
      Err(e) => {
        error!(
          "failed to read trusted document {:?} from cache: {}",
          document_id, e
        );

        CacheLookup::NotCached
      }
    }
  }

  async fn fetch_document(&self, document_id: &str) -> CachedDocument {
    let url = self.document_url(document_id);

    let response = match fetch_with_retry(
      &self.http_client,
      &url,
      &self.headers,
      &self.retry_policy,
    )
    .await
    {
      Ok(response) => response,
      Err(e) => {
        warn!("trusted document {:?} was not found: {}", document_id, e);

        return CachedDocument::KnownAbsent;
      }
    };

    match response.text().await {
      Ok(document) => CachedDocument::Found(document),
      Err(e) => {
        error!(
          "failed to read the body of trusted document {:?}: {}",
          document_id, e
        );

        CachedDocument::KnownAbsent
      }
    }
  }
}

#[async_trait::async_trait(?Send)]
impl TrustedDocumentsStore for HiveTrustedDocumentsStore {
  #[tracing::instrument(level = "debug", skip(self))]
  async fn get_document(&self, document_id: &str) -> Option<String> {
    match self.lookup_cache(document_id).await {
      CacheLookup::Found(document) => {
        debug!("trusted document served from cache");
        return Some(document);
      }
      CacheLookup::KnownAbsent => {
        debug!("trusted document is known to be absent");
        return None;
      }
      CacheLookup::NotCached => {}
    }

    if !is_valid_document_id(document_id) {
      warn!("invalid document id {:?}, skipping the lookup", document_id);

      return None;
    }

    let outcome = self.fetch_document(document_id).await;

    if let Err(e) = self.cache.set(document_id.to_string(), &outcome).await {
      error!(
        "failed to write trusted document {:?} to cache: {}",
        document_id, e
      );
    }

    outcome.into_document()
  }
}
