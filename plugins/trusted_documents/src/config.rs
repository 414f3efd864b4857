use gateway_common::serde_utils::LocalFileReference;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetch::RetryPolicy;

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct TrustedDocumentsPluginConfig {
  /// The store defines the source of trusted documents: where a document ID is resolved into
  /// the full GraphQL document.
  pub store: TrustedDocumentsPluginStoreConfig,
  /// A list of protocols to be exposed by this plugin. Each protocol defines how to obtain the document ID from the incoming request.
  /// By default, both `document_id` (POST body) and `http_get` (query string) are enabled.
  #[serde(default = "default_protocols")]
  pub protocols: Vec<TrustedDocumentsProtocolConfig>,
  /// When enabled (the default), requests that do not resolve to a trusted document are rejected.
  /// When disabled, such requests continue through the pipeline untouched.
  #[serde(default = "default_strict")]
  pub strict: bool,
  /// The name of the HTTP header that can be used to skip the trusted documents check.
  /// Only effective when `bypass_secret` is set.
  #[serde(default = "default_bypass_header")]
  pub bypass_header: String,
  /// The value the bypass header must carry for a request to skip the check.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bypass_secret: Option<String>,
}

fn default_protocols() -> Vec<TrustedDocumentsProtocolConfig> {
  vec![
    TrustedDocumentsProtocolConfig::DocumentId {
      field_name: document_id_default_field_name(),
    },
    TrustedDocumentsProtocolConfig::HttpGet {
      document_id_param: document_id_default_field_name(),
    },
  ]
}

fn default_strict() -> bool {
  true
}

fn default_bypass_header() -> String {
  "x-bypass-trusted-operations".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "source")]
pub enum TrustedDocumentsPluginStoreConfig {
  /// Resolves documents from the Hive CDN (`GET {endpoint}/apps/{documentId}`).
  /// Results, including missing documents, are kept in a cache store.
  #[serde(rename = "hive")]
  #[schemars(title = "hive")]
  Hive {
    /// The Hive CDN endpoint of the target, for example `https://cdn.graphql-hive.com/artifacts/v1/<target-id>`.
    endpoint: String,
    /// The CDN access token, sent as the `X-Hive-CDN-Key` header.
    access_token: String,
    /// The id of a store declared in the top-level `cache_stores`.
    /// When not set, a private in-memory store is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache: Option<String>,
    /// Retry behaviour for CDN requests.
    #[serde(default)]
    retry: RetryConfig,
  },
  /// File-based store configuration. The path specified is relative to the location of the root configuration file.
  /// The file is a JSON map of document IDs to GraphQL documents, loaded into memory on startup.
  ///
  /// Example:
  /// `{"app/v1/abc": "query { __typename }"}`
  #[serde(rename = "file")]
  #[schemars(title = "file")]
  File {
    #[serde(rename = "path")]
    /// A path to a local file on the file-system. Relative to the location of the root configuration file.
    file: LocalFileReference,
  },
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct RetryConfig {
  /// How many times a failed request is retried. Default is 3.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// The delay before the first retry, doubled after every attempt. Default is `100ms`.
  #[serde(
    deserialize_with = "humantime_serde::deserialize",
    serialize_with = "humantime_serde::serialize",
    default = "default_initial_delay"
  )]
  #[schemars(with = "String")]
  pub initial_delay: Duration,
  /// The upper bound of the delay between two attempts. Default is `1s`.
  #[serde(
    deserialize_with = "humantime_serde::deserialize",
    serialize_with = "humantime_serde::serialize",
    default = "default_max_delay"
  )]
  #[schemars(with = "String")]
  pub max_delay: Duration,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_retries: default_max_retries(),
      initial_delay: default_initial_delay(),
      max_delay: default_max_delay(),
    }
  }
}

impl From<&RetryConfig> for RetryPolicy {
  fn from(config: &RetryConfig) -> Self {
    RetryPolicy {
      max_retries: config.max_retries,
      initial_delay: config.initial_delay,
      max_delay: config.max_delay,
    }
  }
}

fn default_max_retries() -> u32 {
  RetryPolicy::default().max_retries
}

fn default_initial_delay() -> Duration {
  RetryPolicy::default().initial_delay
}

fn default_max_delay() -> Duration {
  RetryPolicy::default().max_delay
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum TrustedDocumentsProtocolConfig {
  /// This protocol is based on a `POST` request with a JSON body containing a field with the document ID.
  /// By default, the field name is `documentId`. The `persistedQuery` extension is removed from the forwarded request.
  ///
  /// Example:
  /// `POST /graphql {"documentId": "app/v1/abc", "variables": {"code": "AF"}, "operationName": "test"}`
  #[serde(rename = "document_id")]
  #[schemars(title = "document_id")]
  DocumentId {
    /// The name of the JSON field containing the document ID in the incoming request.
    #[serde(default = "document_id_default_field_name")]
    field_name: String,
  },
  /// This protocol is based on a HTTP `GET` request, all parameters are read from the query string.
  /// `variables` must be passed as a JSON-encoded string.
  ///
  /// Unlike other protocols, this protocol does not support sending GraphQL mutations.
  ///
  /// Example:
  /// `GET /graphql?documentId=app%2Fv1%2Fabc&variables=%7B%22code%22%3A%22AF%22%7D&operationName=test`
  #[serde(rename = "http_get")]
  #[schemars(title = "http_get")]
  HttpGet {
    /// The name of the query string parameter containing the document ID.
    #[serde(default = "document_id_default_field_name")]
    document_id_param: String,
  },
}

fn document_id_default_field_name() -> String {
  "documentId".to_string()
}
