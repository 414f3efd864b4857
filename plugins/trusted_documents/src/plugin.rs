use std::sync::Arc;

use crate::{
  protocols::{
    document_id::DocumentIdTrustedDocumentsProtocol, get_handler::TrustedDocumentsGetHandler,
  },
  store::{fs::TrustedDocumentsFilesystemStore, hive::HiveTrustedDocumentsStore},
};

use super::{protocols::TrustedDocumentsProtocol, store::TrustedDocumentsStore};
use crate::config::{
  TrustedDocumentsPluginConfig, TrustedDocumentsPluginStoreConfig, TrustedDocumentsProtocolConfig,
};
use gateway_cache::config::InMemoryConfig;
use gateway_cache::stores::in_memory::InMemoryCacheStore;
use gateway_cache::{CacheManager, CacheStoreProxy};
use gateway_common::{
  execute::RequestExecutionContext,
  graphql::{ExtractGraphQLOperationError, GraphQLRequest, GraphQLResponse, ParsedGraphQLRequest},
  http::{extract_header, header::InvalidHeaderValue, StatusCode},
  http_client::{create_http_client, traced_reqwest},
  plugin::{CreatablePlugin, Plugin, PluginError},
};
use tracing::{debug, error, info, warn};

const DEFAULT_CACHE_STORE_ID: &str = "trusted_documents";

#[derive(Debug)]
pub struct TrustedDocumentsPlugin {
  config: TrustedDocumentsPluginConfig,
  incoming_message_handlers: Vec<Box<dyn TrustedDocumentsProtocol>>,
  store: Box<dyn TrustedDocumentsStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum TrustedDocumentsPluginError {
  #[error("failed to create store: {0}")]
  StoreCreationError(String),
  #[error("cache store \"{0}\" is not defined in cache_stores")]
  MissingCacheStore(String),
  #[error("invalid Hive CDN access token: {0}")]
  InvalidAccessToken(#[from] InvalidHeaderValue),
  #[error("failed to create http client: {0}")]
  HttpClientError(#[from] reqwest::Error),
}

impl From<TrustedDocumentsPluginError> for PluginError {
  fn from(e: TrustedDocumentsPluginError) -> Self {
    PluginError::InitError { source: e.into() }
  }
}

#[async_trait::async_trait(?Send)]
impl CreatablePlugin for TrustedDocumentsPlugin {
  type Config = TrustedDocumentsPluginConfig;

  /// Creates the plugin without access to shared cache stores: a Hive store that references a
  /// `cache` id fails, use [`TrustedDocumentsPlugin::new_with_cache_manager`] instead.
  async fn create(config: Self::Config) -> Result<Box<Self>, PluginError> {
    Self::new_with_cache_manager(config, &CacheManager::default()).map(Box::new)
  }
}

impl TrustedDocumentsPlugin {
  pub fn new_with_cache_manager(
    config: TrustedDocumentsPluginConfig,
    cache_manager: &CacheManager,
  ) -> Result<Self, PluginError> {
    debug!("creating trusted documents plugin");

    let store = create_store(&config.store, cache_manager)?;

    Ok(Self::new_with_store(config, store))
  }

  pub fn new_with_store(
    config: TrustedDocumentsPluginConfig,
    store: Box<dyn TrustedDocumentsStore>,
  ) -> Self {
    let incoming_message_handlers = config
      .protocols
      .iter()
      .map(|protocol| match protocol {
        TrustedDocumentsProtocolConfig::DocumentId { field_name } => {
          debug!(
            "adding trusted documents protocol of type document_id with field_name: {}",
            field_name
          );

          Box::new(DocumentIdTrustedDocumentsProtocol {
            field_name: field_name.to_string(),
          }) as Box<dyn TrustedDocumentsProtocol>
        }
        TrustedDocumentsProtocolConfig::HttpGet { document_id_param } => {
          debug!(
            "adding trusted documents protocol of type http_get with document_id_param: {}",
            document_id_param
          );

          Box::new(TrustedDocumentsGetHandler {
            document_id_param: document_id_param.to_string(),
          }) as Box<dyn TrustedDocumentsProtocol>
        }
      })
      .collect();

    Self {
      config,
      store,
      incoming_message_handlers,
    }
  }

  fn is_bypassed(&self, ctx: &RequestExecutionContext) -> bool {
    match &self.config.bypass_secret {
      Some(secret) => {
        extract_header(
          &ctx.downstream_http_request.headers,
          &self.config.bypass_header,
        )
        .as_ref()
          == Some(secret)
      }
      None => false,
    }
  }

  fn reject(&self, ctx: &mut RequestExecutionContext, document_id: Option<&str>) {
    let response = match document_id {
      Some(document_id) => {
        error!(
          "no trusted document found for document id {:?}, short-circuit with an error",
          document_id
        );

        GraphQLResponse::new_error("No document found for documentId")
          .into_with_status_code(StatusCode::NOT_FOUND)
      }
      None => {
        error!("untrusted documents are not allowed, short-circuit with an error");

        GraphQLResponse::new_error("This operation requires a valid documentId")
          .into_with_status_code(StatusCode::BAD_REQUEST)
      }
    };

    ctx.short_circuit(response);
  }
}

fn create_store(
  config: &TrustedDocumentsPluginStoreConfig,
  cache_manager: &CacheManager,
) -> Result<Box<dyn TrustedDocumentsStore>, TrustedDocumentsPluginError> {
  Ok(match config {
    TrustedDocumentsPluginStoreConfig::File { file } => {
      let fs_store = TrustedDocumentsFilesystemStore::new_from_file_contents(&file.contents)
        .map_err(|e| TrustedDocumentsPluginError::StoreCreationError(e.to_string()))?;

      Box::new(fs_store)
    }
    TrustedDocumentsPluginStoreConfig::Hive {
      endpoint,
      access_token,
      cache,
      retry,
    } => {
      let cache = match cache {
        Some(cache_id) => cache_manager
          .get_store(cache_id)
          .ok_or_else(|| TrustedDocumentsPluginError::MissingCacheStore(cache_id.clone()))?,
        None => {
          debug!("no cache store configured for trusted documents, using a private in-memory store");

          CacheStoreProxy::new(Arc::new(InMemoryCacheStore::new(
            DEFAULT_CACHE_STORE_ID.to_string(),
            &InMemoryConfig::default(),
          )))
        }
      };

      let http_client = traced_reqwest(create_http_client().build()?);

      Box::new(HiveTrustedDocumentsStore::new(
        endpoint,
        access_token,
        cache,
        http_client,
        retry.into(),
      )?)
    }
  })
}

#[async_trait::async_trait(?Send)]
impl Plugin for TrustedDocumentsPlugin {
  #[tracing::instrument(level = "debug", skip_all, name = "TrustedDocumentsPlugin::on_downstream_http_request")]
  async fn on_downstream_http_request(&self, ctx: &mut RequestExecutionContext) {
    if ctx.downstream_graphql_request.is_some() {
      return;
    }

    if self.is_bypassed(ctx) {
      debug!("bypass header matched, skipping trusted documents check");
      return;
    }

    let mut requested_document_id = None;

    for extractor in &self.incoming_message_handlers {
      debug!(
        "trying to extract trusted document from incoming request, extractor: {:?}",
        extractor
      );

      let extracted = match extractor.as_ref().try_extraction(ctx).await {
        Some(extracted) => extracted,
        None => continue,
      };

      info!(
        "extracted trusted document from incoming request: {:?}",
        extracted
      );

      match self.store.get_document(&extracted.document_id).await {
        Some(document) if !document.is_empty() => {
          debug!("found trusted document with id {:?}", extracted.document_id);

          match ParsedGraphQLRequest::create_and_parse(GraphQLRequest {
            operation: document,
            operation_name: extracted.operation_name,
            variables: extracted.variables,
            extensions: extracted.extensions,
          }) {
            Ok(parsed) => {
              ctx.downstream_graphql_request = Some(parsed);
            }
            Err(e) => {
              warn!(
                "failed to parse GraphQL request from a store object with key {:?}, error: {:?}",
                extracted.document_id, e
              );

              ctx.short_circuit(
                ExtractGraphQLOperationError::GraphQLParserError(e).into_response(None),
              );
            }
          }

          return;
        }
        _ => {
          warn!(
            "trusted document with id {:?} not found",
            extracted.document_id
          );
        }
      }

      requested_document_id = Some(extracted.document_id);
      break;
    }

    if self.config.strict {
      self.reject(ctx, requested_document_id.as_deref());
    }
  }

  async fn on_downstream_graphql_request(&self, ctx: &mut RequestExecutionContext) {
    for item in self.incoming_message_handlers.iter() {
      if let Some(response) = item.as_ref().should_prevent_execution(ctx) {
        warn!(
          "trusted document execution was prevented by extractor {:?}",
          item
        );
        ctx.short_circuit(response);
        return;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gateway_common::http::{ConductorHttpRequest, HeaderValue, Method};
  use serde_json::{json, Value};

  fn config(strict: bool, bypass_secret: Option<&str>) -> TrustedDocumentsPluginConfig {
    serde_json::from_value(json!({
      "store": { "source": "hive", "endpoint": "http://localhost", "access_token": "key" },
      "strict": strict,
      "bypass_secret": bypass_secret,
    }))
    .unwrap()
  }

  fn plugin(strict: bool, bypass_secret: Option<&str>) -> TrustedDocumentsPlugin {
    let store = TrustedDocumentsFilesystemStore::new_from_file_contents(
      &json!({
        "app/v1/query": "query test { __typename }",
        "app/v1/mutation": "mutation { ping }",
        "app/v1/broken": "query {",
        "app/v1/empty": ""
      })
      .to_string(),
    )
    .unwrap();

    TrustedDocumentsPlugin::new_with_store(config(strict, bypass_secret), Box::new(store))
  }

  fn post(body: Value) -> RequestExecutionContext {
    RequestExecutionContext::new(ConductorHttpRequest {
      method: Method::POST,
      body: body.to_string().into(),
      ..Default::default()
    })
  }

  fn get(query_string: &str) -> RequestExecutionContext {
    RequestExecutionContext::new(ConductorHttpRequest {
      method: Method::GET,
      query_string: query_string.to_string(),
      ..Default::default()
    })
  }

  fn error_message(ctx: &RequestExecutionContext) -> String {
    let response = ctx.short_circuit_response.as_ref().unwrap();
    let body: Value = serde_json::from_slice(&response.body).unwrap();

    body["errors"][0]["message"].as_str().unwrap().to_string()
  }

  #[tokio::test]
  async fn resolves_document_from_post_body() {
    let mut ctx = post(json!({
      "documentId": "app/v1/query",
      "operationName": "test",
      "variables": { "a": 1 }
    }));

    plugin(true, None).on_downstream_http_request(&mut ctx).await;

    assert!(!ctx.is_short_circuit());
    let gql = ctx.downstream_graphql_request.unwrap();
    assert_eq!(gql.request.operation, "query test { __typename }");
    assert_eq!(gql.request.operation_name.as_deref(), Some("test"));
    assert_eq!(gql.request.variables.unwrap().get("a"), Some(&json!(1)));
  }

  #[tokio::test]
  async fn resolves_document_from_query_string() {
    let mut ctx = get("documentId=app%2Fv1%2Fquery&operationName=test");

    plugin(true, None).on_downstream_http_request(&mut ctx).await;

    assert!(!ctx.is_short_circuit());
    assert!(ctx.downstream_graphql_request.is_some());
    assert_eq!(ctx.downstream_http_request.query_string, "operationName=test");
  }

  #[tokio::test]
  async fn strict_mode_rejects_unknown_documents() {
    let mut ctx = post(json!({ "documentId": "app/v1/unknown" }));
    plugin(true, None).on_downstream_http_request(&mut ctx).await;

    assert_eq!(
      ctx.short_circuit_response.as_ref().unwrap().status,
      StatusCode::NOT_FOUND
    );
    assert_eq!(error_message(&ctx), "No document found for documentId");

    let mut ctx = post(json!({ "documentId": "app/v1/empty" }));
    plugin(true, None).on_downstream_http_request(&mut ctx).await;
    assert_eq!(error_message(&ctx), "No document found for documentId");
  }

  #[tokio::test]
  async fn strict_mode_requires_a_document_id() {
    let mut ctx = post(json!({ "query": "query { __typename }" }));
    plugin(true, None).on_downstream_http_request(&mut ctx).await;

    assert_eq!(
      ctx.short_circuit_response.as_ref().unwrap().status,
      StatusCode::BAD_REQUEST
    );
    assert_eq!(error_message(&ctx), "This operation requires a valid documentId");
  }

  #[tokio::test]
  async fn empty_document_id_counts_as_missing() {
    let mut ctx = post(json!({ "documentId": "" }));
    plugin(true, None).on_downstream_http_request(&mut ctx).await;

    assert_eq!(
      ctx.short_circuit_response.as_ref().unwrap().status,
      StatusCode::BAD_REQUEST
    );
    assert_eq!(error_message(&ctx), "This operation requires a valid documentId");

    let mut ctx = get("documentId=");
    plugin(true, None).on_downstream_http_request(&mut ctx).await;
    assert_eq!(error_message(&ctx), "This operation requires a valid documentId");
  }

  #[tokio::test]
  async fn non_strict_mode_lets_requests_through() {
    let mut ctx = post(json!({ "query": "query { __typename }" }));
    plugin(false, None).on_downstream_http_request(&mut ctx).await;
    assert!(!ctx.is_short_circuit());
    assert!(ctx.downstream_graphql_request.is_none());

    let mut ctx = post(json!({ "documentId": "app/v1/unknown" }));
    plugin(false, None).on_downstream_http_request(&mut ctx).await;
    assert!(!ctx.is_short_circuit());
  }

  #[tokio::test]
  async fn bypass_header_skips_the_check() {
    let plugin = plugin(true, Some("let-me-in"));

    let mut ctx = post(json!({ "query": "query { __typename }" }));
    ctx.downstream_http_request.headers.insert(
      "x-bypass-trusted-operations",
      HeaderValue::from_static("let-me-in"),
    );
    plugin.on_downstream_http_request(&mut ctx).await;
    assert!(!ctx.is_short_circuit());

    let mut ctx = post(json!({ "query": "query { __typename }" }));
    ctx.downstream_http_request.headers.insert(
      "x-bypass-trusted-operations",
      HeaderValue::from_static("wrong"),
    );
    plugin.on_downstream_http_request(&mut ctx).await;
    assert!(ctx.is_short_circuit());
  }

  #[tokio::test]
  async fn bypass_header_is_ignored_without_a_secret() {
    let mut ctx = post(json!({ "query": "query { __typename }" }));
    ctx
      .downstream_http_request
      .headers
      .insert("x-bypass-trusted-operations", HeaderValue::from_static(""));

    plugin(true, None).on_downstream_http_request(&mut ctx).await;
    assert!(ctx.is_short_circuit());
  }

  #[tokio::test]
  async fn invalid_stored_document_short_circuits() {
    let mut ctx = post(json!({ "documentId": "app/v1/broken" }));
    plugin(false, None).on_downstream_http_request(&mut ctx).await;

    assert!(ctx.is_short_circuit());
    assert!(ctx.downstream_graphql_request.is_none());
  }

  #[tokio::test]
  async fn existing_graphql_request_is_kept() {
    let mut ctx = post(json!({ "documentId": "app/v1/unknown" }));
    ctx.downstream_graphql_request =
      Some(ParsedGraphQLRequest::create_and_parse(GraphQLRequest::default()).unwrap());

    plugin(true, None).on_downstream_http_request(&mut ctx).await;
    assert!(!ctx.is_short_circuit());
  }

  #[tokio::test]
  async fn mutations_over_get_are_prevented() {
    let plugin = plugin(true, None);
    let mut ctx = get("documentId=app%2Fv1%2Fmutation");

    plugin.on_downstream_http_request(&mut ctx).await;
    assert!(ctx.downstream_graphql_request.is_some());

    plugin.on_downstream_graphql_request(&mut ctx).await;
    assert_eq!(
      ctx.short_circuit_response.unwrap().status,
      StatusCode::METHOD_NOT_ALLOWED
    );
  }

  #[tokio::test]
  async fn create_fails_on_undeclared_cache_store() {
    let config: TrustedDocumentsPluginConfig = serde_json::from_value(json!({
      "store": {
        "source": "hive",
        "endpoint": "http://localhost",
        "access_token": "key",
        "cache": "shared"
      }
    }))
    .unwrap();

    assert!(matches!(
      TrustedDocumentsPlugin::create(config.clone()).await,
      Err(PluginError::InitError { .. })
    ));

    let manager = CacheManager::new(&[gateway_cache::CacheStoreConfig::InMemory {
      id: "shared".to_string(),
      config: InMemoryConfig::default(),
    }])
    .unwrap();
    assert!(TrustedDocumentsPlugin::new_with_cache_manager(config, &manager).is_ok());
  }

  #[tokio::test]
  async fn create_uses_private_cache_by_default() {
    assert!(TrustedDocumentsPlugin::create(config(true, None)).await.is_ok());
  }
}
