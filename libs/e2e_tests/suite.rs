use std::sync::Arc;

use gateway_common::{
  execute::RequestExecutionContext,
  graphql::{extract_graphql_request, parse_graphql_schema, GraphQLResponse},
  http::{
    extract_accept, Bytes, ConductorHttpRequest, ConductorHttpResponse, StatusCode, CONTENT_TYPE,
  },
  http_client::{create_http_client, traced_reqwest},
  plugin::Plugin,
  plugin_manager::PluginManager,
};
use httpmock::{prelude::*, Then, When};
use serde_json::json;

/// Drives a request through the plugin pipeline the way the gateway does, and forwards
/// whatever survives to a mocked upstream.
#[derive(Default)]
pub struct TestSuite {
  pub plugins: Vec<Box<dyn Plugin>>,
  /// SDL handed to `on_schema_load` before the request runs.
  pub schema: Option<&'static str>,
  pub mock_server: Option<MockServer>,
}

impl TestSuite {
  pub async fn run_with_mock(
    self,
    request: ConductorHttpRequest,
    mock_fn: impl FnOnce(When, Then),
  ) -> ConductorHttpResponse {
    let mock_server = match self.mock_server {
      Some(mock_server) => mock_server,
      None => MockServer::start_async().await,
    };
    let mock = mock_server.mock_async(mock_fn).await;

    let response = execute(
      self.plugins,
      self.schema,
      request,
      &mock_server.url("/graphql"),
    )
    .await;

    mock.assert_async().await;
    response
  }

  pub async fn run_http_request(self, request: ConductorHttpRequest) -> ConductorHttpResponse {
    let mock_server = match self.mock_server {
      Some(mock_server) => mock_server,
      None => MockServer::start_async().await,
    };

    mock_server
      .mock_async(|when, then| {
        when.method(POST).path("/graphql");
        then
          .status(200)
          .header("content-type", "application/json")
          .body(
            json!({
                "data": {
                    "__typename": "Mutation"
                }
            })
            .to_string(),
          );
      })
      .await;

    execute(
      self.plugins,
      self.schema,
      request,
      &mock_server.url("/graphql"),
    )
    .await
  }
}

pub async fn execute(
  plugins: Vec<Box<dyn Plugin>>,
  schema: Option<&str>,
  request: ConductorHttpRequest,
  upstream_url: &str,
) -> ConductorHttpResponse {
  let plugin_manager = PluginManager::new_from_vec(plugins);

  if let Some(sdl) = schema {
    let schema = Arc::new(parse_graphql_schema(sdl).expect("test schema is valid"));

    if let Err(e) = plugin_manager.on_schema_load(&schema).await {
      return GraphQLResponse::new_error(&e.to_string())
        .into_with_status_code(StatusCode::INTERNAL_SERVER_ERROR);
    }
  }

  let mut ctx = RequestExecutionContext::new(request);

  plugin_manager.on_downstream_http_request(&mut ctx).await;
  if let Some(response) = ctx.short_circuit_response.take() {
    return response;
  }

  if ctx.has_failed_extraction() {
    match extract_graphql_request(&ctx.downstream_http_request) {
      Ok(parsed) => ctx.downstream_graphql_request = Some(parsed),
      Err(e) => return e.into_response(extract_accept(&ctx.downstream_http_request.headers)),
    }
  }

  plugin_manager.on_downstream_graphql_request(&mut ctx).await;
  if let Some(response) = ctx.short_circuit_response.take() {
    return response;
  }

  let body: Bytes = match &ctx.downstream_graphql_request {
    Some(gql_req) => (&gql_req.request).into(),
    None => Bytes::new(),
  };

  let client = traced_reqwest(create_http_client().build().expect("http client"));
  let upstream_response = client
    .post(upstream_url)
    .header(CONTENT_TYPE, "application/json")
    .body(body)
    .send()
    .await
    .expect("upstream is reachable");

  ConductorHttpResponse {
    status: upstream_response.status(),
    headers: upstream_response.headers().clone(),
    body: upstream_response.bytes().await.expect("upstream body"),
  }
}
