use crate::{
  graphql::ParsedGraphQLRequest,
  http::{ConductorHttpRequest, ConductorHttpResponse},
};
use serde_json::{Map, Value};

type Context = Map<String, Value>;

#[derive(Debug)]
pub struct RequestExecutionContext {
  pub downstream_http_request: ConductorHttpRequest,
  pub downstream_graphql_request: Option<ParsedGraphQLRequest>,
  pub short_circuit_response: Option<ConductorHttpResponse>,
  context: Context,
}

impl RequestExecutionContext {
  pub fn new(downstream_http_request: ConductorHttpRequest) -> Self {
    RequestExecutionContext {
      downstream_http_request,
      downstream_graphql_request: None,
      short_circuit_response: None,
      context: Context::new(),
    }
  }

  pub fn short_circuit(&mut self, response: ConductorHttpResponse) {
    self.short_circuit_response = Some(response);
  }

  pub fn is_short_circuit(&self) -> bool {
    self.short_circuit_response.is_some()
  }

  pub fn has_failed_extraction(&self) -> bool {
    self.downstream_graphql_request.is_none()
  }

  /// Stores a value in the per-request user context. Plugins and directive hooks share it.
  pub fn ctx_insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.context.insert(key.into(), value.into())
  }

  pub fn ctx_get(&self, key: impl Into<String>) -> Option<&Value> {
    self.context.get(&key.into())
  }
}
