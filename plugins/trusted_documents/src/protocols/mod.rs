pub mod document_id;
pub mod get_handler;

use std::fmt::Debug;

use gateway_common::execute::RequestExecutionContext;
use gateway_common::http::ConductorHttpResponse;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTrustedDocument {
  pub document_id: String,
  pub variables: Option<Map<String, Value>>,
  pub operation_name: Option<String>,
  pub extensions: Option<Map<String, Value>>,
}

/// Defines how a document id is carried by an incoming request.
///
/// A successful extraction also removes the protocol-specific fields from the downstream
/// request, so they are not forwarded.
#[async_trait::async_trait(?Send)]
pub trait TrustedDocumentsProtocol: Sync + Send + Debug {
  async fn try_extraction(
    &self,
    ctx: &mut RequestExecutionContext,
  ) -> Option<ExtractedTrustedDocument>;

  fn should_prevent_execution(
    &self,
    _ctx: &RequestExecutionContext,
  ) -> Option<ConductorHttpResponse> {
    None
  }
}
