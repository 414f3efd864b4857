use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{ExtractedTrustedDocument, TrustedDocumentsProtocol};
use gateway_common::execute::RequestExecutionContext;
use gateway_common::{
  graphql::GraphQLResponse,
  http::{parse_query_string, strip_query_params, ConductorHttpResponse, Method, StatusCode},
};

#[derive(Debug)]
pub struct TrustedDocumentsGetHandler {
  pub document_id_param: String,
}

#[async_trait::async_trait(?Send)]
impl TrustedDocumentsProtocol for TrustedDocumentsGetHandler {
  async fn try_extraction(
    &self,
    ctx: &mut RequestExecutionContext,
  ) -> Option<ExtractedTrustedDocument> {
    if ctx.downstream_http_request.method != Method::GET {
      return None;
    }

    debug!("request http method is get, trying to extract from query string...");

    let params = parse_query_string(&ctx.downstream_http_request.query_string);
    let document_id = params
      .get(&self.document_id_param)
      .filter(|document_id| !document_id.is_empty())?
      .to_string();

    ctx.downstream_http_request.query_string = strip_query_params(
      &ctx.downstream_http_request.query_string,
      &[self.document_id_param.as_str(), "extensions"],
    );

    info!("successfully extracted incoming trusted document from query string");

    Some(ExtractedTrustedDocument {
      document_id,
      variables: params
        .get("variables")
        .and_then(|v| serde_json::from_str::<Map<String, Value>>(v).ok()),
      operation_name: params.get("operationName").cloned(),
      extensions: None,
    })
  }

  fn should_prevent_execution(
    &self,
    ctx: &RequestExecutionContext,
  ) -> Option<ConductorHttpResponse> {
    if ctx.downstream_http_request.method != Method::GET {
      return None;
    }

    match &ctx.downstream_graphql_request {
      Some(gql_req) if gql_req.is_running_mutation() => {
        debug!("trusted document contains a mutation, preventing because of GET request");

        Some(
          GraphQLResponse::new_error("mutations are not allowed over GET")
            .into_with_status_code(StatusCode::METHOD_NOT_ALLOWED),
        )
      }
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gateway_common::graphql::{GraphQLRequest, ParsedGraphQLRequest};
  use gateway_common::http::ConductorHttpRequest;
  use serde_json::json;

  fn handler() -> TrustedDocumentsGetHandler {
    TrustedDocumentsGetHandler {
      document_id_param: "documentId".to_string(),
    }
  }

  fn get(query_string: &str) -> RequestExecutionContext {
    RequestExecutionContext::new(ConductorHttpRequest {
      method: Method::GET,
      query_string: query_string.to_string(),
      ..Default::default()
    })
  }

  #[tokio::test]
  async fn extracts_from_query_string() {
    let mut ctx = get(
      "documentId=app%2Fv1%2Fabc&variables=%7B%22code%22%3A%22AF%22%7D&operationName=test&extensions=%7B%7D&foo=bar",
    );

    let extracted = handler().try_extraction(&mut ctx).await.unwrap();

    assert_eq!(extracted.document_id, "app/v1/abc");
    assert_eq!(extracted.operation_name.as_deref(), Some("test"));
    assert_eq!(extracted.variables.unwrap().get("code"), Some(&json!("AF")));
    assert!(extracted.extensions.is_none());
    assert_eq!(
      ctx.downstream_http_request.query_string,
      "variables=%7B%22code%22%3A%22AF%22%7D&operationName=test&foo=bar"
    );
  }

  #[tokio::test]
  async fn invalid_variables_are_ignored() {
    let mut ctx = get("documentId=app%2Fv1%2Fabc&variables=nope");

    let extracted = handler().try_extraction(&mut ctx).await.unwrap();
    assert!(extracted.variables.is_none());
    assert_eq!(ctx.downstream_http_request.query_string, "variables=nope");
  }

  #[tokio::test]
  async fn empty_or_repeated_document_id() {
    let mut ctx = get("documentId=&operationName=test");
    assert!(handler().try_extraction(&mut ctx).await.is_none());
    assert_eq!(
      ctx.downstream_http_request.query_string,
      "documentId=&operationName=test"
    );

    let mut ctx = get("documentId=app%2Fv1%2Ffirst&documentId=app%2Fv1%2Fsecond");
    let extracted = handler().try_extraction(&mut ctx).await.unwrap();
    assert_eq!(extracted.document_id, "app/v1/first");
  }

  #[tokio::test]
  async fn ignores_requests_without_document_id() {
    let mut ctx = get("query=query+%7B+__typename+%7D");

    assert!(handler().try_extraction(&mut ctx).await.is_none());
    assert_eq!(
      ctx.downstream_http_request.query_string,
      "query=query+%7B+__typename+%7D"
    );

    let mut ctx = RequestExecutionContext::new(ConductorHttpRequest {
      method: Method::POST,
      query_string: "documentId=app%2Fv1%2Fabc".to_string(),
      ..Default::default()
    });
    assert!(handler().try_extraction(&mut ctx).await.is_none());
  }

  #[test]
  fn prevents_mutations_over_get() {
    let mut ctx = get("");
    ctx.downstream_graphql_request = Some(
      ParsedGraphQLRequest::create_and_parse(GraphQLRequest {
        operation: "mutation { ping }".to_string(),
        ..Default::default()
      })
      .unwrap(),
    );

    let response = handler().should_prevent_execution(&ctx).unwrap();
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

    ctx.downstream_graphql_request = Some(
      ParsedGraphQLRequest::create_and_parse(GraphQLRequest::default()).unwrap(),
    );
    assert!(handler().should_prevent_execution(&ctx).is_none());
  }
}
