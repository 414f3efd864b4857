use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{ExtractedTrustedDocument, TrustedDocumentsProtocol};
use gateway_common::execute::RequestExecutionContext;
use gateway_common::http::Method;

const PERSISTED_QUERY_EXTENSION: &str = "persistedQuery";

#[derive(Debug)]
pub struct DocumentIdTrustedDocumentsProtocol {
  pub field_name: String,
}

#[async_trait::async_trait(?Send)]
impl TrustedDocumentsProtocol for DocumentIdTrustedDocumentsProtocol {
  async fn try_extraction(
    &self,
    ctx: &mut RequestExecutionContext,
  ) -> Option<ExtractedTrustedDocument> {
    if ctx.downstream_http_request.method != Method::POST {
      return None;
    }

    debug!("request http method is post, trying to extract from body...");

    let mut root_object = match ctx
      .downstream_http_request
      .json_body::<Map<String, Value>>()
    {
      Ok(root_object) => root_object,
      Err(e) => {
        debug!("request body is not a JSON object: {}", e);
        return None;
      }
    };

    debug!(
      "found valid JSON body in request, trying to extract the document id using field_name: {}",
      self.field_name
    );

    let document_id = root_object
      .remove(self.field_name.as_str())
      .and_then(|v| v.as_str().map(ToString::to_string))
      .filter(|document_id| !document_id.is_empty())?;

    let extensions = match root_object.remove("extensions") {
      Some(Value::Object(mut extensions)) => {
        extensions.remove(PERSISTED_QUERY_EXTENSION);

        if extensions.is_empty() {
          None
        } else {
          root_object.insert("extensions".to_string(), Value::Object(extensions.clone()));
          Some(extensions)
        }
      }
      _ => None,
    };

    match serde_json::to_vec(&root_object) {
      Ok(body) => ctx.downstream_http_request.body = body.into(),
      Err(e) => warn!("failed to rewrite the request body: {}", e),
    }

    info!("successfully extracted incoming trusted document from request body");

    Some(ExtractedTrustedDocument {
      document_id,
      variables: root_object
        .get("variables")
        .and_then(|v| v.as_object())
        .cloned(),
      operation_name: root_object
        .get("operationName")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string()),
      extensions,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gateway_common::http::ConductorHttpRequest;
  use serde_json::json;

  fn protocol() -> DocumentIdTrustedDocumentsProtocol {
    DocumentIdTrustedDocumentsProtocol {
      field_name: "documentId".to_string(),
    }
  }

  fn post(body: Value) -> RequestExecutionContext {
    RequestExecutionContext::new(ConductorHttpRequest {
      method: Method::POST,
      body: body.to_string().into(),
      ..Default::default()
    })
  }

  #[tokio::test]
  async fn extracts_and_strips_document_id() {
    let mut ctx = post(json!({
      "documentId": "app/v1/abc",
      "operationName": "test",
      "variables": { "code": "AF" },
      "extensions": {
        "persistedQuery": { "version": 1, "sha256Hash": "abc" },
        "tracing": true
      }
    }));

    let extracted = protocol().try_extraction(&mut ctx).await.unwrap();

    assert_eq!(extracted.document_id, "app/v1/abc");
    assert_eq!(extracted.operation_name.as_deref(), Some("test"));
    assert_eq!(extracted.variables.unwrap().get("code"), Some(&json!("AF")));
    assert_eq!(
      extracted.extensions.unwrap(),
      json!({ "tracing": true }).as_object().unwrap().clone()
    );

    let forwarded: Value = ctx.downstream_http_request.json_body().unwrap();
    assert_eq!(
      forwarded,
      json!({
        "operationName": "test",
        "variables": { "code": "AF" },
        "extensions": { "tracing": true }
      })
    );
  }

  #[tokio::test]
  async fn empty_document_id_is_not_extracted() {
    let mut ctx = post(json!({ "documentId": "", "query": "{ __typename }" }));

    assert!(protocol().try_extraction(&mut ctx).await.is_none());
    // the body is left untouched
    let forwarded: Value = ctx.downstream_http_request.json_body().unwrap();
    assert_eq!(forwarded, json!({ "documentId": "", "query": "{ __typename }" }));
  }

  #[tokio::test]
  async fn drops_extensions_left_empty() {
    let mut ctx = post(json!({
      "documentId": "app/v1/abc",
      "extensions": { "persistedQuery": { "version": 1 } }
    }));

    let extracted = protocol().try_extraction(&mut ctx).await.unwrap();

    assert!(extracted.extensions.is_none());
    assert_eq!(
      ctx.downstream_http_request.json_body::<Value>().unwrap(),
      json!({})
    );
  }

  #[tokio::test]
  async fn ignores_requests_without_document_id() {
    let body = json!({ "query": "query { __typename }" });
    let mut ctx = post(body.clone());

    assert!(protocol().try_extraction(&mut ctx).await.is_none());
    assert_eq!(
      ctx.downstream_http_request.json_body::<Value>().unwrap(),
      body
    );

    let mut ctx = post(json!({ "documentId": 42 }));
    assert!(protocol().try_extraction(&mut ctx).await.is_none());
  }

  #[tokio::test]
  async fn ignores_other_methods_and_invalid_bodies() {
    let mut ctx = RequestExecutionContext::new(ConductorHttpRequest {
      method: Method::GET,
      body: json!({ "documentId": "app/v1/abc" }).to_string().into(),
      ..Default::default()
    });
    assert!(protocol().try_extraction(&mut ctx).await.is_none());

    let mut ctx = RequestExecutionContext::new(ConductorHttpRequest {
      method: Method::POST,
      body: "not json".into(),
      ..Default::default()
    });
    assert!(protocol().try_extraction(&mut ctx).await.is_none());
  }

  #[tokio::test]
  async fn custom_field_name() {
    let protocol = DocumentIdTrustedDocumentsProtocol {
      field_name: "doc_id".to_string(),
    };
    let mut ctx = post(json!({ "doc_id": "app/v1/abc", "documentId": "other/v1/abc" }));

    let extracted = protocol.try_extraction(&mut ctx).await.unwrap();
    assert_eq!(extracted.document_id, "app/v1/abc");
  }
}
