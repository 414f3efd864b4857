use bytes::Bytes;
use graphql_parser::{
  parse_query, parse_schema,
  query::{Definition, Document, OperationDefinition, ParseError},
  schema::{Document as SchemaDocument, ParseError as SchemaParseError},
};
use mime::{Mime, APPLICATION_JSON};
use serde::{Deserialize, Serialize};
use serde_json::{Error as SerdeError, Map, Value};

use crate::http::{
  parse_query_string, ConductorHttpRequest, ConductorHttpResponse, Method, StatusCode,
};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GraphQLRequest {
  // The GraphQL operation, as string
  #[serde(rename = "query")]
  pub operation: String,
  // The operation name, if specified
  #[serde(rename = "operationName")]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub operation_name: Option<String>,
  // GraphQL operation variables, in JSON format
  pub variables: Option<Map<String, Value>>,
  // GraphQL execution extensions, in JSON format
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Map<String, Value>>,
}

#[cfg(feature = "test_utils")]
impl Default for GraphQLRequest {
  fn default() -> Self {
    GraphQLRequest {
      operation: "query { __typename }".to_string(),
      operation_name: None,
      variables: None,
      extensions: None,
    }
  }
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractGraphQLOperationError {
  #[error("invalid body json format")]
  InvalidBodyJsonFormat(SerdeError),
  #[error("invalid variables json format")]
  InvalidVariablesJsonFormat(SerdeError),
  #[error("failed to parse GraphQL operation")]
  GraphQLParserError(ParseError),
  #[error("serialization error")]
  SerializationError(SerdeError),
}

impl ExtractGraphQLOperationError {
  pub fn into_response(&self, accept: Option<Mime>) -> ConductorHttpResponse {
    let status = match (&self, accept) {
      (_, None) => StatusCode::OK,
      (ExtractGraphQLOperationError::GraphQLParserError(_), Some(accept))
        if accept == APPLICATION_JSON =>
      {
        StatusCode::OK
      }
      _ => StatusCode::BAD_REQUEST,
    };

    GraphQLResponse::new_error(self.to_string().as_str()).into_with_status_code(status)
  }
}

impl From<&GraphQLRequest> for Bytes {
  fn from(request: &GraphQLRequest) -> Self {
    serde_json::to_vec(&request)
      .unwrap_or_else(|e| {
        ExtractGraphQLOperationError::SerializationError(e)
          .to_string()
          .into_bytes()
      })
      .into()
  }
}

/// An error with a message and optional extensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQLError {
  /// The error message.
  pub message: String,
  /// Extensions to the error.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Map<String, Value>>,
}

impl GraphQLError {
  pub fn new(message: &str) -> Self {
    GraphQLError {
      message: message.to_string(),
      extensions: None,
    }
  }
}

pub type ParsedGraphQLDocument = Document<'static, String>;
pub type ParsedGraphQLSchema = SchemaDocument<'static, String>;

#[derive(Debug)]
pub struct ParsedGraphQLRequest {
  pub request: GraphQLRequest,
  pub parsed_operation: ParsedGraphQLDocument,
}

impl ParsedGraphQLRequest {
  #[tracing::instrument(level = "trace", name = "graphql_parse", skip_all)]
  pub fn create_and_parse(raw_request: GraphQLRequest) -> Result<Self, ParseError> {
    parse_graphql_operation(&raw_request.operation).map(|parsed_operation| ParsedGraphQLRequest {
      request: raw_request,
      parsed_operation,
    })
  }

  #[tracing::instrument(
    level = "trace",
    name = "ParsedGraphQLRequest::is_running_mutation",
    skip_all
  )]
  pub fn is_running_mutation(&self) -> bool {
    self.parsed_operation.definitions.iter().any(|definition| {
      matches!(
        definition,
        Definition::Operation(OperationDefinition::Mutation(_))
      )
    })
  }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GraphQLResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub errors: Option<Vec<GraphQLError>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Value>,
}

impl GraphQLResponse {
  pub fn new_error(error: &str) -> Self {
    GraphQLResponse {
      data: None,
      errors: Some(vec![GraphQLError::new(error)]),
      extensions: None,
    }
  }

  pub fn into_with_status_code(self, code: StatusCode) -> ConductorHttpResponse {
    ConductorHttpResponse {
      body: self.into(),
      status: code,
      headers: Default::default(),
    }
  }
}

impl From<GraphQLResponse> for Bytes {
  fn from(response: GraphQLResponse) -> Self {
    serde_json::to_vec(&response)
      .unwrap_or_else(|e| {
        ExtractGraphQLOperationError::SerializationError(e)
          .to_string()
          .into_bytes()
      })
      .into()
  }
}

pub fn parse_graphql_operation(operation_str: &str) -> Result<ParsedGraphQLDocument, ParseError> {
  parse_query::<String>(operation_str).map(|v| v.into_static())
}

pub fn parse_graphql_schema(sdl: &str) -> Result<ParsedGraphQLSchema, SchemaParseError> {
  parse_schema::<String>(sdl).map(|v| v.into_static())
}

/// Reads a regular GraphQL request: the JSON body of a `POST`, or the `query`, `operationName`
/// and `variables` parameters of a `GET` query string.
pub fn extract_graphql_request(
  request: &ConductorHttpRequest,
) -> Result<ParsedGraphQLRequest, ExtractGraphQLOperationError> {
  let raw_request = if request.method == Method::GET {
    let params = parse_query_string(&request.query_string);

    let variables = match params.get("variables") {
      Some(v) => Some(
        serde_json::from_str::<Map<String, Value>>(v)
          .map_err(ExtractGraphQLOperationError::InvalidVariablesJsonFormat)?,
      ),
      None => None,
    };

    GraphQLRequest {
      operation: params.get("query").cloned().unwrap_or_default(),
      operation_name: params.get("operationName").cloned(),
      variables,
      extensions: None,
    }
  } else {
    request
      .json_body::<GraphQLRequest>()
      .map_err(ExtractGraphQLOperationError::InvalidBodyJsonFormat)?
  };

  ParsedGraphQLRequest::create_and_parse(raw_request)
    .map_err(ExtractGraphQLOperationError::GraphQLParserError)
}
