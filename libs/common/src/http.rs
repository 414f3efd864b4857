use std::collections::HashMap;

pub use bytes::Bytes;
use http::{HeaderMap, StatusCode as RawStatusCode};
use url::form_urlencoded;

pub use http::header;
pub use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
pub use http::Method;
pub use mime::{Mime, APPLICATION_JSON};
use serde::de::DeserializeOwned;
use serde_json::from_slice;
pub type StatusCode = RawStatusCode;
pub type HttpHeadersMap = HeaderMap<HeaderValue>;

#[derive(Debug, Clone)]
pub struct ConductorHttpRequest {
  pub headers: HeaderMap<HeaderValue>,
  pub method: Method,
  pub uri: String,
  pub query_string: String,
  pub body: Bytes,
}

#[cfg(feature = "test_utils")]
impl Default for ConductorHttpRequest {
  fn default() -> Self {
    Self {
      headers: HeaderMap::new(),
      method: Method::GET,
      uri: "/".to_string(),
      query_string: "".to_string(),
      body: serde_json::json!({
          "query": "query { __typename }",
      })
      .to_string()
      .into(),
    }
  }
}

impl ConductorHttpRequest {
  pub fn json_body<T>(&self) -> Result<T, serde_json::Error>
  where
    T: DeserializeOwned,
  {
    from_slice::<T>(&self.body)
  }
}

#[derive(Debug, Clone)]
pub struct ConductorHttpResponse {
  pub body: Bytes,
  pub status: StatusCode,
  pub headers: HeaderMap,
}

pub fn extract_header(headers_map: &HttpHeadersMap, header_name: &str) -> Option<String> {
  headers_map
    .get(header_name)
    .and_then(|value| value.to_str().ok())
    .map(ToString::to_string)
}

pub fn extract_accept(headers_map: &HeaderMap) -> Option<Mime> {
  extract_header(headers_map, ACCEPT.as_str())
    .and_then(|content_type| content_type.parse().ok())
}

/// Decodes an `application/x-www-form-urlencoded` query string. The leading `?` is optional.
/// When a parameter is repeated, the first occurrence wins.
pub fn parse_query_string(input: &str) -> HashMap<String, String> {
  let mut params = HashMap::new();

  for (key, value) in form_urlencoded::parse(input.trim_start_matches('?').as_bytes()).into_owned() {
    params.entry(key).or_insert(value);
  }

  params
}

/// Rebuilds a query string without the given parameters, keeping the order of the rest.
pub fn strip_query_params(input: &str, remove: &[&str]) -> String {
  let kept = form_urlencoded::parse(input.trim_start_matches('?').as_bytes())
    .into_owned()
    .filter(|(key, _)| !remove.contains(&key.as_str()));

  form_urlencoded::Serializer::new(String::new())
    .extend_pairs(kept)
    .finish()
}
