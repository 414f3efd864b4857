use std::cmp::min;
use std::time::Duration;

use gateway_common::http::{HttpHeadersMap, StatusCode};
use gateway_common::http_client::TracedHttpClient;
use reqwest::Response;
use tracing::{debug, warn};

/// Bounded exponential backoff: the delay starts at `initial_delay`, doubles after every
/// failed attempt and never exceeds `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub initial_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      initial_delay: Duration::from_millis(100),
      max_delay: Duration::from_secs(1),
    }
  }
}

impl RetryPolicy {
  pub fn next_delay(&self, current: Duration) -> Duration {
    min(current.saturating_mul(2), self.max_delay)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  #[error("network error: {0}")]
  Network(#[from] reqwest_middleware::Error),
  #[error("unexpected response status: {0}")]
  UnexpectedStatus(StatusCode),
}

/// Sends a `GET` request, retrying failed attempts (network errors and non-2xx responses)
/// according to `policy`. At most `policy.max_retries + 1` requests are sent; when all of them
/// fail, the last failure is returned.
#[tracing::instrument(level = "debug", skip(client, headers, policy))]
pub async fn fetch_with_retry(
  client: &TracedHttpClient,
  url: &str,
  headers: &HttpHeadersMap,
  policy: &RetryPolicy,
) -> Result<Response, FetchError> {
  let mut delay = min(policy.initial_delay, policy.max_delay);
  let mut attempt: u32 = 0;

  loop {
    let error = match client.get(url).headers(headers.clone()).send().await {
      Ok(response) if response.status().is_success() => {
        debug!("fetch succeeded after {} attempt(s)", attempt + 1);

        return Ok(response);
      }
      Ok(response) => FetchError::UnexpectedStatus(response.status()),
      Err(e) => FetchError::Network(e),
    };

    if attempt >= policy.max_retries {
      warn!(
        "fetch failed after {} attempt(s), giving up: {}",
        attempt + 1,
        error
      );

      return Err(error);
    }

    debug!(
      "fetch attempt {} failed ({}), retrying in {:?}",
      attempt + 1,
      error,
      delay
    );

    tokio::time::sleep(delay).await;
    delay = policy.next_delay(delay);
    attempt += 1;
  }
}
