use std::time::{Duration, Instant};

use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next, Result};
use tracing::{debug, warn};

pub type TracedHttpClient = ClientWithMiddleware;

pub fn create_http_client() -> reqwest::ClientBuilder {
  reqwest::Client::builder()
    .connect_timeout(Duration::from_secs(10))
    .tcp_keepalive(Duration::from_secs(120))
}

/// Logs every outgoing request together with its outcome and latency.
#[derive(Debug)]
pub struct TracingReqwestMiddleware;

#[async_trait::async_trait]
impl Middleware for TracingReqwestMiddleware {
  async fn handle(
    &self,
    req: Request,
    extensions: &mut http::Extensions,
    next: Next<'_>,
  ) -> Result<Response> {
    let method = req.method().clone();
    let url = req.url().clone();
    let started = Instant::now();

    let response = next.run(req, extensions).await;
    let elapsed = started.elapsed();

    match &response {
      Ok(res) if res.status().is_success() => debug!(
        "upstream http call {} {} finished with status {} in {:?}",
        method,
        url,
        res.status(),
        elapsed
      ),
      Ok(res) => warn!(
        "upstream http call {} {} finished with status {} in {:?}",
        method,
        url,
        res.status(),
        elapsed
      ),
      Err(e) => warn!(
        "upstream http call {} {} failed after {:?}: {}",
        method, url, elapsed, e
      ),
    }

    response
  }
}

pub fn traced_reqwest(raw_client: reqwest::Client) -> TracedHttpClient {
  ClientBuilder::new(raw_client)
    .with(TracingReqwestMiddleware)
    .build()
}
