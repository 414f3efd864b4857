use std::{fmt::Debug, sync::Arc};

use crate::execute::RequestExecutionContext;
use crate::graphql::ParsedGraphQLSchema;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
  #[error("Plugin init error: {source}")]
  InitError { source: anyhow::Error },
  #[error("Plugin failed to process the loaded schema: {source}")]
  SchemaLoadError { source: anyhow::Error },
}

#[async_trait::async_trait(?Send)]
pub trait CreatablePlugin: Plugin {
  type Config;

  async fn create(config: Self::Config) -> Result<Box<Self>, PluginError>;
}

#[async_trait::async_trait(?Send)]
pub trait Plugin: Sync + Send + Debug {
  // Called once per schema load or reload, before any request runs against it.
  async fn on_schema_load(&self, _schema: &Arc<ParsedGraphQLSchema>) -> Result<(), PluginError> {
    Ok(())
  }
  // From: on_downstream_http_request -> on_downstream_graphql_request
  // Step 1: An HTTP request send from the client to the gateway
  async fn on_downstream_http_request(&self, _ctx: &mut RequestExecutionContext) {}
  // Step 2: The incoming GraphQL operation was resolved and parsed
  async fn on_downstream_graphql_request(&self, _ctx: &mut RequestExecutionContext) {}
}
