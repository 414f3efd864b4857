use std::sync::{Arc, PoisonError, RwLock};

use gateway_common::{
  execute::RequestExecutionContext,
  graphql::{GraphQLResponse, ParsedGraphQLSchema},
  http::StatusCode,
  plugin::{CreatablePlugin, Plugin, PluginError},
};
use tracing::{debug, info, warn};

use crate::config::GatewayDirectivesPluginConfig;
use crate::dispatcher::RequestDispatcher;
use crate::hooks::HookTable;
use crate::index::DirectiveIndex;

#[derive(Debug)]
pub struct GatewayDirectivesPlugin {
  config: GatewayDirectivesPluginConfig,
  hooks: HookTable<RequestExecutionContext>,
  index: RwLock<Arc<DirectiveIndex>>,
}

#[async_trait::async_trait(?Send)]
impl CreatablePlugin for GatewayDirectivesPlugin {
  type Config = GatewayDirectivesPluginConfig;

  /// Creates the plugin with an empty hook table. Hooks are code, use
  /// [`GatewayDirectivesPlugin::new`] to register them.
  async fn create(config: Self::Config) -> Result<Box<Self>, PluginError> {
    Ok(Box::new(Self::new(config, HookTable::new())))
  }
}

impl GatewayDirectivesPlugin {
  pub fn new(
    config: GatewayDirectivesPluginConfig,
    hooks: HookTable<RequestExecutionContext>,
  ) -> Self {
    debug!(
      "creating gateway directives plugin with hooks {:?} on {:?}",
      hooks, config.operation_types
    );

    Self {
      config,
      hooks,
      index: RwLock::new(Arc::new(DirectiveIndex::default())),
    }
  }

  /// The index built from the last loaded schema.
  pub fn index(&self) -> Arc<DirectiveIndex> {
    self
      .index
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

#[async_trait::async_trait(?Send)]
impl Plugin for GatewayDirectivesPlugin {
  async fn on_schema_load(&self, schema: &Arc<ParsedGraphQLSchema>) -> Result<(), PluginError> {
    let index = DirectiveIndex::build(schema, &self.hooks.names(), &self.config.operation_types)
      .map_err(|e| PluginError::SchemaLoadError { source: e.into() })?;

    info!(
      "loaded gateway directives for {} root field(s)",
      index.len()
    );

    *self.index.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(index);

    Ok(())
  }

  async fn on_downstream_graphql_request(&self, ctx: &mut RequestExecutionContext) {
    let index = self.index();

    if index.is_empty() {
      return;
    }

    let result = match &ctx.downstream_graphql_request {
      Some(gql_req) => {
        RequestDispatcher::new(index, &self.hooks)
          .dispatch(&gql_req.parsed_operation, &*ctx)
          .await
      }
      None => return,
    };

    if let Err(e) = result {
      warn!("directive hook rejected the request: {}", e);

      ctx.short_circuit(
        GraphQLResponse::new_error(&e.message)
          .into_with_status_code(StatusCode::INTERNAL_SERVER_ERROR),
      );
    }
  }
}
