use std::sync::Arc;

use crate::{
  execute::RequestExecutionContext,
  graphql::ParsedGraphQLSchema,
  plugin::{CreatablePlugin, Plugin, PluginError},
};

/// Runs the registered plugins in registration order.
#[derive(Debug, Default)]
pub struct PluginManager {
  plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
  pub fn new_from_vec(plugins: Vec<Box<dyn Plugin>>) -> Self {
    Self { plugins }
  }

  pub async fn create_plugin<T: CreatablePlugin + 'static>(
    config: T::Config,
  ) -> Result<Box<dyn Plugin>, PluginError> {
    Ok(T::create(config).await? as Box<dyn Plugin>)
  }

  pub fn register_boxed_plugin(&mut self, plugin: Box<dyn Plugin>) {
    self.plugins.push(plugin);
  }

  pub fn register_plugin(&mut self, plugin: impl Plugin + 'static) {
    self.plugins.push(Box::new(plugin));
  }

  pub fn len(&self) -> usize {
    self.plugins.len()
  }

  pub fn is_empty(&self) -> bool {
    self.plugins.is_empty()
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn on_schema_load(&self, schema: &Arc<ParsedGraphQLSchema>) -> Result<(), PluginError> {
    for plugin in self.plugins.iter() {
      plugin.on_schema_load(schema).await?;
    }

    Ok(())
  }

  #[tracing::instrument(level = "debug", skip(self, context))]
  pub async fn on_downstream_http_request(&self, context: &mut RequestExecutionContext) {
    for plugin in self.plugins.iter() {
      plugin.on_downstream_http_request(context).await;

      if context.is_short_circuit() {
        return;
      }
    }
  }

  #[tracing::instrument(level = "debug", skip(self, context))]
  pub async fn on_downstream_graphql_request(&self, context: &mut RequestExecutionContext) {
    for plugin in self.plugins.iter() {
      plugin.on_downstream_graphql_request(context).await;

      if context.is_short_circuit() {
        return;
      }
    }
  }
}
