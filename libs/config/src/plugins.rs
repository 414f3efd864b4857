use gateway_cache::CacheManager;
use gateway_common::{
  plugin::{Plugin, PluginError},
  plugin_manager::PluginManager,
};
use tracing::debug;
use trusted_documents_plugin::TrustedDocumentsPlugin;

use crate::PluginDefinition;

/// Creates the enabled plugins, in the order they are defined.
///
/// Directive hooks are code, not config: a `gateway_directives` plugin created here starts with
/// an empty hook table, so embedders that register hooks construct
/// [`gateway_directives_plugin::GatewayDirectivesPlugin::new`] themselves.
pub async fn create_plugin_manager(
  definitions: &[PluginDefinition],
  cache_manager: &CacheManager,
) -> Result<PluginManager, PluginError> {
  let mut manager = PluginManager::default();

  for definition in definitions {
    if !definition.is_enabled() {
      debug!("skipping disabled plugin {:?}", definition);
      continue;
    }

    let plugin: Box<dyn Plugin> = match definition {
      PluginDefinition::TrustedDocumentsPlugin { config, .. } => Box::new(
        TrustedDocumentsPlugin::new_with_cache_manager(config.clone(), cache_manager)?,
      ),
      PluginDefinition::GatewayDirectivesPlugin { config, .. } => {
        PluginManager::create_plugin::<gateway_directives_plugin::Plugin>(config.clone()).await?
      }
    };

    manager.register_boxed_plugin(plugin);
  }

  Ok(manager)
}
