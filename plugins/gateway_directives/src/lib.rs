mod config;
mod dispatcher;
mod hooks;
mod index;
mod plugin;

pub use config::GatewayDirectivesPluginConfig as Config;
pub use config::{GatewayDirectivesPluginConfig, OperationKind};
pub use dispatcher::RequestDispatcher;
pub use hooks::{DirectiveHook, DirectiveHookError, HookTable};
pub use index::{DirectiveArguments, DirectiveIndex, DirectiveIndexError, FieldDirectives};
pub use plugin::GatewayDirectivesPlugin as Plugin;
pub use plugin::GatewayDirectivesPlugin;
