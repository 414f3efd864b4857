use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(
  Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
pub enum OperationKind {
  #[serde(rename = "query")]
  #[schemars(title = "query")]
  Query,
  #[serde(rename = "mutation")]
  #[schemars(title = "mutation")]
  Mutation,
  #[serde(rename = "subscription")]
  #[schemars(title = "subscription")]
  Subscription,
}

impl OperationKind {
  /// The root type name used when the schema has no `schema { ... }` definition.
  pub fn default_root_type_name(&self) -> &'static str {
    match self {
      OperationKind::Query => "Query",
      OperationKind::Mutation => "Mutation",
      OperationKind::Subscription => "Subscription",
    }
  }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct GatewayDirectivesPluginConfig {
  /// The root operation types whose fields are scanned for directives, and whose operations
  /// are dispatched to hooks. Defaults to `[mutation]`.
  #[serde(default = "default_operation_types")]
  pub operation_types: BTreeSet<OperationKind>,
}

impl Default for GatewayDirectivesPluginConfig {
  fn default() -> Self {
    Self {
      operation_types: default_operation_types(),
    }
  }
}

fn default_operation_types() -> BTreeSet<OperationKind> {
  BTreeSet::from([OperationKind::Mutation])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scans_mutations_by_default() {
    let config: GatewayDirectivesPluginConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(
      config.operation_types.into_iter().collect::<Vec<_>>(),
      vec![OperationKind::Mutation]
    );

    let config: GatewayDirectivesPluginConfig =
      serde_json::from_str(r#"{"operation_types": ["query", "subscription", "query"]}"#).unwrap();
    assert_eq!(config.operation_types.len(), 2);

    assert!(serde_json::from_str::<GatewayDirectivesPluginConfig>(
      r#"{"operation_types": ["fragment"]}"#
    )
    .is_err());
  }
}
