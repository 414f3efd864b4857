use std::sync::Arc;

use gateway_common::graphql::ParsedGraphQLDocument;
use graphql_parser::query::{Definition, OperationDefinition, Selection, SelectionSet};
use tracing::{debug, warn};

use crate::config::OperationKind;
use crate::hooks::{DirectiveHookError, HookTable};
use crate::index::DirectiveIndex;

/// Runs the hooks of the directives found on the root fields selected by a request.
///
/// Created per request from the index published at schema-load time; the dispatcher holds its
/// own `Arc`, so a schema reload during the request does not affect it.
pub struct RequestDispatcher<'h, C> {
  index: Arc<DirectiveIndex>,
  hooks: &'h HookTable<C>,
}

impl<'h, C> RequestDispatcher<'h, C> {
  pub fn new(index: Arc<DirectiveIndex>, hooks: &'h HookTable<C>) -> Self {
    Self { index, hooks }
  }

  /// Every operation of the document is walked, regardless of the requested operation name.
  /// Hooks are awaited one after the other, in field then directive order. The first failing
  /// hook stops the dispatch.
  #[tracing::instrument(level = "debug", skip_all, name = "RequestDispatcher::dispatch")]
  pub async fn dispatch(
    &self,
    document: &ParsedGraphQLDocument,
    context: &C,
  ) -> Result<(), DirectiveHookError> {
    for definition in &document.definitions {
      let (kind, selection_set) = match definition {
        Definition::Operation(operation) => operation_parts(operation),
        Definition::Fragment(_) => continue,
      };

      for selection in &selection_set.items {
        // fragments and nested selections are not inspected
        let field = match selection {
          Selection::Field(field) => field,
          _ => continue,
        };

        let directives = match self.index.field(kind, &field.name) {
          Some(directives) => directives,
          None => continue,
        };

        for (directive_name, arguments) in directives {
          let hook = match self.hooks.get(directive_name) {
            Some(hook) => hook,
            None => continue,
          };

          debug!(
            "running hook for directive @{} on field {:?}",
            directive_name, field.name
          );

          if let Err(e) = hook.call(arguments, context).await {
            warn!(
              "hook for directive @{} on field {:?} failed: {}",
              directive_name, field.name, e
            );

            return Err(e);
          }
        }
      }
    }

    Ok(())
  }
}

fn operation_parts<'a>(
  operation: &'a OperationDefinition<'static, String>,
) -> (OperationKind, &'a SelectionSet<'static, String>) {
  match operation {
    OperationDefinition::SelectionSet(selection_set) => (OperationKind::Query, selection_set),
    OperationDefinition::Query(query) => (OperationKind::Query, &query.selection_set),
    OperationDefinition::Mutation(mutation) => (OperationKind::Mutation, &mutation.selection_set),
    OperationDefinition::Subscription(subscription) => {
      (OperationKind::Subscription, &subscription.selection_set)
    }
  }
}
