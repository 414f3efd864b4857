use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::index::DirectiveArguments;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct DirectiveHookError {
  pub message: String,
}

impl DirectiveHookError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Handler invoked when a field carrying the directive it is registered for is selected.
/// `C` is the per-request context value handed over by the caller.
#[async_trait::async_trait(?Send)]
pub trait DirectiveHook<C>: Send + Sync {
  async fn call(&self, arguments: &DirectiveArguments, context: &C)
    -> Result<(), DirectiveHookError>;
}

/// Directive name to hook. Built once, before the plugin starts serving requests.
pub struct HookTable<C> {
  hooks: HashMap<String, Arc<dyn DirectiveHook<C>>>,
}

impl<C> HookTable<C> {
  pub fn new() -> Self {
    Self {
      hooks: HashMap::new(),
    }
  }

  /// Registers `hook` for `directive_name`, replacing any previous one.
  pub fn with_hook(
    mut self,
    directive_name: impl Into<String>,
    hook: impl DirectiveHook<C> + 'static,
  ) -> Self {
    self.hooks.insert(directive_name.into(), Arc::new(hook));
    self
  }

  pub fn get(&self, directive_name: &str) -> Option<&Arc<dyn DirectiveHook<C>>> {
    self.hooks.get(directive_name)
  }

  pub fn contains(&self, directive_name: &str) -> bool {
    self.hooks.contains_key(directive_name)
  }

  pub fn names(&self) -> Vec<&str> {
    self.hooks.keys().map(String::as_str).collect()
  }

  pub fn len(&self) -> usize {
    self.hooks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.hooks.is_empty()
  }
}

impl<C> Default for HookTable<C> {
  fn default() -> Self {
    Self::new()
  }
}

impl<C> Clone for HookTable<C> {
  fn clone(&self) -> Self {
    Self {
      hooks: self.hooks.clone(),
    }
  }
}

impl<C> fmt::Debug for HookTable<C> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut names = self.names();
    names.sort_unstable();

    f.debug_struct("HookTable").field("hooks", &names).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Noop;

  #[async_trait::async_trait(?Send)]
  impl DirectiveHook<()> for Noop {
    async fn call(&self, _: &DirectiveArguments, _: &()) -> Result<(), DirectiveHookError> {
      Ok(())
    }
  }

  struct Fails;

  #[async_trait::async_trait(?Send)]
  impl DirectiveHook<()> for Fails {
    async fn call(&self, _: &DirectiveArguments, _: &()) -> Result<(), DirectiveHookError> {
      Err(DirectiveHookError::new("nope"))
    }
  }

  #[tokio::test]
  async fn later_registration_replaces_earlier() {
    let table = HookTable::<()>::new()
      .with_hook("audit", Fails)
      .with_hook("rateLimit", Noop)
      .with_hook("audit", Noop);

    assert_eq!(table.len(), 2);
    assert!(table.contains("audit"));
    assert!(!table.contains("unknown"));
    assert_eq!(format!("{:?}", table), r#"HookTable { hooks: ["audit", "rateLimit"] }"#);

    let hook = table.get("audit").unwrap();
    assert!(hook.call(&DirectiveArguments::new(), &()).await.is_ok());
  }

  #[test]
  fn empty_table() {
    let table = HookTable::<()>::default();
    assert!(table.is_empty());
    assert!(table.names().is_empty());
  }
}
