use std::fmt::Debug;

pub mod fs;
pub mod hive;

/// Resolves a document id into the GraphQL document text. `None` means the document is unknown,
/// or could not be resolved.
#[async_trait::async_trait(?Send)]
pub trait TrustedDocumentsStore: Sync + Send + Debug {
  async fn get_document(&self, document_id: &str) -> Option<String>;
}
