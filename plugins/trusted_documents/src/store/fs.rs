use std::collections::HashMap;
use tracing::{debug, info};

use super::TrustedDocumentsStore;

/// Documents loaded once from a JSON map of `{"<documentId>": "<document>"}`.
#[derive(Debug)]
pub struct TrustedDocumentsFilesystemStore {
  known_documents: HashMap<String, String>,
}

#[async_trait::async_trait(?Send)]
impl TrustedDocumentsStore for TrustedDocumentsFilesystemStore {
  async fn get_document(&self, document_id: &str) -> Option<String> {
    self.known_documents.get(document_id).cloned()
  }
}

impl TrustedDocumentsFilesystemStore {
  pub fn new_from_file_contents(contents: &str) -> Result<Self, serde_json::Error> {
    debug!("creating trusted documents store from a local key/value file");

    let known_documents: HashMap<String, String> = serde_json::from_str(contents)?;

    info!(
      "loaded trusted documents store from file, total records: {}",
      known_documents.len()
    );

    Ok(Self { known_documents })
  }

  pub fn len(&self) -> usize {
    self.known_documents.len()
  }

  pub fn is_empty(&self) -> bool {
    self.known_documents.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn loads_json_key_value_file() {
    let store = TrustedDocumentsFilesystemStore::new_from_file_contents(
      &serde_json::json!({
          "app/v1/abc": "query { __typename }",
          "app/v1/def": "mutation { ping }"
      })
      .to_string(),
    )
    .unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(
      store.get_document("app/v1/abc").await,
      Some("query { __typename }".to_string())
    );
    assert_eq!(store.get_document("app/v1/zzz").await, None);
  }

  #[test]
  fn rejects_invalid_files() {
    let store =
      TrustedDocumentsFilesystemStore::new_from_file_contents(&serde_json::json!({}).to_string())
        .unwrap();
    assert!(store.is_empty());

    // not a map
    assert!(
      TrustedDocumentsFilesystemStore::new_from_file_contents(&serde_json::json!([]).to_string())
        .is_err()
    );
    // values must be strings
    assert!(TrustedDocumentsFilesystemStore::new_from_file_contents(
      &serde_json::json!({ "a/b/c": 1 }).to_string()
    )
    .is_err());
    assert!(TrustedDocumentsFilesystemStore::new_from_file_contents("{").is_err());
  }
}
