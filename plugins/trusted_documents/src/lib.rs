mod config;
mod fetch;
mod plugin;
mod protocols;
mod store;

pub use config::TrustedDocumentsPluginConfig as Config;
pub use config::TrustedDocumentsPluginStoreConfig as Store;
pub use config::TrustedDocumentsProtocolConfig as Protocol;
pub use config::{
  RetryConfig, TrustedDocumentsPluginConfig, TrustedDocumentsPluginStoreConfig,
  TrustedDocumentsProtocolConfig,
};
pub use fetch::{fetch_with_retry, FetchError, RetryPolicy};
pub use plugin::TrustedDocumentsPlugin as Plugin;
pub use plugin::{TrustedDocumentsPlugin, TrustedDocumentsPluginError};
pub use protocols::{ExtractedTrustedDocument, TrustedDocumentsProtocol};
pub use store::fs::TrustedDocumentsFilesystemStore;
pub use store::hive::{
  is_valid_document_id, CacheLookup, CachedDocument, HiveTrustedDocumentsStore,
  HIVE_CDN_KEY_HEADER,
};
pub use store::TrustedDocumentsStore;
