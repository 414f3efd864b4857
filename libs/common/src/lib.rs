pub mod execute;
pub mod graphql;
pub mod http;
pub mod http_client;
pub mod plugin;
pub mod plugin_manager;
pub mod serde_utils;
