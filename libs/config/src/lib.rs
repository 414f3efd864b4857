pub mod interpolate;
pub mod plugins;

use gateway_cache::CacheStoreConfig;
use gateway_common::serde_utils::BASE_PATH;
use gateway_logger::LoggerConfig;
use interpolate::{interpolate, EnvVarsSource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};
use tracing::{error, warn};

/// The top-level configuration object of the gateway plugins.
///
/// Both YAML (`.yaml` / `.yml`) and JSON (`.json`) files are supported. Before parsing, the
/// raw file contents go through environment variable interpolation (`${VAR}`, `${VAR:-default}`,
/// `${VAR:?error}`), so secrets such as the Hive CDN access token can stay out of the file.
///
/// Relative file paths inside the config (for example the `file` trusted documents store) are
/// resolved against the directory of the config file.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, Default)]
pub struct GatewayConfig {
  /// Logger configuration.
  #[serde(default)]
  pub logger: LoggerConfig,
  /// Cache stores that can be referenced by id from plugins.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub cache_stores: Vec<CacheStoreConfig>,
  /// Plugins to run, in order.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub plugins: Vec<PluginDefinition>,
}

fn default_plugin_enabled() -> Option<bool> {
  Some(true)
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum PluginDefinition {
  /// Resolves document ids into full GraphQL documents.
  #[serde(rename = "trusted_documents")]
  TrustedDocumentsPlugin {
    #[serde(
      default = "default_plugin_enabled",
      skip_serializing_if = "Option::is_none"
    )]
    enabled: Option<bool>,
    config: trusted_documents_plugin::Config,
  },

  /// Runs registered hooks for directives found on root operation fields.
  #[serde(rename = "gateway_directives")]
  GatewayDirectivesPlugin {
    #[serde(
      default = "default_plugin_enabled",
      skip_serializing_if = "Option::is_none"
    )]
    enabled: Option<bool>,
    #[serde(default)]
    config: gateway_directives_plugin::Config,
  },
}

impl PluginDefinition {
  pub fn is_enabled(&self) -> bool {
    let enabled = match self {
      PluginDefinition::TrustedDocumentsPlugin { enabled, .. } => enabled,
      PluginDefinition::GatewayDirectivesPlugin { enabled, .. } => enabled,
    };

    enabled.unwrap_or(true)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config file \"{path}\": {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("config file \"{0}\" has an unsupported extension, expected .json, .yaml or .yml")]
  UnsupportedFormat(String),
  #[error("failed to interpolate config file: {}", .0.join(", "))]
  Interpolation(Vec<String>),
  #[error("failed to parse JSON config file: {0}")]
  Json(#[from] serde_json::Error),
  #[error("failed to parse YAML config file: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

#[tracing::instrument(level = "trace", skip(get_env_value))]
pub fn load_config(
  file_path: &str,
  get_env_value: impl EnvVarsSource,
) -> Result<GatewayConfig, ConfigError> {
  let path = Path::new(file_path);
  let format = ConfigFormat::from_path(path)?;

  let raw_contents = read_to_string(path).map_err(|source| ConfigError::Read {
    path: file_path.to_string(),
    source,
  })?;

  let base_path = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
  BASE_PATH.with(|bp| {
    *bp.borrow_mut() = base_path;
  });

  parse_config_contents(raw_contents, format, get_env_value)
}

pub fn parse_config_contents(
  contents: String,
  format: ConfigFormat,
  get_env_value: impl EnvVarsSource,
) -> Result<GatewayConfig, ConfigError> {
  let config_string = match interpolate(&contents, get_env_value) {
    Ok((interpolated_content, warnings)) => {
      for warning in warnings {
        warn!("{}", warning);
      }

      interpolated_content
    }
    Err(errors) => {
      for error in &errors {
        error!("{}", error);
      }

      return Err(ConfigError::Interpolation(errors));
    }
  };

  match format {
    ConfigFormat::Json => Ok(serde_json::from_str::<GatewayConfig>(&config_string)?),
    ConfigFormat::Yaml => Ok(serde_yaml::from_str::<GatewayConfig>(&config_string)?),
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
  Json,
  Yaml,
}

impl ConfigFormat {
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("json") => Ok(ConfigFormat::Json),
      Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
      _ => Err(ConfigError::UnsupportedFormat(
        path.to_string_lossy().into_owned(),
      )),
    }
  }
}
