use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq)]
pub enum LoggerConfigFormat {
  /// Minimal, compact output. Suitable for production environments where log size matters.
  #[serde(rename = "compact")]
  #[schemars(title = "compact")]
  Compact,
  /// Verbose, human-readable output with well-formatted fields. Ideal for development.
  #[serde(rename = "pretty")]
  #[schemars(title = "pretty")]
  Pretty,
  /// One JSON object per line, for log aggregators and analysis systems.
  #[serde(rename = "json")]
  #[schemars(title = "json")]
  Json,
}

impl Default for LoggerConfigFormat {
  // In development, we wish to see some more details and code locations.
  #[cfg(debug_assertions)]
  fn default() -> Self {
    LoggerConfigFormat::Pretty
  }

  #[cfg(not(debug_assertions))]
  fn default() -> Self {
    if atty::is(atty::Stream::Stdout) {
      LoggerConfigFormat::Compact
    } else {
      LoggerConfigFormat::Json
    }
  }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct LoggerConfig {
  /// Environment filter directives, for example `info` or
  /// `trusted_documents_plugin=debug,gateway_directives_plugin=trace`.
  ///
  /// See [tracing_subscriber::EnvFilter](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html) for the syntax.
  #[serde(default = "default_log_filter")]
  pub filter: String,
  /// The logger output format. Defaults to `pretty` in debug builds, `compact` on a TTY and `json` otherwise.
  #[serde(default)]
  pub format: LoggerConfigFormat,
  /// Emits span close events, including the time spent in hooks, store lookups and fetches.
  #[serde(default)]
  pub print_performance_info: bool,
}

impl Default for LoggerConfig {
  fn default() -> Self {
    Self {
      filter: default_log_filter(),
      format: LoggerConfigFormat::default(),
      print_performance_info: false,
    }
  }
}

fn default_log_filter() -> String {
  "info".to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn logger_config_defaults() {
    let config: LoggerConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.filter, "info");
    assert!(!config.print_performance_info);

    let config: LoggerConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
    assert_eq!(config.format, LoggerConfigFormat::Json);
  }
}
