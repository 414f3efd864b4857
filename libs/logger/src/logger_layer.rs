use crate::config::{LoggerConfig, LoggerConfigFormat};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;
use tracing_subscriber::{
  fmt::{self, time::UtcTime},
  Layer,
};

#[derive(Debug, thiserror::Error)]
pub enum LoggerInitError {
  #[error("invalid logger filter: {0}")]
  InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
  #[error("failed to install the global logger: {0}")]
  AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

pub fn build_logger(
  format: &LoggerConfigFormat,
  filter: &str,
  print_performance_info: bool,
) -> Result<Box<dyn Layer<Registry> + Send + Sync>, tracing_subscriber::filter::ParseError> {
  let timer = UtcTime::rfc_3339();
  let filter = EnvFilter::try_new(filter)?;
  let performance_spans = match print_performance_info {
    true => fmt::format::FmtSpan::CLOSE,
    false => fmt::format::FmtSpan::NONE,
  };

  Ok(match format {
    LoggerConfigFormat::Json => fmt::Layer::<Registry>::default()
      .json()
      .with_timer(timer)
      .with_span_events(performance_spans)
      .with_filter(filter)
      .boxed(),
    LoggerConfigFormat::Pretty => fmt::Layer::<Registry>::default()
      .pretty()
      .with_timer(timer)
      .with_span_events(performance_spans)
      .with_filter(filter)
      .boxed(),
    LoggerConfigFormat::Compact => fmt::Layer::<Registry>::default()
      .compact()
      .with_timer(timer)
      .with_span_events(performance_spans)
      .with_filter(filter)
      .boxed(),
  })
}

/// Installs the logger as the global default subscriber.
pub fn init_logger(config: &LoggerConfig) -> Result<(), LoggerInitError> {
  let layer = build_logger(
    &config.format,
    &config.filter,
    config.print_performance_info,
  )?;

  tracing_subscriber::registry().with(layer).try_init()?;

  Ok(())
}
