use std::io::Write;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::config::{Config, Env};

pub fn build_prometheus() -> Result<PrometheusHandle, BuildError> {
  let builder = PrometheusBuilder::new()
    .add_global_label("service", "termbridge")
    .set_buckets_for_metric(Matcher::Full("termbridge_similarity_scores".into()), &[0.2, 0.4, 0.6, 0.8, 0.9])?;

  builder.install_recorder()
}

pub struct TraceGuards {
  _logging: WorkerGuard,
}

pub fn init_tracing(config: &Config, writer: impl Write + Send + 'static) -> TraceGuards {
  let (appender, logging_guard) = tracing_appender::non_blocking(writer);

  let logging_formatter = match config.env {
    #[cfg(not(test))]
    Env::Dev => fmt::layer().compact().with_writer(appender).with_ansi(true).boxed(),
    Env::Production => json_subscriber::layer()
      .with_writer(appender)
      .flatten_event(true)
      .flatten_span_list_on_top_level(true)
      .with_current_span(false)
      .with_span_list(false)
      .boxed(),

    #[cfg(test)]
    Env::Dev => fmt::layer().compact().with_writer(appender).with_ansi(false).boxed(),
  };

  let filter = EnvFilter::builder().try_from_env().unwrap_or_else(|_| EnvFilter::new("info"));

  // A global subscriber can only be installed once per process.
  if let Err(err) = tracing_subscriber::registry().with(filter.and_then(logging_formatter)).try_init() {
    eprintln!("could not initialize logging: {err}");
  }

  TraceGuards { _logging: logging_guard }
}
