use std::sync::Once;

use derive_more::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::Layer, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "warn";
const QUIET_TRANSPORT: [&str; 4] = ["hyper=off", "hyper_util=off", "reqwest=warn", "alloy_transport_http=warn"];

#[derive(Debug, Clone, PartialEq, FromStr)]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    format: LogFormat,
    with_thread_names: bool,
    test_writer: bool,
}

impl LoggingConfig {
    /// Plain output captured by the test harness.
    pub fn default_for_test() -> Self {
        Self {
            test_writer: true,
            ..Self::default()
        }
    }

    pub fn use_format(mut self, value: LogFormat) -> Self {
        self.format = value;
        self
    }

    pub fn with_thread_names(mut self, value: bool) -> Self {
        self.with_thread_names = value;
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plain,
            with_thread_names: false,
            test_writer: false,
        }
    }
}

fn env_filter() -> EnvFilter {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    QUIET_TRANSPORT
        .into_iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(filter, |filter, directive| filter.add_directive(directive))
}

/// Installs the global subscriber on first call. Diagnostics go to stderr; stdout is reserved for script output.
pub fn setup_logger(config: LoggingConfig) {
    INIT.call_once(|| {
        let layer = match (config.format, config.test_writer) {
            (_, true) => tracing_subscriber::fmt::layer().compact().with_test_writer().boxed(),
            (LogFormat::Json, false) => json_subscriber::layer()
                .with_target(true)
                .with_thread_names(config.with_thread_names)
                .with_current_span(false)
                .with_span_list(false)
                .flatten_span_list_on_top_level(true)
                .flatten_event(true)
                .with_writer(std::io::stderr)
                .boxed(),
            (LogFormat::Plain, false) => tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_names(config.with_thread_names)
                .with_writer(std::io::stderr)
                .boxed(),
        };

        Registry::default().with(env_filter()).with(layer).init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_variant_names() {
        assert_eq!("Json".parse::<LogFormat>().ok(), Some(LogFormat::Json));
        assert_eq!("plain".parse::<LogFormat>().ok(), Some(LogFormat::Plain));
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn transport_directives_parse() {
        assert!(QUIET_TRANSPORT.iter().all(|d| d.parse::<Directive>().is_ok()));
    }

    #[test]
    fn setup_is_idempotent() {
        setup_logger(LoggingConfig::default_for_test());
        setup_logger(LoggingConfig::default_for_test().use_format(LogFormat::Json));
    }
}
