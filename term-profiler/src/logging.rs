//! Logging configuration for the profiler.
//!
//! The engine emits structured `tracing` events. [`LogConfig`] decides how
//! chatty the per-column and data-source events are, and [`setup`] installs
//! a `tracing-subscriber` registry for binaries and tests that want output.

use tracing::Level;

/// Controls which of the optional events the profiler emits.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for profiler components
    pub base_level: Level,
    /// Whether to log per-column rule outcomes
    pub log_column_details: bool,
    /// Whether to log batch loading and profile persistence
    pub log_data_operations: bool,
    /// Maximum length for logged field values (sample values, failure messages)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_column_details: false,
            log_data_operations: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Per-column outcomes, dataset rule events and long fields. Meant for
    /// chasing down a single misbehaving run.
    pub fn diagnostic() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_column_details: true,
            log_data_operations: true,
            max_field_length: 1024,
        }
    }

    /// Drops the optional column, source and sink events.
    pub fn quiet() -> Self {
        Self {
            base_level: Level::WARN,
            log_column_details: false,
            log_data_operations: false,
            max_field_length: 128,
        }
    }

    /// Lowest level the events enabled by this config are emitted at.
    pub fn required_level(&self) -> Level {
        if self.log_column_details || self.base_level >= Level::DEBUG {
            Level::DEBUG
        } else if self.log_data_operations {
            Level::INFO
        } else {
            self.base_level
        }
    }
}

/// Debug event gated on the configured base level.
#[macro_export]
macro_rules! perf_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level >= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Per-column event, emitted only with `log_column_details`.
#[macro_export]
macro_rules! log_column {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_column_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Data source or sink event, emitted only with `log_data_operations`.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a value to at most `max_length` bytes, backing off to the
/// nearest character boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for processes that run profiling jobs and have no
/// subscriber of their own.
pub mod setup {
    use tracing::Level;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::LogConfig;
    use crate::error::{ProfilerError, Result};

    #[derive(Debug, Clone)]
    pub struct SubscriberConfig {
        /// Level for every other target (datafusion, arrow, tokio)
        pub default_level: Level,
        /// Level for `term_profiler` targets
        pub profiler_level: Level,
        pub json: bool,
        /// Emit a close event with busy/idle time for each profiling run span
        pub run_timings: bool,
    }

    impl Default for SubscriberConfig {
        fn default() -> Self {
            Self {
                default_level: Level::WARN,
                profiler_level: Level::INFO,
                json: false,
                run_timings: false,
            }
        }
    }

    impl SubscriberConfig {
        /// Lets through every event the engine and sinks emit under `log_config`.
        pub fn for_log_config(log_config: &LogConfig) -> Self {
            Self {
                profiler_level: log_config.required_level(),
                ..Self::default()
            }
        }

        pub fn json(mut self, enabled: bool) -> Self {
            self.json = enabled;
            self
        }

        pub fn run_timings(mut self, enabled: bool) -> Self {
            self.run_timings = enabled;
            self
        }

        /// Filter directives used when `RUST_LOG` is not set.
        pub fn directives(&self) -> String {
            format!(
                "{},term_profiler={}",
                self.default_level.as_str().to_lowercase(),
                self.profiler_level.as_str().to_lowercase()
            )
        }
    }

    /// Installs the global subscriber. `RUST_LOG` wins over the configured
    /// directives when set.
    ///
    /// ```rust,no_run
    /// use term_profiler::logging::{setup, LogConfig};
    ///
    /// let log_config = LogConfig::diagnostic();
    /// setup::init_logging(&setup::SubscriberConfig::for_log_config(&log_config).run_timings(true))
    ///     .unwrap();
    /// ```
    pub fn init_logging(config: &SubscriberConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.directives()));

        let span_events = if config.run_timings {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let fmt_layer = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(span_events)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_span_events(span_events)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| {
                ProfilerError::configuration(format!("failed to install tracing subscriber: {e}"))
            })
    }
}
