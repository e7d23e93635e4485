//! Structured logging setup
//!
//! The router emits `tracing` events for registration and for every chain it
//! runs. This module installs a subscriber for them:
//! - JSON output for production, pretty-print for development
//! - Sampling strategies (all, error-only, sampled), since chain events fire
//!   once per intercepted call
//! - Per-target filter directives
//!
//! Libraries embedding the router usually install their own subscriber and
//! never call [`init_logging_with_config`].

use anyhow::{Context, Result};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Sampling mode: how to decide which events to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Log everything
    All,
    /// Log only WARN and ERROR levels
    ErrorOnly,
    /// Sample routine chain events, log all warnings and errors
    Sampled,
}

impl SamplingMode {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error-only" | "error_only" => SamplingMode::ErrorOnly,
            "sampled" => SamplingMode::Sampled,
            _ => SamplingMode::All,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Sampling mode: all/error-only/sampled
    pub sampling_mode: SamplingMode,
    /// Sampling rate (0.0-1.0) for Sampled mode
    pub sampling_rate: f64,
    /// Extra filter directives (comma-separated), e.g. `fsrouter::pattern=warn`
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from `FSROUTER_LOG_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("FSROUTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("FSROUTER_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            sampling_mode: SamplingMode::parse(
                &env::var("FSROUTER_LOG_SAMPLING_MODE").unwrap_or_else(|_| "all".to_string()),
            ),
            sampling_rate: env::var("FSROUTER_LOG_SAMPLING_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            target_filter: env::var("FSROUTER_LOG_TARGET_FILTER").ok(),
            include_location: env::var("FSROUTER_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Create a default configuration for development and tests
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            sampling_mode: SamplingMode::All,
            sampling_rate: 1.0,
            target_filter: None,
            include_location: true,
        }
    }

    /// Create a default production configuration
    #[must_use]
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            sampling_mode: SamplingMode::Sampled,
            sampling_rate: 0.1,
            target_filter: None,
            include_location: false,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Sampling layer: decides whether to emit an event based on sampling rules
pub struct SamplingLayer {
    mode: SamplingMode,
    sampling_rate: f64,
    counter: AtomicU64,
}

impl SamplingLayer {
    #[must_use]
    pub fn new(mode: SamplingMode, sampling_rate: f64) -> Self {
        Self {
            mode,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
            counter: AtomicU64::new(0),
        }
    }

    fn is_important(metadata: &Metadata<'_>) -> bool {
        matches!(*metadata.level(), Level::WARN | Level::ERROR)
    }

    fn should_sample(&self, metadata: &Metadata<'_>) -> bool {
        let important = Self::is_important(metadata);
        match self.mode {
            SamplingMode::All => true,
            SamplingMode::ErrorOnly => important,
            SamplingMode::Sampled => {
                if important {
                    return true;
                }
                if self.sampling_rate <= 0.0 {
                    return false;
                }
                let count = self.counter.fetch_add(1, Ordering::Relaxed);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let interval = (1.0 / self.sampling_rate) as u64;
                interval > 0 && count % interval == 0
            }
        }
    }
}

impl<S> Layer<S> for SamplingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    /// Sampled callsites must be asked on every event; caching an `always`
    /// or `never` interest would keep or drop the callsite wholesale.
    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        match self.mode {
            SamplingMode::Sampled if !Self::is_important(metadata) => Interest::sometimes(),
            _ if self.should_sample(metadata) => Interest::always(),
            _ => Interest::never(),
        }
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        self.should_sample(metadata)
    }

    fn on_event(&self, _event: &Event<'_>, _ctx: LayerContext<'_, S>) {}
}

/// Initialize logging with `FSROUTER_LOG_*` configuration
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LogConfig::from_env())
}

/// Initialize logging with explicit configuration
///
/// `RUST_LOG`, when set, takes precedence over `config.log_level`.
///
/// # Errors
///
/// Fails on an invalid target filter directive, or if a global subscriber is
/// already installed.
///
/// # Example
///
/// ```no_run
/// use fsrouter::logging::{LogConfig, init_logging_with_config};
///
/// init_logging_with_config(&LogConfig::default_dev())
///     .expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',').map(str::trim) {
            if filter.is_empty() {
                continue;
            }
            let directive = filter
                .parse::<Directive>()
                .with_context(|| format!("Invalid log filter directive: {filter}"))?;
            env_filter = env_filter.add_directive(directive);
        }
    }

    let sampling_layer = SamplingLayer::new(config.sampling_mode, config.sampling_rate);

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(sampling_layer)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
