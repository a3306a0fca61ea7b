//! Logging initialization
//!
//! Console output is human-readable or JSON; an optional file layer writes the
//! same events without ANSI colors. `RUST_LOG` overrides the configured level.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Build the filter from `RUST_LOG`, falling back to the configured level
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Log file name with naming pattern: {prefix}_{date}.log
pub fn log_file_name(prefix: &str) -> String {
    format!(
        "{}_{}.log",
        prefix,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed or the log directory cannot be
/// created.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let console_layer = if config.json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true)
            .boxed()
    };

    let file_layer = match &config.log_dir {
        Some(dir) => Some(build_file_layer(dir)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = &config.log_dir {
        tracing::info!("Logging to {}", dir.display());
    }

    Ok(())
}

fn build_file_layer<S>(dir: &Path) -> Result<Box<dyn Layer<S> + Send + Sync + 'static>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, log_file_name("trend"));

    Ok(fmt::layer()
        .with_writer(appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .boxed())
}
