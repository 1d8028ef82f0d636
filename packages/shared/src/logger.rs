//! Logging setup for the StudySync binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output style of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-field human readable output with ANSI colors.
    #[default]
    Full,
    /// Single-line output, handy when logs are shipped to a collector.
    Compact,
}

/// Build the default filter directive applied when `RUST_LOG` is not set.
///
/// The level is applied to the workspace crates, the binary itself and
/// `tower_http` so request traces show up alongside room events.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    [
        "studysync_server",
        "studysync_shared",
        &binary_name.replace('-', "_"),
        "tower_http",
    ]
    .iter()
    .map(|target| format!("{}={}", target, default_log_level))
    .collect::<Vec<_>>()
    .join(",")
}

/// Initialize the tracing subscriber.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use studysync_shared::logger::{LogFormat, setup_logger};
///
/// setup_logger("studysync-server", "info", LogFormat::Full);
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Full => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_ansi(false))
            .init(),
    }
}
