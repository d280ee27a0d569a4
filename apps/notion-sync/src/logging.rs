//! Log subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,xavyo_connector_notion=debug";

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `filter`. With `json` set, events are written as
/// flattened JSON objects suitable for log aggregation; otherwise the
/// human-readable formatter is used. Logs go to stderr so that stdout only
/// carries command output.
pub fn init_logging(filter: &str, json: bool) {
    let filter_layer =
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter)) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("FATAL: Failed to create log filter: {e}");
                std::process::exit(1);
            }
        };

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true);
        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(filter_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter_layer)
            .init();
    }

    tracing::debug!(filter = %filter, json, "Logging initialized");
}

/// Reads `NOTION_LOG_JSON`.
pub fn json_requested<F>(reader: F) -> bool
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    reader("NOTION_LOG_JSON")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
