use crate::config::ObservabilityConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Map a configured level name onto a tracing level.
///
/// Unknown names fall back to `INFO`; the caller logs the fallback once a
/// subscriber exists.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global fmt subscriber.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// hosts that set up their own tracing can still call this safely.
pub fn init_logging(config: &ObservabilityConfig) -> anyhow::Result<bool> {
    let parsed = parse_level(&config.log_level);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parsed.unwrap_or(Level::INFO))
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return Ok(false);
    }

    if parsed.is_none() {
        tracing::warn!(
            "Unknown log level '{}', falling back to info",
            config.log_level
        );
    }
    Ok(true)
}
