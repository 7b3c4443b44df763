//! Logging infrastructure for Tether.
//!
//! Library code logs through `tracing`; installing a subscriber is left to
//! the application unless the `tracing-subscriber` feature is enabled and
//! [`init`] is called.
//!
//! # Environment Variables
//!
//! - `TETHER_DEBUG=true` - Enable debug logging
//! - `TETHER_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `TETHER_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! ```rust,no_run
//! use tether_query::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `TETHER_DEBUG`.
///
/// Returns `true` if `TETHER_DEBUG` is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("TETHER_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `TETHER_LOG_LEVEL`.
///
/// Defaults to "debug" if `TETHER_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("TETHER_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Get the configured log format from `TETHER_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("TETHER_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize the Tether logging system.
///
/// Subsequent calls are no-ops. Nothing is installed unless `TETHER_DEBUG`
/// or `TETHER_LOG_LEVEL` is set.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("TETHER_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!("tether={level},tether_query={level}"))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match get_log_format() {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = get_log_format(),
                    "Tether logging initialized"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // SAFETY: Test runs in isolation
        unsafe {
            env::remove_var("TETHER_DEBUG");
            env::remove_var("TETHER_LOG_LEVEL");
            env::remove_var("TETHER_LOG_FORMAT");
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
        assert_eq!(get_log_format(), "json");
    }
}
