//! Logging setup for odex.
//!
//! Everything in the workspace logs through `tracing`. Nothing is printed until
//! a subscriber is installed, either by the application or by [`init`] when the
//! `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `ODEX_DEBUG=true|1|yes` - Enable debug logging
//! - `ODEX_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `ODEX_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! odex_query::logging::init();
//! ```
//!
//! Events emitted by the client:
//!
//! | Level | Event |
//! |---|---|
//! | `debug` | every read, base fetch and relation fetch |
//! | `info` | `create`, `write`, `unlink`, session established |
//! | `warn` | dangling relation references |
//! | `error` | records that could not be deleted |

use std::env;
use std::sync::Once;

use tracing::Level;

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line, human oriented.
    Pretty,
    /// Single line per event.
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// Name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `ODEX_DEBUG` was set.
    pub debug: bool,
    /// Level explicitly requested through `ODEX_LOG_LEVEL`, if valid.
    pub explicit_level: Option<Level>,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("ODEX_DEBUG")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let explicit_level = lookup("ODEX_LOG_LEVEL").and_then(|v| parse_level(&v));
        let format = lookup("ODEX_LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Self {
            debug,
            explicit_level,
            format,
        }
    }

    /// Whether anything asked for logging at all.
    pub fn is_requested(&self) -> bool {
        self.debug || self.explicit_level.is_some()
    }

    /// Effective level: the explicit one, else `debug` when debugging, else `warn`.
    pub fn level(&self) -> Level {
        self.explicit_level.unwrap_or(if self.debug {
            Level::DEBUG
        } else {
            Level::WARN
        })
    }

    /// `EnvFilter` directive covering the workspace crates.
    pub fn filter_directive(&self) -> String {
        let level = self.level().as_str().to_lowercase();
        format!("odex={level},odex_query={level},odex_jsonrpc={level}")
    }
}

fn parse_level(value: &str) -> Option<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Check if debug logging is enabled via `ODEX_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    LogSettings::from_env().debug
}

/// Initialize logging from the environment. Subsequent calls are no-ops.
pub fn init() {
    init_with(LogSettings::from_env());
}

/// Initialize logging with explicit settings. Subsequent calls are no-ops.
pub fn init_with(settings: LogSettings) {
    INIT.call_once(|| {
        if !settings.is_requested() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(settings.filter_directive())
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            // A subscriber installed by the application wins.
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = %settings.level(),
                    format = settings.format.as_str(),
                    "odex logging initialized"
                );
            }
        }
    });
}
