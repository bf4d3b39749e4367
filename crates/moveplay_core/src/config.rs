//! Host-side configuration.
//!
//! # Responsibility
//! - Describe logging setup and the event observer passed to `Playground::setup`.
//! - Read logging overrides from the process environment.
//!
//! # Invariants
//! - A blank or missing `MOVEPLAY_LOG_DIR` disables file logging.

use crate::event::bridge::EventObserver;
use crate::model::event::Event;
use std::sync::Arc;

pub const LOG_LEVEL_ENV: &str = "MOVEPLAY_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "MOVEPLAY_LOG_DIR";

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`, case-insensitive.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: String,
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, log_dir: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Builds config from `MOVEPLAY_LOG_LEVEL` / `MOVEPLAY_LOG_DIR`.
    ///
    /// Returns `None` when no log directory is configured.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let log_dir = lookup(LOG_DIR_ENV)?.trim().to_string();
        if log_dir.is_empty() {
            return None;
        }
        let level = lookup(LOG_LEVEL_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| crate::logging::default_log_level().to_string());
        Some(Self { level, log_dir })
    }
}

/// Options for `Playground::setup`.
#[derive(Clone, Default)]
pub struct SetupOptions {
    /// Receives normalized Runtime events. `None` drops them.
    pub on_event: Option<EventObserver>,
    /// File logging; `None` leaves logging untouched.
    pub logging: Option<LoggingConfig>,
}

impl SetupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logging taken from the environment, no observer.
    pub fn from_env() -> Self {
        Self {
            on_event: None,
            logging: LoggingConfig::from_env(),
        }
    }

    pub fn on_event(mut self, observer: impl Fn(Event) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(observer));
        self
    }

    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }
}
