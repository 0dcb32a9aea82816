//! Configuration loading from TOML files and environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::idle::{MonitorOptions, DEFAULT_IDLE_THRESHOLD};
use crate::registry::Registry;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Idle detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    /// Idle threshold in seconds.
    #[serde(default = "default_idle_threshold")]
    pub threshold_seconds: f64,
    /// Backends to try, by name. Empty means all of them.
    #[serde(default)]
    pub backends: Vec<String>,
    /// X display name, e.g. ":1".
    #[serde(default)]
    pub x11_display: Option<String>,
    /// Desktop identifier used instead of XDG_CURRENT_DESKTOP.
    #[serde(default)]
    pub desktop: Option<String>,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            threshold_seconds: default_idle_threshold(),
            backends: Vec::new(),
            x11_display: None,
            desktop: None,
        }
    }
}

impl IdleConfig {
    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            idle_threshold: self.threshold_seconds,
            backends: (!self.backends.is_empty()).then(|| self.backends.clone()),
            x11_display: self.x11_display.clone(),
            desktop: self.desktop.clone(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format for log lines on stderr.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown log format: {other}"),
        }
    }
}

fn default_idle_threshold() -> f64 {
    DEFAULT_IDLE_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = config_path {
            Self::from_file(path)?
        } else {
            let default_paths = [
                Some(PathBuf::from("config/default.toml")),
                dirs::config_dir().map(|d| d.join("idle-time/config.toml")),
            ];

            let mut loaded = None;
            for path in default_paths.iter().flatten() {
                if path.exists() {
                    loaded = Some(Self::from_file(path)?);
                    break;
                }
            }
            loaded.unwrap_or_default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Apply `IDLE_TIME_*` overrides looked up through `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("IDLE_TIME_THRESHOLD") {
            if let Ok(v) = val.parse() {
                self.idle.threshold_seconds = v;
            }
        }
        if let Some(val) = var("IDLE_TIME_BACKENDS") {
            self.idle.backends = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(val) = var("IDLE_TIME_X11_DISPLAY") {
            self.idle.x11_display = Some(val);
        }
        if let Some(val) = var("IDLE_TIME_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("IDLE_TIME_LOG_FORMAT") {
            if let Ok(v) = val.parse() {
                self.logging.format = v;
            }
        }
    }

    /// Validate configuration values against the backends in `registry`.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        let threshold = self.idle.threshold_seconds;
        if !threshold.is_finite() || threshold < 0.0 {
            anyhow::bail!("Idle threshold must be a non-negative number of seconds, got {threshold}");
        }
        let known = registry.names();
        for name in &self.idle.backends {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(name)) {
                anyhow::bail!(
                    "Unknown idle backend {name:?}, available on this platform: {}",
                    known.join(", ")
                );
            }
        }
        Ok(())
    }
}
