//! Idle monitor capability with platform-specific implementations.

#[cfg(target_os = "linux")]
pub mod gnome;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "windows")]
pub mod windows;
#[cfg(target_os = "linux")]
pub mod x11;

use crate::error::IdleError;

/// Threshold used when the caller does not supply one.
pub const DEFAULT_IDLE_THRESHOLD: f64 = 120.0;

/// One working strategy for measuring how long the user has been idle.
///
/// A monitor owns whatever platform handle it needs and releases it on drop.
/// Queries take `&mut self`: the handle is not assumed to be reentrant, so a
/// monitor must not be queried from several threads at once.
pub trait IdleMonitor {
    /// Short backend name, as used in the registry.
    fn name(&self) -> &'static str;

    /// Seconds of inactivity after which the user counts as idle.
    fn idle_threshold(&self) -> f64;

    /// Seconds since the last user input event.
    fn get_idle_time(&mut self) -> Result<f64, IdleError>;

    /// Whether the user has been idle for longer than the threshold.
    fn is_idle(&mut self) -> Result<bool, IdleError> {
        Ok(self.get_idle_time()? > self.idle_threshold())
    }
}

impl std::fmt::Debug for dyn IdleMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleMonitor")
            .field("backend", &self.name())
            .field("idle_threshold", &self.idle_threshold())
            .finish()
    }
}

/// Options handed to every backend constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    /// Idle threshold in seconds.
    pub idle_threshold: f64,
    /// Only these backends are tried, still in registry order. `None` tries all.
    pub backends: Option<Vec<String>>,
    /// X display to connect to instead of `$DISPLAY`.
    pub x11_display: Option<String>,
    /// Desktop identifier to use instead of `$XDG_CURRENT_DESKTOP`.
    pub desktop: Option<String>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            backends: None,
            x11_display: None,
            desktop: None,
        }
    }
}

impl MonitorOptions {
    pub fn with_threshold(idle_threshold: f64) -> Self {
        Self {
            idle_threshold,
            ..Self::default()
        }
    }

    /// Whether the allow-list admits the backend called `name`.
    pub fn allows(&self, name: &str) -> bool {
        match &self.backends {
            Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
            None => true,
        }
    }

    /// The desktop identifier, from the override or the environment.
    pub fn desktop_identifier(&self) -> Option<String> {
        self.desktop
            .clone()
            .or_else(|| std::env::var("XDG_CURRENT_DESKTOP").ok())
    }
}

pub(crate) fn millis_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
