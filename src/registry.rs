//! Ordered list of idle monitor backends known to this process.
//!
//! Registration order is priority order: the selector walks the list front to
//! back and keeps the first backend that works.

use std::sync::LazyLock;

use crate::error::IdleError;
use crate::idle::{IdleMonitor, MonitorOptions};

/// Builds one backend, or explains why it cannot run here.
pub type Constructor =
    Box<dyn Fn(&MonitorOptions) -> Result<Box<dyn IdleMonitor>, IdleError> + Send + Sync>;

/// A named backend constructor.
pub struct Candidate {
    name: &'static str,
    construct: Constructor,
}

impl Candidate {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn construct(&self, options: &MonitorOptions) -> Result<Box<dyn IdleMonitor>, IdleError> {
        (self.construct)(options)
    }
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate").field("name", &self.name).finish()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    candidates: Vec<Candidate>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend. Earlier registrations take priority.
    pub fn register<F>(&mut self, name: &'static str, construct: F) -> &mut Self
    where
        F: Fn(&MonitorOptions) -> Result<Box<dyn IdleMonitor>, IdleError> + Send + Sync + 'static,
    {
        self.candidates.push(Candidate {
            name,
            construct: Box::new(construct),
        });
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.candidates.iter().map(Candidate::name).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The backends compiled in for the current target, in priority order.
    pub fn platform() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(target_os = "windows")]
        registry.register(crate::idle::windows::NAME, |options| {
            Ok(Box::new(crate::idle::windows::WindowsIdleMonitor::new(options)?))
        });

        #[cfg(target_os = "macos")]
        registry.register(crate::idle::macos::NAME, |options| {
            Ok(Box::new(crate::idle::macos::MacIdleMonitor::new(options)?))
        });

        #[cfg(target_os = "linux")]
        registry
            .register(crate::idle::gnome::NAME, |options| {
                Ok(Box::new(crate::idle::gnome::GnomeIdleMonitor::connect(options)?))
            })
            .register(crate::idle::x11::NAME, |options| {
                Ok(Box::new(crate::idle::x11::X11IdleMonitor::new(options)?))
            });

        registry
    }
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::platform);

/// The process-wide registry, populated once on first use.
pub fn global() -> &'static Registry {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable(name: &'static str) -> impl Fn(&MonitorOptions) -> Result<Box<dyn IdleMonitor>, IdleError> {
        move |_| Err(IdleError::unavailable(name, "not here"))
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = Registry::new();
        registry
            .register("first", unavailable("first"))
            .register("second", unavailable("second"))
            .register("third", unavailable("third"));

        assert_eq!(registry.names(), vec!["first", "second", "third"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn candidate_forwards_to_constructor() {
        let mut registry = Registry::new();
        registry.register("only", unavailable("only"));

        let err = registry.candidates()[0]
            .construct(&MonitorOptions::default())
            .unwrap_err();
        assert!(matches!(err, IdleError::BackendUnavailable { backend: "only", .. }));
    }

    #[test]
    fn global_registry_matches_platform_list() {
        assert_eq!(global().names(), Registry::platform().names());
        assert!(std::ptr::eq(global(), global()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_prefers_session_bus_over_x11() {
        assert_eq!(Registry::platform().names(), vec!["gnome", "x11"]);
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn windows_registers_tick_counter() {
        assert_eq!(Registry::platform().names(), vec!["windows"]);
    }
}
