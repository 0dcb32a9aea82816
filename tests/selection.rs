use idle_time::{select_from, IdleError, IdleMonitor, MonitorOptions, Registry};

struct Constant {
    idle: f64,
    threshold: f64,
}

impl IdleMonitor for Constant {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn idle_threshold(&self) -> f64 {
        self.threshold
    }

    fn get_idle_time(&mut self) -> Result<f64, IdleError> {
        Ok(self.idle)
    }
}

struct Refusing;

impl IdleMonitor for Refusing {
    fn name(&self) -> &'static str {
        "refusing"
    }

    fn idle_threshold(&self) -> f64 {
        0.0
    }

    fn get_idle_time(&mut self) -> Result<f64, IdleError> {
        Err(IdleError::QueryFailed {
            backend: "refusing",
            reason: "handle opened but unusable".into(),
        })
    }
}

#[test]
fn falls_through_to_first_usable_backend() {
    let mut registry = Registry::new();
    registry
        .register("a", |_| {
            Err(IdleError::BackendUnavailable {
                backend: "a",
                reason: "platform service absent".into(),
            })
        })
        .register("b", |_| Ok(Box::new(Refusing)))
        .register("c", |options| {
            Ok(Box::new(Constant {
                idle: 300.0,
                threshold: options.idle_threshold,
            }))
        });

    let mut monitor = select_from(&registry, &MonitorOptions::with_threshold(120.0)).unwrap();

    assert_eq!(monitor.name(), "constant");
    assert!(monitor.is_idle().unwrap());
    assert_eq!(monitor.get_idle_time().unwrap(), 300.0);
}

#[test]
fn single_backend_below_threshold_is_active() {
    let mut registry = Registry::new();
    registry.register("a", |options| {
        Ok(Box::new(Constant {
            idle: 50.0,
            threshold: options.idle_threshold,
        }))
    });

    let mut monitor = select_from(&registry, &MonitorOptions::with_threshold(120.0)).unwrap();

    assert!(!monitor.is_idle().unwrap());
}

#[test]
fn empty_registry_reports_no_monitor() {
    let err = select_from(&Registry::new(), &MonitorOptions::default()).unwrap_err();

    assert!(matches!(err, IdleError::NoMonitorAvailable { .. }));
}

#[test]
fn all_failing_backends_are_reported_in_order() {
    let mut registry = Registry::new();
    registry
        .register("b", |_| Ok(Box::new(Refusing)))
        .register("a", |_| {
            Err(IdleError::BackendUnavailable {
                backend: "a",
                reason: "missing".into(),
            })
        });

    match select_from(&registry, &MonitorOptions::default()) {
        Err(IdleError::NoMonitorAvailable { failures }) => {
            let names: Vec<_> = failures.iter().map(|f| f.backend).collect();
            assert_eq!(names, vec!["b", "a"]);
            assert!(failures[0].reason.contains("handle opened but unusable"));
        }
        other => panic!("expected NoMonitorAvailable, got {other:?}"),
    }
}

#[cfg(target_os = "linux")]
mod session_bus {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use idle_time::idle::gnome::{BusError, GnomeIdleMonitor, SessionBus, MUTTER_SERVICE};

    /// Fake bus whose remote service has disappeared.
    struct VanishedService {
        open: Rc<Cell<bool>>,
    }

    impl SessionBus for VanishedService {
        fn get_idletime(&mut self) -> Result<u64, BusError> {
            if !self.open.get() {
                return Err(BusError::Transport("session bus connection is closed".into()));
            }
            Err(BusError::ServiceUnknown(format!(
                "The name {MUTTER_SERVICE} was not provided by any .service files"
            )))
        }

        fn close(&mut self) {
            self.open.set(false);
        }
    }

    #[test]
    fn vanished_service_closes_connection_before_reporting() {
        let open = Rc::new(Cell::new(true));
        let mut monitor = GnomeIdleMonitor::with_bus(VanishedService { open: open.clone() }, 120.0);

        let err = monitor.get_idle_time().unwrap_err();

        assert!(matches!(err, IdleError::ServiceNotAvailable { .. }));
        assert!(!open.get());

        // The monitor is not silently revived.
        let err = monitor.is_idle().unwrap_err();
        assert!(matches!(err, IdleError::QueryFailed { backend: "gnome", .. }));
    }
}
