//! Idle detection for GNOME (Wayland or X11) through Mutter's idle monitor on
//! the session bus.

use tracing::debug;

use super::{millis_to_secs, IdleMonitor, MonitorOptions};
use crate::error::IdleError;

pub const NAME: &str = "gnome";

pub const MUTTER_SERVICE: &str = "org.gnome.Mutter.IdleMonitor";
pub const MUTTER_PATH: &str = "/org/gnome/Mutter/IdleMonitor/Core";
pub const MUTTER_INTERFACE: &str = "org.gnome.Mutter.IdleMonitor";
pub const GET_IDLETIME: &str = "GetIdletime";

const SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";

/// Failure of a single session bus round trip.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BusError {
    /// Nobody owns the destination name on the bus.
    #[error("service unknown: {0}")]
    ServiceUnknown(String),
    /// The remote side answered with some other error reply.
    #[error("{name}: {detail}")]
    Remote { name: String, detail: String },
    /// The call never got an answer (I/O, decoding, closed connection).
    #[error("{0}")]
    Transport(String),
}

/// The one method call this backend needs from a session bus connection.
#[cfg_attr(test, mockall::automock)]
pub trait SessionBus {
    /// Ask Mutter for the idle time in milliseconds.
    fn get_idletime(&mut self) -> Result<u64, BusError>;

    /// Drop the connection. Later calls fail with [`BusError::Transport`].
    fn close(&mut self);
}

/// Idle monitor backed by `org.gnome.Mutter.IdleMonitor.GetIdletime`.
pub struct GnomeIdleMonitor<B = ZbusSession> {
    bus: B,
    threshold: f64,
}

impl GnomeIdleMonitor<ZbusSession> {
    /// Check that GNOME is the running desktop, then open the session bus.
    pub fn connect(options: &MonitorOptions) -> Result<Self, IdleError> {
        check_desktop(options.desktop_identifier().as_deref())?;
        let bus = ZbusSession::connect().map_err(|e| IdleError::unavailable(NAME, e))?;
        Ok(Self::with_bus(bus, options.idle_threshold))
    }
}

impl<B: SessionBus> GnomeIdleMonitor<B> {
    pub fn with_bus(bus: B, threshold: f64) -> Self {
        Self { bus, threshold }
    }
}

impl<B: SessionBus> IdleMonitor for GnomeIdleMonitor<B> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn idle_threshold(&self) -> f64 {
        self.threshold
    }

    fn get_idle_time(&mut self) -> Result<f64, IdleError> {
        match self.bus.get_idletime() {
            Ok(ms) => Ok(millis_to_secs(ms)),
            Err(BusError::ServiceUnknown(detail)) => {
                debug!("Mutter idle monitor is gone ({}), closing session bus", detail);
                self.bus.close();
                Err(IdleError::ServiceNotAvailable {
                    service: MUTTER_SERVICE.to_string(),
                })
            }
            Err(e @ BusError::Remote { .. }) => {
                self.bus.close();
                Err(IdleError::query(NAME, e))
            }
            Err(e @ BusError::Transport(_)) => Err(IdleError::query(NAME, e)),
        }
    }
}

/// The desktop identifier is a colon separated list such as `ubuntu:GNOME`.
fn check_desktop(desktop: Option<&str>) -> Result<(), IdleError> {
    match desktop {
        Some(d) if d.split(':').any(|part| part.eq_ignore_ascii_case("GNOME")) => Ok(()),
        Some(d) => Err(IdleError::unavailable(
            NAME,
            format!("GNOME is not running (desktop is {d:?})"),
        )),
        None => Err(IdleError::unavailable(
            NAME,
            "GNOME is not running (XDG_CURRENT_DESKTOP is not set)",
        )),
    }
}

/// Blocking session bus connection.
pub struct ZbusSession {
    connection: Option<zbus::blocking::Connection>,
}

impl ZbusSession {
    pub fn connect() -> zbus::Result<Self> {
        let connection = zbus::blocking::Connection::session()?;
        Ok(Self {
            connection: Some(connection),
        })
    }
}

impl SessionBus for ZbusSession {
    fn get_idletime(&mut self) -> Result<u64, BusError> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| BusError::Transport("session bus connection is closed".into()))?;

        let reply = connection
            .call_method(
                Some(MUTTER_SERVICE),
                MUTTER_PATH,
                Some(MUTTER_INTERFACE),
                GET_IDLETIME,
                &(),
            )
            .map_err(BusError::from)?;

        reply
            .body()
            .deserialize::<u64>()
            .map_err(|e| BusError::Transport(format!("unexpected GetIdletime reply: {e}")))
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close() {
                debug!("Error while closing session bus connection: {}", e);
            }
        }
    }
}

impl From<zbus::Error> for BusError {
    fn from(err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, detail, _) => {
                let detail = detail.unwrap_or_default();
                if name.as_str() == SERVICE_UNKNOWN {
                    BusError::ServiceUnknown(detail)
                } else {
                    BusError::Remote {
                        name: name.to_string(),
                        detail,
                    }
                }
            }
            other => BusError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_milliseconds_to_seconds() {
        let mut bus = MockSessionBus::new();
        bus.expect_get_idletime().times(1).returning(|| Ok(300_000));
        bus.expect_close().never();

        let mut monitor = GnomeIdleMonitor::with_bus(bus, 120.0);

        assert_eq!(monitor.get_idle_time().unwrap(), 300.0);
    }

    #[test]
    fn is_idle_uses_threshold() {
        let mut bus = MockSessionBus::new();
        bus.expect_get_idletime().returning(|| Ok(50_000));

        let mut monitor = GnomeIdleMonitor::with_bus(bus, 120.0);

        assert!(!monitor.is_idle().unwrap());
    }

    #[test]
    fn service_unknown_closes_connection_and_reports_unavailable_service() {
        let mut bus = MockSessionBus::new();
        bus.expect_get_idletime()
            .times(1)
            .returning(|| Err(BusError::ServiceUnknown("name has no owner".into())));
        bus.expect_close().times(1).return_const(());

        let mut monitor = GnomeIdleMonitor::with_bus(bus, 120.0);
        let err = monitor.get_idle_time().unwrap_err();

        match err {
            IdleError::ServiceNotAvailable { service } => assert_eq!(service, MUTTER_SERVICE),
            other => panic!("expected ServiceNotAvailable, got {other:?}"),
        }
    }

    #[test]
    fn other_remote_errors_also_close_connection() {
        let mut bus = MockSessionBus::new();
        bus.expect_get_idletime().times(1).returning(|| {
            Err(BusError::Remote {
                name: "org.freedesktop.DBus.Error.AccessDenied".into(),
                detail: "nope".into(),
            })
        });
        bus.expect_close().times(1).return_const(());

        let mut monitor = GnomeIdleMonitor::with_bus(bus, 120.0);

        assert!(matches!(
            monitor.get_idle_time(),
            Err(IdleError::QueryFailed { backend: NAME, .. })
        ));
    }

    #[test]
    fn transport_errors_keep_connection() {
        let mut bus = MockSessionBus::new();
        bus.expect_get_idletime()
            .times(1)
            .returning(|| Err(BusError::Transport("timed out".into())));
        bus.expect_close().never();

        let mut monitor = GnomeIdleMonitor::with_bus(bus, 120.0);

        let err = monitor.get_idle_time().unwrap_err();
        assert_eq!(err.to_string(), "gnome idle query failed: timed out");
    }

    #[test]
    fn desktop_gate_accepts_gnome_variants() {
        for desktop in ["GNOME", "ubuntu:GNOME", "gnome", "GNOME-Classic:GNOME"] {
            assert!(check_desktop(Some(desktop)).is_ok(), "{desktop}");
        }
    }

    #[test]
    fn desktop_gate_rejects_other_desktops() {
        for desktop in [None, Some("KDE"), Some(""), Some("X-Cinnamon")] {
            let err = check_desktop(desktop).unwrap_err();
            assert!(matches!(err, IdleError::BackendUnavailable { backend: NAME, .. }));
        }
    }

    #[test]
    fn connect_fails_fast_outside_gnome() {
        let options = MonitorOptions {
            desktop: Some("KDE".into()),
            ..MonitorOptions::default()
        };

        let err = GnomeIdleMonitor::connect(&options).err().unwrap();
        assert!(err.to_string().contains("GNOME is not running"));
    }
}
