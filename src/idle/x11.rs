//! Idle detection for Linux using X11 XScreenSaver extension.

use tracing::debug;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::screensaver::{self, ConnectionExt as ScreensaverConnectionExt};
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use super::{millis_to_secs, IdleMonitor, MonitorOptions};
use crate::error::IdleError;

pub const NAME: &str = "x11";

/// Idle monitor using the MIT-SCREEN-SAVER `QueryInfo` request.
///
/// Holds one display connection for its whole life; the connection closes
/// when the monitor is dropped.
pub struct X11IdleMonitor {
    conn: RustConnection,
    root: Window,
    threshold: f64,
}

impl X11IdleMonitor {
    pub fn new(options: &MonitorOptions) -> Result<Self, IdleError> {
        let display = options.x11_display.as_deref();
        let (conn, screen_num) = RustConnection::connect(display).map_err(|e| {
            IdleError::unavailable(
                NAME,
                format!("failed to connect to X11 display, is DISPLAY set? ({e})"),
            )
        })?;

        let present = conn
            .extension_information(screensaver::X11_EXTENSION_NAME)
            .map_err(|e| IdleError::unavailable(NAME, e))?
            .is_some();
        if !present {
            return Err(IdleError::unavailable(
                NAME,
                "XScreenSaver extension not available",
            ));
        }

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| IdleError::unavailable(NAME, format!("no screen {screen_num}")))?;
        debug!("Connected to X11 screen {} (root window {:#x})", screen_num, root);

        Ok(Self {
            conn,
            root,
            threshold: options.idle_threshold,
        })
    }
}

impl IdleMonitor for X11IdleMonitor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn idle_threshold(&self) -> f64 {
        self.threshold
    }

    fn get_idle_time(&mut self) -> Result<f64, IdleError> {
        let reply = self
            .conn
            .screensaver_query_info(self.root)
            .map_err(|e| IdleError::query(NAME, e))?
            .reply()
            .map_err(|e| IdleError::query(NAME, format!("failed to query XScreenSaver info: {e}")))?;

        // ms_since_user_input is the idle time in milliseconds
        Ok(millis_to_secs(u64::from(reply.ms_since_user_input)))
    }
}
