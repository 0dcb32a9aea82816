//! Idle detection for Windows using GetLastInputInfo Win32 API.

use windows::Win32::System::SystemInformation::GetTickCount;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};

use super::{millis_to_secs, IdleMonitor, MonitorOptions};
use crate::error::IdleError;

pub const NAME: &str = "windows";

/// Idle monitor comparing the tick count of the last input event with the
/// current tick count. Holds no handles.
pub struct WindowsIdleMonitor {
    threshold: f64,
}

impl WindowsIdleMonitor {
    pub fn new(options: &MonitorOptions) -> Result<Self, IdleError> {
        Ok(Self {
            threshold: options.idle_threshold,
        })
    }
}

impl IdleMonitor for WindowsIdleMonitor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn idle_threshold(&self) -> f64 {
        self.threshold
    }

    fn get_idle_time(&mut self) -> Result<f64, IdleError> {
        let mut last_input = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };

        unsafe {
            if !GetLastInputInfo(&mut last_input).as_bool() {
                return Err(IdleError::query(NAME, "GetLastInputInfo failed"));
            }
            // Both counters wrap after ~49.7 days.
            let idle_ms = GetTickCount().wrapping_sub(last_input.dwTime);
            Ok(millis_to_secs(u64::from(idle_ms)))
        }
    }
}
