//! Idle detection using IOKit HIDIdleTime (macOS).

use core_foundation::base::TCFType;
use core_foundation::number::{CFNumber, CFNumberRef};
use core_foundation::string::CFString;

use super::{IdleMonitor, MonitorOptions};
use crate::error::IdleError;

pub const NAME: &str = "macos";

/// Idle monitor reading `HIDIdleTime` from the `IOHIDSystem` service.
pub struct MacIdleMonitor {
    threshold: f64,
}

impl MacIdleMonitor {
    pub fn new(options: &MonitorOptions) -> Result<Self, IdleError> {
        Ok(Self {
            threshold: options.idle_threshold,
        })
    }
}

impl IdleMonitor for MacIdleMonitor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn idle_threshold(&self) -> f64 {
        self.threshold
    }

    fn get_idle_time(&mut self) -> Result<f64, IdleError> {
        let nanos = hid_idle_time_nanos()
            .ok_or_else(|| IdleError::query(NAME, "HIDIdleTime is not available"))?;
        Ok(nanos as f64 / 1_000_000_000.0)
    }
}

/// Nanoseconds since the last HID event, or `None` if IOKit did not answer.
fn hid_idle_time_nanos() -> Option<u64> {
    extern "C" {
        fn IOServiceGetMatchingService(
            main_port: u32,
            matching: core_foundation::base::CFTypeRef,
        ) -> u32;
        fn IOServiceMatching(name: *const std::os::raw::c_char) -> core_foundation::base::CFTypeRef;
        fn IORegistryEntryCreateCFProperty(
            entry: u32,
            key: core_foundation::string::CFStringRef,
            allocator: core_foundation::base::CFAllocatorRef,
            options: u32,
        ) -> core_foundation::base::CFTypeRef;
        fn IOObjectRelease(object: u32) -> i32;
    }

    unsafe {
        let service_name = std::ffi::CString::new("IOHIDSystem").ok()?;
        let matching = IOServiceMatching(service_name.as_ptr());
        if matching.is_null() {
            return None;
        }

        // Consumes the matching dictionary.
        let service = IOServiceGetMatchingService(0, matching);
        if service == 0 {
            return None;
        }

        let key = CFString::new("HIDIdleTime");
        let property =
            IORegistryEntryCreateCFProperty(service, key.as_concrete_TypeRef(), std::ptr::null(), 0);

        IOObjectRelease(service);

        if property.is_null() {
            return None;
        }

        let cf_number: CFNumber = CFNumber::wrap_under_create_rule(property as CFNumberRef);
        let nanos = cf_number.to_i64()?;
        u64::try_from(nanos).ok()
    }
}
