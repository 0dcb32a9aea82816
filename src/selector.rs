//! Runtime selection of the first idle monitor that works on this machine.

use tracing::{debug, info, warn};

use crate::error::{CandidateFailure, IdleError};
use crate::idle::{IdleMonitor, MonitorOptions};
use crate::registry::{self, Registry};

/// Pick a monitor from the process-wide registry.
pub fn select(options: &MonitorOptions) -> Result<Box<dyn IdleMonitor>, IdleError> {
    select_from(registry::global(), options)
}

/// Try each candidate in registration order and return the first one that
/// both constructs and answers a real idle query.
///
/// Candidates that fail either step are dropped before the next one is tried,
/// so their handles are released. Each call is an independent search.
pub fn select_from(
    registry: &Registry,
    options: &MonitorOptions,
) -> Result<Box<dyn IdleMonitor>, IdleError> {
    let mut failures = Vec::new();

    for candidate in registry.candidates() {
        let name = candidate.name();
        if !options.allows(name) {
            debug!("Skipping {} idle monitor, not in allowed backends", name);
            continue;
        }

        match probe(candidate.construct(options)) {
            Ok((monitor, idle)) => {
                info!("Using {} idle monitor (idle for {:.1}s)", name, idle);
                return Ok(monitor);
            }
            Err(err) => {
                warn!("Trying other monitors, could not load {}: {}", name, err);
                failures.push(CandidateFailure {
                    backend: name,
                    reason: err.to_string(),
                });
            }
        }
    }

    Err(IdleError::NoMonitorAvailable { failures })
}

/// Some backends construct fine and only fail on first use, so a successful
/// constructor is followed by one live query.
fn probe(
    constructed: Result<Box<dyn IdleMonitor>, IdleError>,
) -> Result<(Box<dyn IdleMonitor>, f64), IdleError> {
    let mut monitor = constructed?;
    let idle = monitor.get_idle_time()?;
    Ok((monitor, idle))
}
