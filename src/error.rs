//! Error kinds surfaced by idle monitors and the selector.

use thiserror::Error;

/// One candidate that was tried during selection and why it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub backend: &'static str,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum IdleError {
    /// Construction or the first probe query of a candidate failed.
    #[error("{backend} idle monitor unavailable: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },

    /// Every registered candidate was tried and none worked.
    #[error("could not find a working idle monitor (tried {})", format_failures(.failures))]
    NoMonitorAvailable { failures: Vec<CandidateFailure> },

    /// A monitor that was selected earlier failed to answer a query.
    #[error("{backend} idle query failed: {reason}")]
    QueryFailed {
        backend: &'static str,
        reason: String,
    },

    /// The remote idle service on the session bus is not running.
    #[error("{service} is not available, is the desktop session running?")]
    ServiceNotAvailable { service: String },
}

impl IdleError {
    pub fn unavailable(backend: &'static str, reason: impl ToString) -> Self {
        Self::BackendUnavailable {
            backend,
            reason: reason.to_string(),
        }
    }

    pub fn query(backend: &'static str, reason: impl ToString) -> Self {
        Self::QueryFailed {
            backend,
            reason: reason.to_string(),
        }
    }

    /// Whether running selection again could plausibly yield a working monitor.
    ///
    /// Query failures on an already selected monitor leave it unusable, but
    /// another backend may still answer. Exhausting the registry does not.
    pub fn is_recoverable_by_reselect(&self) -> bool {
        matches!(
            self,
            Self::QueryFailed { .. } | Self::ServiceNotAvailable { .. }
        )
    }
}

fn format_failures(failures: &[CandidateFailure]) -> String {
    if failures.is_empty() {
        return "no backends registered".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.backend, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
