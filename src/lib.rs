//! How long has the user been idle?
//!
//! Several platform mechanisms can answer that question and none of them is
//! guaranteed to work in a given session. [`select`] walks the registered
//! backends in priority order and returns the first [`IdleMonitor`] that
//! both constructs and answers a live query:
//!
//! ```no_run
//! use idle_time::{select, MonitorOptions};
//!
//! let mut monitor = select(&MonitorOptions::with_threshold(300.0))?;
//! println!("idle for {:.0}s, idle: {}", monitor.get_idle_time()?, monitor.is_idle()?);
//! # Ok::<(), idle_time::IdleError>(())
//! ```
//!
//! Once selected, a monitor is never swapped out behind the caller's back.
//! If it later fails, run [`select`] again.

pub mod config;
pub mod error;
pub mod idle;
pub mod logging;
pub mod registry;
pub mod selector;

pub use error::{CandidateFailure, IdleError};
pub use idle::{IdleMonitor, MonitorOptions, DEFAULT_IDLE_THRESHOLD};
pub use registry::Registry;
pub use selector::{select, select_from};
