//! Time sources for deferred work
//!
//! This crate provides:
//! - The [`Scheduler`] capability ("run this after a duration", "cancel that")
//! - [`RealClock`], backed by the tokio timer wheel
//! - [`VirtualClock`], which only moves when told to
//! - A scoped harness that swaps the ambient time source for a virtual one

pub mod harness;
pub mod real;
pub mod virtual_clock;

// Re-exports
pub use harness::{
    advance, ambient, install_virtual_clock, installed, restore_real_clock, VirtualClockGuard,
};
pub use real::RealClock;
pub use virtual_clock::VirtualClock;

use std::sync::Arc;
use std::time::Duration;

/// Work handed to a scheduler; runs at most once
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle to a scheduled task
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TimerId(u64);

impl TimerId {
    /// Create a handle from a raw sequence number
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw sequence number (allocation order)
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// A source of delayed execution
///
/// Implementations must never run a task synchronously inside `schedule`,
/// and a task whose handle was passed to `cancel` must never run afterwards.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Discard a scheduled task
    ///
    /// Returns `true` if the task was still pending.
    fn cancel(&self, id: TimerId) -> bool;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        (**self).schedule(delay, task)
    }

    fn cancel(&self, id: TimerId) -> bool {
        (**self).cancel(id)
    }
}

/// Errors raised while resolving a time source
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The real clock needs a tokio runtime and none is active on this thread
    #[error("no tokio runtime is active on this thread; enter one or install a virtual clock")]
    NoRuntime,

    /// A virtual-time operation was attempted while on the real clock
    #[error("no virtual clock is installed on this thread")]
    NotInstalled,
}

/// Result type for clock operations
pub type Result<T> = std::result::Result<T, ClockError>;
