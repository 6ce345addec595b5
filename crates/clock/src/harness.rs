//! Scoped substitution of the ambient time source
//!
//! Code that asks for [`ambient`] gets the real clock unless a test has called
//! [`install_virtual_clock`] on the same thread. The returned guard restores
//! the previous time source when it is dropped, including during unwinding,
//! so a failing test cannot leak virtual time into the next one.
//!
//! The installation is per thread. The test harness runs each test on its own
//! thread, so parallel tests never observe each other's clocks.

use crate::{ClockError, RealClock, Result, Scheduler, VirtualClock};
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

thread_local! {
    /// Installed clocks, innermost last, tagged with their install id
    static INSTALLED: RefCell<Vec<(u64, VirtualClock)>> = const { RefCell::new(Vec::new()) };
    static NEXT_INSTALL: Cell<u64> = const { Cell::new(0) };
}

/// Keeps a virtual clock installed until dropped
///
/// Not `Send`: it must be dropped on the thread that installed it.
#[must_use = "the real clock is restored as soon as the guard is dropped"]
pub struct VirtualClockGuard {
    id: u64,
    clock: VirtualClock,
    _thread_bound: PhantomData<*const ()>,
}

impl VirtualClockGuard {
    /// The installed clock
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Advance the installed clock, running due tasks
    pub fn advance(&self, by: Duration) -> usize {
        self.clock.advance(by)
    }

    /// Uninstall now instead of at end of scope
    pub fn restore(self) {
        drop(self);
    }
}

impl Drop for VirtualClockGuard {
    fn drop(&mut self) {
        // Only this guard's entry goes; whatever remains on top is ambient
        let (removed, remaining) = INSTALLED.with(|stack| {
            let mut stack = stack.borrow_mut();
            let before = stack.len();
            stack.retain(|(id, _)| *id != self.id);
            (before != stack.len(), stack.len())
        });
        tracing::debug!(
            install = self.id,
            removed,
            remaining,
            pending = self.clock.pending(),
            "virtual clock uninstalled"
        );
    }
}

/// Install a fresh virtual clock as this thread's ambient time source
///
/// A clock installed while another is active shadows it. Guards may be
/// dropped in any order; the most recent install still alive is ambient.
pub fn install_virtual_clock() -> VirtualClockGuard {
    let id = NEXT_INSTALL.with(|next| {
        let id = next.get();
        next.set(id.wrapping_add(1));
        id
    });
    let clock = VirtualClock::new();
    let depth = INSTALLED.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push((id, clock.clone()));
        stack.len()
    });
    tracing::debug!(install = id, depth, "virtual clock installed");

    VirtualClockGuard {
        id,
        clock,
        _thread_bound: PhantomData,
    }
}

/// Advance the virtual clock installed on this thread
///
/// Returns the number of tasks that ran, or [`ClockError::NotInstalled`] when
/// the thread is on the real clock.
pub fn advance(by: Duration) -> Result<usize> {
    let clock = installed().ok_or(ClockError::NotInstalled)?;
    Ok(clock.advance(by))
}

/// Drop back to the real clock on this thread
///
/// Uninstalls every clock; guards dropped afterwards have nothing to restore.
pub fn restore_real_clock() {
    let removed = INSTALLED.with(|stack| std::mem::take(&mut *stack.borrow_mut()));
    if !removed.is_empty() {
        tracing::debug!(uninstalled = removed.len(), "real clock restored");
    }
}

/// The virtual clock installed on this thread, if any
pub fn installed() -> Option<VirtualClock> {
    INSTALLED.with(|stack| stack.borrow().last().map(|(_, clock)| clock.clone()))
}

/// Resolve the time source code on this thread should schedule against
///
/// The installed virtual clock wins; otherwise the real clock bound to the
/// current tokio runtime.
pub fn ambient() -> Result<Arc<dyn Scheduler>> {
    match installed() {
        Some(clock) => Ok(Arc::new(clock)),
        None => Ok(Arc::new(RealClock::try_current()?)),
    }
}
