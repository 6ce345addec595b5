//! Single-timer, trailing-edge debouncer
//!
//! Every call cancels the pending timer (if any), stores its arguments and
//! arms a fresh timer. When a timer survives a full quiet period the callback
//! runs once with the stored arguments. A burst of calls therefore collapses
//! into one invocation carrying the last call's arguments.
//!
//! Each instance cycles between two states for its whole life:
//!
//! ```text
//!        call                 call (rearm)
//! Idle --------> Armed <-----------------+
//!   ^              |                     |
//!   |   fired      +---------------------+
//!   +--------------+
//! ```

use crate::delay::Delay;
use crate::Result;
use clock::{Scheduler, TimerId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Whether a debouncer has an invocation waiting to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No timer pending
    Idle,
    /// A timer is pending and will fire unless another call rearms it
    Armed,
}

/// Debounced wrapper around a callback taking `A`
///
/// Callbacks with several arguments take them as a tuple. Clones share the
/// same timer slot.
pub struct Debouncer<A> {
    shared: Arc<Shared<A>>,
}

struct Shared<A> {
    callback: Box<dyn Fn(A) + Send + Sync>,
    delay: Delay,
    scheduler: Arc<dyn Scheduler>,
    slot: Mutex<Slot<A>>,
}

/// The one pending-timer slot
struct Slot<A> {
    pending: Option<TimerId>,
    last_args: Option<A>,
    /// Bumped on every call; a timer only fires if its generation is current
    generation: u64,
}

impl<A: Send + 'static> Debouncer<A> {
    /// Debounce `callback` against this thread's ambient time source
    ///
    /// That is the installed virtual clock if there is one, otherwise the
    /// real clock of the current tokio runtime.
    pub fn new<F>(callback: F, delay: impl Into<Delay>) -> Result<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let scheduler = clock::ambient()?;
        Ok(Self::with_scheduler(callback, delay, scheduler))
    }

    /// Debounce `callback` against an explicit time source
    pub fn with_scheduler<F>(
        callback: F,
        delay: impl Into<Delay>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                callback: Box::new(callback),
                delay: delay.into(),
                scheduler,
                slot: Mutex::new(Slot {
                    pending: None,
                    last_args: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Record `args` and restart the quiet period
    ///
    /// Never runs the callback synchronously, even with a zero delay.
    pub fn call(&self, args: A) {
        let shared = &self.shared;
        let mut slot = shared.slot.lock();

        let rearmed = match slot.pending.take() {
            Some(previous) => {
                shared.scheduler.cancel(previous);
                true
            }
            None => false,
        };

        slot.generation = slot.generation.wrapping_add(1);
        slot.last_args = Some(args);

        let generation = slot.generation;
        let owner = Arc::clone(shared);
        let id = shared
            .scheduler
            .schedule(shared.delay.as_duration(), Box::new(move || owner.fire(generation)));
        slot.pending = Some(id);

        tracing::trace!(%id, generation, rearmed, delay = %shared.delay, "debounce armed");
    }

    /// Current position in the idle/armed cycle
    pub fn state(&self) -> DebounceState {
        if self.shared.slot.lock().pending.is_some() {
            DebounceState::Armed
        } else {
            DebounceState::Idle
        }
    }

    /// The configured quiet period
    pub fn delay(&self) -> Duration {
        self.shared.delay.as_duration()
    }
}

impl<A> Shared<A> {
    fn fire(&self, generation: u64) {
        let args = {
            let mut slot = self.slot.lock();
            // A later call got in between; its own timer carries the args
            if slot.generation != generation {
                tracing::trace!(generation, current = slot.generation, "stale debounce timer skipped");
                return;
            }
            slot.pending = None;
            slot.last_args.take()
        };

        if let Some(args) = args {
            tracing::debug!(generation, "debounced callback firing");
            (self.callback)(args);
        }
    }
}

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A> std::fmt::Debug for Debouncer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.shared.slot.lock();
        f.debug_struct("Debouncer")
            .field("delay", &self.shared.delay)
            .field("pending", &slot.pending)
            .field("generation", &slot.generation)
            .finish()
    }
}

/// Wrap `callback` so that it only runs after `delay` of silence
///
/// Shorthand for [`Debouncer::new`] returning a plain callable.
pub fn debounce<A, F>(
    callback: F,
    delay: impl Into<Delay>,
) -> Result<impl Fn(A) + Clone + Send + Sync + 'static>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    let debouncer = Debouncer::new(callback, delay)?;
    Ok(move |args: A| debouncer.call(args))
}
