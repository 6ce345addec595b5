//! Wall-clock scheduler on top of the tokio timer

use crate::{ClockError, Result, Scheduler, Task, TimerId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Scheduler that sleeps on a tokio runtime
///
/// Each scheduled task is a spawned sleep. A task claims its slot in the
/// timer table before running, and `cancel` claims it before aborting, so
/// exactly one of the two wins.
#[derive(Clone)]
pub struct RealClock {
    runtime: Handle,
    /// Live timers; the abort handle is filled in right after spawning
    timers: Arc<DashMap<TimerId, Option<AbortHandle>>>,
    next_id: Arc<AtomicU64>,
}

impl RealClock {
    /// Bind to the tokio runtime active on the calling thread
    pub fn try_current() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ClockError::NoRuntime)?;
        Ok(Self::with_handle(runtime))
    }

    /// Bind to an explicit runtime
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            timers: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of timers that have neither fired nor been cancelled
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for RealClock {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));

        // Register before spawning so a zero-delay timer cannot miss its slot
        self.timers.insert(id, None);

        let claim = TimerClaim {
            timers: self.timers.clone(),
            id,
        };
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if claim.take() {
                tracing::trace!(%id, "timer fired");
                task();
            }
        });

        if let Some(mut slot) = self.timers.get_mut(&id) {
            *slot = Some(join.abort_handle());
        }

        tracing::trace!(%id, ?delay, "timer spawned");
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        match self.timers.remove(&id) {
            Some((_, abort)) => {
                if let Some(abort) = abort {
                    abort.abort();
                }
                tracing::trace!(%id, "timer aborted");
                true
            }
            None => false,
        }
    }
}

/// A timer's hold on its table slot
///
/// Travels inside the spawned future. If the future is dropped without
/// claiming the slot (runtime shut down before it fired), the slot is freed
/// so the timer stops counting as pending.
struct TimerClaim {
    timers: Arc<DashMap<TimerId, Option<AbortHandle>>>,
    id: TimerId,
}

impl TimerClaim {
    /// Claim the slot for firing; `false` if `cancel` got there first
    fn take(&self) -> bool {
        self.timers.remove(&self.id).is_some()
    }
}

impl Drop for TimerClaim {
    fn drop(&mut self) {
        if self.take() {
            tracing::warn!(id = %self.id, "timer dropped before firing; runtime shut down?");
        }
    }
}

impl std::fmt::Debug for RealClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealClock")
            .field("pending", &self.timers.len())
            .finish()
    }
}
