//! Manually driven clock for deterministic tests
//!
//! Virtual time starts at zero and only moves inside [`VirtualClock::advance`].
//! Due tasks run on the advancing thread, earliest deadline first, with ties
//! resolved by scheduling order.

use crate::{Scheduler, Task, TimerId};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Clock whose time is advanced explicitly
///
/// Cloning yields another handle to the same timeline.
#[derive(Clone, Default)]
pub struct VirtualClock {
    queue: Arc<Mutex<TimerQueue>>,
}

/// Pending tasks ordered by (deadline, allocation order)
#[derive(Default)]
struct TimerQueue {
    /// Elapsed virtual time
    now: Duration,
    /// Next handle to hand out
    next_id: u64,
    /// Scheduled tasks
    entries: BTreeMap<(Duration, TimerId), Task>,
    /// Handle -> deadline, for cancellation
    deadlines: AHashMap<TimerId, Duration>,
}

impl TimerQueue {
    /// Remove the earliest task due at or before `limit`
    fn pop_due(&mut self, limit: Duration) -> Option<(Duration, TimerId, Task)> {
        let (&(deadline, id), _) = self.entries.first_key_value()?;
        if deadline > limit {
            return None;
        }

        let task = self.entries.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        Some((deadline, id, task))
    }
}

impl VirtualClock {
    /// Create a clock at virtual time zero with nothing scheduled
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.queue.lock().now
    }

    /// Number of tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.queue.lock().entries.len()
    }

    /// Move virtual time forward by `by`, running every task that falls due
    ///
    /// Tasks run without the queue lock held, so they may schedule or cancel
    /// further work; anything they schedule inside the window also fires.
    /// A panicking task unwinds out of this call.
    ///
    /// Returns the number of tasks that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.queue.lock().now.saturating_add(by);
        let mut fired = 0;

        loop {
            let (deadline, id, task) = {
                let mut queue = self.queue.lock();
                match queue.pop_due(target) {
                    Some(due) => {
                        queue.now = queue.now.max(due.0);
                        due
                    }
                    None => {
                        queue.now = queue.now.max(target);
                        break;
                    }
                }
            };

            tracing::trace!(%id, at = ?deadline, "virtual timer fired");
            task();
            fired += 1;
        }

        tracing::debug!(by = ?by, fired, "virtual clock advanced");
        fired
    }
}

impl Scheduler for VirtualClock {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let mut queue = self.queue.lock();
        let id = TimerId::from_raw(queue.next_id);
        queue.next_id += 1;

        let deadline = queue.now.saturating_add(delay);
        queue.entries.insert((deadline, id), task);
        queue.deadlines.insert(id, deadline);

        tracing::trace!(%id, ?delay, ?deadline, "virtual timer scheduled");
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut queue = self.queue.lock();
        match queue.deadlines.remove(&id) {
            Some(deadline) => {
                queue.entries.remove(&(deadline, id));
                tracing::trace!(%id, "virtual timer cancelled");
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.lock();
        f.debug_struct("VirtualClock")
            .field("now", &queue.now)
            .field("pending", &queue.entries.len())
            .finish()
    }
}
