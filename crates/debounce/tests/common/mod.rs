//! Shared helpers for debounce integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Route `tracing` output through the test harness's captured stdout
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Records every argument a callback receives
pub struct CallLog<T> {
    calls: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> CallLog<T> {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback that appends to this log
    pub fn callback(&self) -> impl Fn(T) + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |value| calls.lock().push(value)
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<T> {
        self.calls.lock().clone()
    }

    pub fn last(&self) -> Option<T> {
        self.calls.lock().last().cloned()
    }
}

impl<T: Clone + Send + 'static> Default for CallLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
