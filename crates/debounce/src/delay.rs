//! Validated quiet-period length

use crate::{DebounceError, Result};
use std::time::Duration;

/// Length of the quiet period before a debounced callback fires
///
/// Always non-negative. Signed or floating-point inputs go through the
/// fallible constructors, which reject instead of clamping.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Delay(Duration);

impl Delay {
    /// Fire on the next advance, with no further calls
    pub const ZERO: Delay = Delay(Duration::ZERO);

    /// Build from a signed millisecond count
    pub fn from_millis(millis: i64) -> Result<Self> {
        let millis = u64::try_from(millis)
            .map_err(|_| DebounceError::InvalidDelay(format!("{millis}ms")))?;
        Ok(Self(Duration::from_millis(millis)))
    }

    /// Build from fractional seconds
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        Duration::try_from_secs_f64(secs)
            .map(Self)
            .map_err(|_| DebounceError::InvalidDelay(format!("{secs}s")))
    }

    /// The delay as a standard duration
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for Delay {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<Delay> for Duration {
    fn from(delay: Delay) -> Self {
        delay.0
    }
}

impl std::fmt::Display for Delay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
