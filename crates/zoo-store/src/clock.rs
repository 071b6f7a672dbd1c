//! Time source for audit stamps and expiry checks

use chrono::{DateTime, Utc};

/// Source of the current UTC time
///
/// Injected wherever timestamps or TTLs are computed so tests can pin time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time
    fn now(&self) -> DateTime<Utc>;

    /// Current time as epoch seconds
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
