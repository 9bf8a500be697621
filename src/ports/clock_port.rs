//! Wall clock port trait.

use chrono::NaiveDateTime;

pub trait ClockPort: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}
