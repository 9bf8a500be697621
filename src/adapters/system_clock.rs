//! Local wall clock.

use chrono::{Local, NaiveDateTime};

use crate::ports::clock_port::ClockPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
