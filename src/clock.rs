use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

/// Source of "now" for everything that depends on the current day.
pub trait Clock: Send + Sync {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub use fixed::FixedClock;

#[cfg(test)]
mod fixed {
    use std::sync::Mutex;

    use chrono::NaiveDateTime;

    use super::Clock;

    /// Settable clock for tests.
    pub struct FixedClock(Mutex<NaiveDateTime>);

    impl FixedClock {
        pub fn at(now: NaiveDateTime) -> Self {
            FixedClock(Mutex::new(now))
        }

        pub fn set(&self, now: NaiveDateTime) {
            *self.0.lock().unwrap() = now;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }
}
