//! Working-hours gate.
//!
//! The DUW endpoint reports queues as active on weekends and at night, which
//! would produce alerts nobody can act on. [`WorkingHoursMonitor`] skips
//! checks outside a weekday UTC hour window and otherwise delegates.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use tracing::debug;

use super::monitor::{CheckOutcome, MonitorError, QueueMonitor};
use super::record::MonitorState;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Weekday hour window, in UTC, as `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl WorkingHours {
    /// 06:00 to 18:00 UTC.
    pub const DEFAULT: Self = Self {
        start_hour: 6,
        end_hour: 18,
    };

    /// Returns `None` unless `start_hour < end_hour <= 24`.
    pub fn new(start_hour: u32, end_hour: u32) -> Option<Self> {
        (start_hour < end_hour && end_hour <= 24).then_some(WorkingHours {
            start_hour,
            end_hour,
        })
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let hour = now.hour();
        hour >= self.start_hour && hour < self.end_hour
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Wraps a monitor so checks only run during working hours.
#[derive(Debug)]
pub struct WorkingHoursMonitor<M, C = SystemClock> {
    inner: M,
    clock: C,
    hours: WorkingHours,
}

impl<M: QueueMonitor, C: Clock> WorkingHoursMonitor<M, C> {
    pub fn new(inner: M, clock: C, hours: WorkingHours) -> Self {
        WorkingHoursMonitor {
            inner,
            clock,
            hours,
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: QueueMonitor, C: Clock> QueueMonitor for WorkingHoursMonitor<M, C> {
    fn init(&mut self, record: Option<&MonitorState>) {
        self.inner.init(record);
    }

    fn state(&self) -> MonitorState {
        self.inner.state()
    }

    async fn check_and_process(&mut self) -> Result<CheckOutcome, MonitorError> {
        let now = self.clock.now();
        if !self.hours.contains(now) {
            debug!(
                start_hour = self.hours.start_hour,
                end_hour = self.hours.end_hour,
                "Outside working hours, skipping status check"
            );
            return Ok(CheckOutcome::Skipped);
        }

        self.inner.check_and_process().await
    }
}
