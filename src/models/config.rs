//! Scheduling configuration and time-slot resolution.
//!
//! The exam period is a grid of `num_days × slots_per_day` slots. An
//! assignment stores only `(day, slot)` indices; the concrete calendar
//! window is a value computed on demand from the configuration, so
//! copied schedule states never share time objects.

use std::str::FromStr;
use std::time::Duration;

use chrono::{Days, NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Optimization goal used for value ordering and schedule scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Pack exams into as few days as possible.
    MinimizeDays,
    /// Use as few distinct classrooms as possible.
    MinimizeClassrooms,
    /// Minimize same-day gaps and edge-of-day slots for students.
    StudentFriendly,
}

/// Error returned when a strategy name is not recognized.
#[derive(Debug, Error)]
#[error("unknown optimization strategy: {0}")]
pub struct UnknownStrategyError(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategyError;

    /// Parses a strategy name.
    ///
    /// Legacy names from earlier releases are normalized here, once,
    /// rather than at evaluation sites: `default` and
    /// `balanced-distribution` map to [`Strategy::StudentFriendly`];
    /// `balance-classrooms` and `maximize-room-usage` map to
    /// [`Strategy::MinimizeClassrooms`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimize-days" => Ok(Self::MinimizeDays),
            "minimize-classrooms" | "balance-classrooms" | "maximize-room-usage" => {
                Ok(Self::MinimizeClassrooms)
            }
            "student-friendly" | "balanced-distribution" | "default" => Ok(Self::StudentFriendly),
            other => Err(UnknownStrategyError(other.to_string())),
        }
    }
}

/// A concrete calendar window for one exam slot.
///
/// Value type derived from `(day, slot)` and the configuration; it is
/// never stored inside assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Calendar date of the slot.
    pub date: NaiveDate,
    /// Slot start time.
    pub start: NaiveTime,
    /// Slot end time.
    pub end: NaiveTime,
}

/// Configuration error detected before any search work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("number of days must be positive")]
    ZeroDays,
    #[error("slots per day must be positive")]
    ZeroSlots,
    #[error("slot duration must be positive")]
    ZeroDuration,
    #[error("search timeout must be positive")]
    ZeroTimeout,
}

/// Parameters for one schedule generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Number of exam days.
    pub num_days: u32,
    /// Number of time slots per day.
    pub slots_per_day: u32,
    /// Calendar date of day 0.
    pub start_date: NaiveDate,
    /// Duration of each slot in minutes.
    pub slot_duration_minutes: u32,
    /// Break between consecutive slots in minutes.
    pub break_minutes: u32,
    /// Start time of the first slot each day.
    pub day_start: NaiveTime,
    /// Optimization goal.
    pub strategy: Strategy,
    /// Whether a student may sit exams in adjacent slots.
    ///
    /// When false, the no-consecutive-exam and max-two-per-day
    /// constraints are enforced during search.
    pub allow_back_to_back: bool,
    /// Wall-clock budget for the whole generation request.
    pub timeout: Duration,
}

impl ScheduleConfig {
    /// Creates a configuration with the given grid and start date.
    ///
    /// Defaults: 120-minute slots, 30-minute breaks, 09:00 day start,
    /// student-friendly strategy, back-to-back allowed, 60 s timeout.
    pub fn new(num_days: u32, slots_per_day: u32, start_date: NaiveDate) -> Self {
        Self {
            num_days,
            slots_per_day,
            start_date,
            slot_duration_minutes: 120,
            break_minutes: 30,
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            strategy: Strategy::StudentFriendly,
            allow_back_to_back: true,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the slot duration.
    pub fn with_slot_duration(mut self, minutes: u32) -> Self {
        self.slot_duration_minutes = minutes;
        self
    }

    /// Sets the break between slots.
    pub fn with_break(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Sets the start time of the first slot.
    pub fn with_day_start(mut self, start: NaiveTime) -> Self {
        self.day_start = start;
        self
    }

    /// Sets the optimization strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets whether back-to-back exams are allowed.
    pub fn with_allow_back_to_back(mut self, allow: bool) -> Self {
        self.allow_back_to_back = allow;
        self
    }

    /// Sets the search timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_days == 0 {
            return Err(ConfigError::ZeroDays);
        }
        if self.slots_per_day == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        if self.slot_duration_minutes == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Total number of slots in the exam period.
    #[inline]
    pub fn total_slots(&self) -> u32 {
        self.num_days * self.slots_per_day
    }

    /// Resolves `(day, slot)` to a calendar window.
    ///
    /// Returns `None` for indices outside the configured grid.
    pub fn time_slot(&self, day: i32, slot: i32) -> Option<TimeSlot> {
        if day < 0 || day as u32 >= self.num_days || slot < 0 || slot as u32 >= self.slots_per_day
        {
            return None;
        }

        let date = self.start_date.checked_add_days(Days::new(day as u64))?;
        let stride = (self.slot_duration_minutes + self.break_minutes) as i64;
        let start = self.day_start + TimeDelta::minutes(slot as i64 * stride);
        let end = start + TimeDelta::minutes(self.slot_duration_minutes as i64);

        Some(TimeSlot { date, start, end })
    }

    /// Converts a flat slot index to `(day, slot)`.
    pub fn flat_to_day_slot(&self, flat: u32) -> (i32, i32) {
        ((flat / self.slots_per_day) as i32, (flat % self.slots_per_day) as i32)
    }

    /// Converts `(day, slot)` to a flat slot index.
    pub fn day_slot_to_flat(&self, day: i32, slot: i32) -> u32 {
        day as u32 * self.slots_per_day + slot as u32
    }

    /// Human-readable label like "Day 1 - 09:00-11:00".
    pub fn slot_label(&self, day: i32, slot: i32) -> String {
        match self.time_slot(day, slot) {
            Some(ts) => format!(
                "Day {} - {}-{}",
                day + 1,
                ts.start.format("%H:%M"),
                ts.end.format("%H:%M")
            ),
            None => "Invalid Slot".to_string(),
        }
    }
}
