//! Exam scheduling domain models.
//!
//! Core data types for representing a timetabling problem and its
//! solution state: courses with rosters, classrooms with capacities,
//! the day/slot grid configuration, and the working schedule state
//! with its derived lookup indices.

mod assignment;
mod classroom;
mod config;
mod course;
mod state;

pub use assignment::ExamAssignment;
pub use classroom::Classroom;
pub use config::{ConfigError, ScheduleConfig, Strategy, TimeSlot, UnknownStrategyError};
pub use course::Course;
pub use state::ScheduleState;
