//! Exam timetabling engine.
//!
//! Assigns each course's exam to a (day, time-slot, classroom) triple
//! subject to hard constraints (no double-booked rooms, sufficient
//! capacity, no student in two exams at once) and scored preferences
//! (day packing, room reuse, student-friendly spacing). The engine is
//! pure computation: roster import, persistence, and presentation are
//! collaborators that talk to it through the types in this crate.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Course`, `Classroom`,
//!   `ScheduleConfig`, `ExamAssignment`, `ScheduleState`
//! - **`context`**: `ExamContext`, the explicit problem context passed
//!   into every entry point
//! - **`conflict`**: shared-student conflict graph
//! - **`constraints`**: pluggable hard/soft rules and the standard set
//! - **`solver`**: MRV+LCV backtracking search, objective scoring, and
//!   the multi-restart `ScheduleGenerator`
//! - **`move_validator`**: incremental validation of single proposed
//!   moves for interactive editing
//! - **`validation`**: input integrity pre-flight (duplicate IDs, empty
//!   rosters)
//!
//! # Architecture
//!
//! The conflict graph is built once per course set and feeds both the
//! student-conflict constraint and the search's degree tie-break. The
//! search and the generator mutate a `ScheduleState` whose derived
//! indices stay in exact lockstep with its assignments; the move
//! validator reads the same state without ever mutating it.
//!
//! # References
//!
//! - Russell & Norvig (2020), "Artificial Intelligence: A Modern
//!   Approach", Ch. 6: Constraint Satisfaction Problems
//! - Schaerf (1999), "A Survey of Automated Timetabling"

pub mod conflict;
pub mod constraints;
pub mod context;
pub mod models;
pub mod move_validator;
pub mod solver;
pub mod validation;
