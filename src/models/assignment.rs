//! Exam assignment model.
//!
//! An assignment binds a course to a `(day, slot, classroom)` triple.
//! Unassigned components use sentinels (−1 / `None`) so that a partially
//! built schedule can carry every course from the start of a search.
//! The assignment list is also the persistence wire format: a finished
//! schedule is serialized as these triples and reconstructed via
//! [`ScheduleState::from_assignments`](super::ScheduleState::from_assignments).

use serde::{Deserialize, Serialize};

/// The exam placement of one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamAssignment {
    /// Course being examined.
    pub course_id: String,
    /// Day index (0-based, −1 = unassigned).
    pub day: i32,
    /// Slot index within the day (0-based, −1 = unassigned).
    pub slot: i32,
    /// Assigned classroom (`None` = unassigned).
    pub classroom_id: Option<String>,
    /// Cached enrollment of the course.
    pub student_count: usize,
    /// Locked assignments are never moved by the engine or by editors.
    pub locked: bool,
}

impl ExamAssignment {
    /// Creates an unassigned exam for a course.
    pub fn new(course_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            day: -1,
            slot: -1,
            classroom_id: None,
            student_count: 0,
            locked: false,
        }
    }

    /// Creates a fully assigned exam.
    pub fn assigned(
        course_id: impl Into<String>,
        day: i32,
        slot: i32,
        classroom_id: impl Into<String>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            day,
            slot,
            classroom_id: Some(classroom_id.into()),
            student_count: 0,
            locked: false,
        }
    }

    /// Sets the cached enrollment.
    pub fn with_student_count(mut self, count: usize) -> Self {
        self.student_count = count;
        self
    }

    /// Marks the assignment as locked.
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Whether the exam has a complete placement.
    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.day >= 0 && self.slot >= 0 && self.classroom_id.is_some()
    }

    /// The `(day, slot)` key, if assigned.
    #[inline]
    pub fn slot_key(&self) -> Option<(i32, i32)> {
        if self.is_assigned() {
            Some((self.day, self.slot))
        } else {
            None
        }
    }

    /// Whether two exams occupy the same `(day, slot)` regardless of room.
    pub fn same_time_as(&self, other: &ExamAssignment) -> bool {
        self.is_assigned() && other.is_assigned() && self.day == other.day && self.slot == other.slot
    }

    /// Whether two exams claim the same classroom at the same time.
    pub fn conflicts_with(&self, other: &ExamAssignment) -> bool {
        self.same_time_as(other) && self.classroom_id == other.classroom_id
    }

    /// Resets the placement, keeping course identity and lock state.
    pub(crate) fn clear(&mut self) {
        self.day = -1;
        self.slot = -1;
        self.classroom_id = None;
    }
}
