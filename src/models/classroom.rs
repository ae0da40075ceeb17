//! Classroom model.
//!
//! Classrooms are the spatial resource of the timetable: one exam per
//! classroom per time slot, bounded by seating capacity.

use serde::{Deserialize, Serialize};

/// An exam room with a fixed seating capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    /// Unique classroom identifier (e.g., "Room_101").
    pub id: String,
    /// Seating capacity (must be at least 1).
    pub capacity: u32,
}

impl Classroom {
    /// Creates a classroom.
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            capacity,
        }
    }

    /// Whether this room can seat the given number of students.
    #[inline]
    pub fn fits(&self, students: usize) -> bool {
        self.capacity as usize >= students
    }

    /// Trailing numeric portion of the identifier, if any.
    ///
    /// "Room_101" → Some(101). Used by the minimize-classrooms objective
    /// to prefer lower-numbered rooms.
    pub fn numeric_suffix(&self) -> Option<u64> {
        let digits: String = self.id.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}
