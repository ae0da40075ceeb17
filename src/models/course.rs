//! Course model.
//!
//! A course is the unit being scheduled: each course gets exactly one
//! exam, and its roster determines both the capacity it needs and the
//! conflicts it has with other courses.

use serde::{Deserialize, Serialize};

/// A course whose exam must be scheduled.
///
/// Immutable once handed to the engine; the roster drives capacity
/// requirements and the conflict graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier (e.g., "SE302").
    pub id: String,
    /// Identifiers of enrolled students.
    pub students: Vec<String>,
}

impl Course {
    /// Creates a course with an empty roster.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            students: Vec::new(),
        }
    }

    /// Sets the full roster.
    pub fn with_students<I, S>(mut self, students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.students = students.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a single student to the roster.
    pub fn with_student(mut self, student: impl Into<String>) -> Self {
        self.students.push(student.into());
        self
    }

    /// Number of enrolled students.
    #[inline]
    pub fn enrollment(&self) -> usize {
        self.students.len()
    }

    /// Whether a student is enrolled in this course.
    pub fn has_student(&self, student: &str) -> bool {
        self.students.iter().any(|s| s == student)
    }
}
