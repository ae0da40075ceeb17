//! Input validation for scheduling problems.
//!
//! Checks structural integrity of courses, classrooms, and the
//! configuration before generation. Detects:
//! - Duplicate IDs
//! - Courses with empty rosters
//! - Classrooms with zero capacity
//! - Configurations the engine cannot run with
//!
//! The generator repeats only the checks the failure taxonomy requires
//! (no courses, no classrooms, invalid configuration); this pre-flight
//! pass is for the import collaborator, which can surface every issue
//! at once to the operator.

use std::collections::HashSet;

use crate::models::{Classroom, Course, ScheduleConfig};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A course has no enrolled students.
    EmptyRoster,
    /// A classroom has zero capacity.
    ZeroCapacity,
    /// The configuration fails [`ScheduleConfig::validate`].
    InvalidConfig,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data for a generation request.
///
/// Checks:
/// 1. No duplicate course IDs
/// 2. No duplicate classroom IDs
/// 3. Every course has at least one enrolled student
/// 4. Every classroom seats at least one student
/// 5. The configuration passes [`ScheduleConfig::validate`]
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    courses: &[Course],
    classrooms: &[Classroom],
    config: &ScheduleConfig,
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut course_ids = HashSet::new();
    for course in courses {
        if !course_ids.insert(course.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate course ID: {}", course.id),
            ));
        }
        if course.students.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyRoster,
                format!("Course '{}' has no enrolled students", course.id),
            ));
        }
    }

    let mut classroom_ids = HashSet::new();
    for classroom in classrooms {
        if !classroom_ids.insert(classroom.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate classroom ID: {}", classroom.id),
            ));
        }
        if classroom.capacity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroCapacity,
                format!("Classroom '{}' has zero capacity", classroom.id),
            ));
        }
    }

    if let Err(err) = config.validate() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConfig,
            err.to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
