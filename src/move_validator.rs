//! Incremental validation of single proposed moves.
//!
//! Interactive editing surfaces probe "what if this exam moved here?"
//! far too often to re-run the global search. [`MoveValidator`] checks
//! one proposed `(course, day, slot, classroom)` against the current
//! state in O(existing assignments), without mutating anything, and
//! returns every violation as a structured record — the caller decides
//! whether hard violations block the move or are force-applied.

use serde::{Deserialize, Serialize};

use crate::context::ExamContext;
use crate::models::{ScheduleConfig, ScheduleState};

/// How many students are listed by name in a violation message before
/// the rest are elided. The `affected_students` field always carries
/// the full list.
const MESSAGE_STUDENT_LIMIT: usize = 5;

/// One violated rule for a proposed move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the violated constraint (e.g., "Student Conflict").
    pub constraint: String,
    /// Hard violations block by default; soft ones are informational.
    pub is_hard: bool,
    /// Human-readable description.
    pub message: String,
    /// Every student affected by this violation.
    pub affected_students: Vec<String>,
    /// The already scheduled course this move collides with, if one.
    pub conflicting_course: Option<String>,
}

impl Violation {
    fn hard(constraint: &str, message: impl Into<String>) -> Self {
        Self {
            constraint: constraint.to_string(),
            is_hard: true,
            message: message.into(),
            affected_students: Vec::new(),
            conflicting_course: None,
        }
    }

    fn soft(constraint: &str, message: impl Into<String>) -> Self {
        Self {
            is_hard: false,
            ..Self::hard(constraint, message)
        }
    }

    fn with_students(mut self, students: Vec<String>) -> Self {
        self.affected_students = students;
        self
    }

    fn against(mut self, course: impl Into<String>) -> Self {
        self.conflicting_course = Some(course.into());
        self
    }
}

/// Result of validating one proposed move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveValidation {
    violations: Vec<Violation>,
}

impl MoveValidation {
    /// Whether the move violates nothing at all.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether any violation is hard (blocking by default).
    pub fn has_hard_violations(&self) -> bool {
        self.violations.iter().any(|v| v.is_hard)
    }

    /// All violations, hard first in insertion order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    fn merge(&mut self, other: MoveValidation) {
        self.violations.extend(other.violations);
    }
}

/// Validates proposed moves against a schedule state.
pub struct MoveValidator<'a> {
    ctx: &'a ExamContext,
    config: &'a ScheduleConfig,
}

impl<'a> MoveValidator<'a> {
    /// Creates a validator over the given problem context.
    pub fn new(ctx: &'a ExamContext, config: &'a ScheduleConfig) -> Self {
        Self { ctx, config }
    }

    /// Validates moving `course_id` to `(day, slot, classroom_id)`.
    ///
    /// The state is read-only; the proposed course's own current
    /// placement (if any) is ignored, since the move would vacate it.
    /// Validating the same move twice against an unchanged state yields
    /// identical results.
    pub fn validate_move(
        &self,
        course_id: &str,
        day: i32,
        slot: i32,
        classroom_id: &str,
        state: &ScheduleState,
    ) -> MoveValidation {
        let mut result = MoveValidation::default();

        let Some(course) = self.ctx.course(course_id) else {
            result.push(Violation::hard(
                "Unknown Course",
                format!("course {course_id} not found"),
            ));
            return result;
        };

        match self.ctx.classroom(classroom_id) {
            None => {
                result.push(Violation::hard(
                    "Unknown Classroom",
                    format!("classroom {classroom_id} not found"),
                ));
            }
            Some(room) if !room.fits(course.enrollment()) => {
                result.push(Violation::hard(
                    "Capacity Exceeded",
                    format!(
                        "classroom {} has capacity {} but course {} has {} students",
                        classroom_id,
                        room.capacity,
                        course_id,
                        course.enrollment()
                    ),
                ));
            }
            Some(_) => {}
        }

        if let Some(occupant) = state
            .occupant_of(classroom_id, day, slot)
            .filter(|occupant| *occupant != course_id)
        {
            result.push(
                Violation::hard(
                    "Classroom Conflict",
                    format!("classroom {classroom_id} is already used by {occupant} at this time"),
                )
                .against(occupant),
            );
        }

        self.collect_student_conflicts(course_id, day, slot, state, &mut result);

        if !self.config.allow_back_to_back {
            self.collect_back_to_back_findings(course_id, day, slot, state, &mut result);
        }

        result
    }

    /// Re-validates every assigned exam in the state.
    ///
    /// Useful after reconstructing a schedule from storage or after a
    /// forced move.
    pub fn validate_schedule(&self, state: &ScheduleState) -> MoveValidation {
        let mut result = MoveValidation::default();
        for assignment in state.assigned() {
            if let Some(classroom_id) = assignment.classroom_id.as_deref() {
                result.merge(self.validate_move(
                    &assignment.course_id,
                    assignment.day,
                    assignment.slot,
                    classroom_id,
                    state,
                ));
            }
        }
        result
    }

    /// One "Student Conflict" record per conflicting course, carrying
    /// the complete shared-student list for display.
    fn collect_student_conflicts(
        &self,
        course_id: &str,
        day: i32,
        slot: i32,
        state: &ScheduleState,
        result: &mut MoveValidation,
    ) {
        let mut others: Vec<&str> = state
            .courses_at(day, slot)
            .filter(|other| *other != course_id)
            .collect();
        others.sort_unstable();

        for other in others {
            let shared = self.ctx.shared_students(course_id, other);
            if shared.is_empty() {
                continue;
            }
            result.push(
                Violation::hard(
                    "Student Conflict",
                    format!(
                        "{} student(s) have exams for both {} and {} at this time: {}",
                        shared.len(),
                        course_id,
                        other,
                        elide_students(&shared)
                    ),
                )
                .with_students(shared)
                .against(other),
            );
        }
    }

    /// Soft findings the operator may want to see when back-to-back
    /// exams are disallowed: adjacent-slot pairs and third-exam days.
    fn collect_back_to_back_findings(
        &self,
        course_id: &str,
        day: i32,
        slot: i32,
        state: &ScheduleState,
        result: &mut MoveValidation,
    ) {
        let mut neighbors: Vec<&str> = self
            .ctx
            .conflict_graph()
            .conflicts_of(course_id)
            .filter(|other| *other != course_id)
            .collect();
        neighbors.sort_unstable();

        for other in neighbors {
            let Some(assignment) = state.assignment(other).filter(|a| a.is_assigned()) else {
                continue;
            };
            if assignment.day == day && (assignment.slot - slot).abs() == 1 {
                let shared = self.ctx.shared_students(course_id, other);
                result.push(
                    Violation::soft(
                        "Consecutive Exams",
                        format!(
                            "{} and {} would be back-to-back on day {} for {} student(s)",
                            course_id,
                            other,
                            day + 1,
                            shared.len()
                        ),
                    )
                    .with_students(shared)
                    .against(other),
                );
            }
        }

        let Some(course) = self.ctx.course(course_id) else {
            return;
        };
        for student in &course.students {
            let same_day = self
                .ctx
                .courses_of_student(student)
                .iter()
                .filter(|other| other.as_str() != course_id)
                .filter_map(|other| state.assignment(other))
                .filter(|a| a.is_assigned() && a.day == day)
                .count();
            if same_day + 1 > 2 {
                result.push(
                    Violation::soft(
                        "Max Exams Per Day",
                        format!(
                            "student {} would have {} exams on day {} (max 2)",
                            student,
                            same_day + 1,
                            day + 1
                        ),
                    )
                    .with_students(vec![student.clone()]),
                );
            }
        }
    }
}

/// Formats a student list for a message, eliding past the first five.
fn elide_students(students: &[String]) -> String {
    if students.len() <= MESSAGE_STUDENT_LIMIT {
        students.join(", ")
    } else {
        format!(
            "{} and {} more",
            students[..MESSAGE_STUDENT_LIMIT].join(", "),
            students.len() - MESSAGE_STUDENT_LIMIT
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classroom, Course, ExamAssignment};
    use chrono::NaiveDate;

    fn sample_config() -> ScheduleConfig {
        ScheduleConfig::new(3, 4, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap())
    }

    fn sample_context() -> ExamContext {
        ExamContext::new(
            vec![
                Course::new("A").with_students(["s1", "s2", "s3"]),
                Course::new("B").with_students(["s2", "s3", "s4"]),
                Course::new("C").with_students(["s5"]),
                Course::new("D").with_students(["s1"]),
            ],
            vec![Classroom::new("R1", 10), Classroom::new("R2", 2)],
        )
    }

    fn seeded_state(ctx: &ExamContext) -> ScheduleState {
        let mut state = ScheduleState::new();
        for course in ctx.courses() {
            state.add_assignment(
                ExamAssignment::new(&course.id).with_student_count(course.enrollment()),
            );
        }
        state
    }

    #[test]
    fn test_valid_move() {
        let ctx = sample_context();
        let config = sample_config();
        let state = seeded_state(&ctx);
        let validator = MoveValidator::new(&ctx, &config);

        let result = validator.validate_move("A", 0, 0, "R1", &state);
        assert!(result.is_valid());
        assert!(!result.has_hard_violations());
    }

    #[test]
    fn test_unknown_course_short_circuits() {
        let ctx = sample_context();
        let config = sample_config();
        let state = seeded_state(&ctx);
        let validator = MoveValidator::new(&ctx, &config);

        let result = validator.validate_move("GHOST", 0, 0, "R1", &state);
        assert_eq!(result.violations().len(), 1);
        assert_eq!(result.violations()[0].constraint, "Unknown Course");
        assert!(result.has_hard_violations());
    }

    #[test]
    fn test_unknown_classroom() {
        let ctx = sample_context();
        let config = sample_config();
        let state = seeded_state(&ctx);
        let validator = MoveValidator::new(&ctx, &config);

        let result = validator.validate_move("A", 0, 0, "R9", &state);
        assert!(result
            .violations()
            .iter()
            .any(|v| v.constraint == "Unknown Classroom"));
    }

    #[test]
    fn test_capacity_exceeded() {
        let ctx = sample_context();
        let config = sample_config();
        let state = seeded_state(&ctx);
        let validator = MoveValidator::new(&ctx, &config);

        // A has 3 students, R2 seats 2
        let result = validator.validate_move("A", 0, 0, "R2", &state);
        let violation = &result.violations()[0];
        assert_eq!(violation.constraint, "Capacity Exceeded");
        assert!(violation.message.contains("capacity 2"));
    }

    #[test]
    fn test_classroom_conflict_names_occupant() {
        let ctx = sample_context();
        let config = sample_config();
        let mut state = seeded_state(&ctx);
        state.update_assignment("C", 1, 2, "R1");
        let validator = MoveValidator::new(&ctx, &config);

        let result = validator.validate_move("D", 1, 2, "R1", &state);
        let violation = result
            .violations()
            .iter()
            .find(|v| v.constraint == "Classroom Conflict")
            .unwrap();
        assert_eq!(violation.conflicting_course.as_deref(), Some("C"));
    }

    #[test]
    fn test_student_conflicts_grouped_with_full_lists() {
        let ctx = sample_context();
        let config = sample_config();
        let mut state = seeded_state(&ctx);
        state.update_assignment("B", 0, 1, "R1");
        let validator = MoveValidator::new(&ctx, &config);

        // A shares s2 and s3 with B; different room, same slot
        let result = validator.validate_move("A", 0, 1, "R2", &state);
        let conflict = result
            .violations()
            .iter()
            .find(|v| v.constraint == "Student Conflict")
            .unwrap();
        assert_eq!(conflict.conflicting_course.as_deref(), Some("B"));
        assert_eq!(conflict.affected_students, vec!["s2", "s3"]);
        assert!(conflict.message.contains("2 student(s)"));
    }

    #[test]
    fn test_moving_course_ignores_its_own_placement() {
        let ctx = sample_context();
        let config = sample_config();
        let mut state = seeded_state(&ctx);
        state.update_assignment("A", 0, 0, "R1");
        let validator = MoveValidator::new(&ctx, &config);

        // Re-proposing A's own slot must not conflict with itself
        let result = validator.validate_move("A", 0, 0, "R1", &state);
        assert!(result.is_valid());
    }

    #[test]
    fn test_idempotent_against_unchanged_state() {
        let ctx = sample_context();
        let config = sample_config();
        let mut state = seeded_state(&ctx);
        state.update_assignment("B", 0, 1, "R1");
        state.update_assignment("C", 0, 1, "R2");
        let validator = MoveValidator::new(&ctx, &config);

        let first = validator.validate_move("A", 0, 1, "R2", &state);
        let second = validator.validate_move("A", 0, 1, "R2", &state);

        assert_eq!(first.violations().len(), second.violations().len());
        for (a, b) in first.violations().iter().zip(second.violations()) {
            assert_eq!(a.constraint, b.constraint);
            assert_eq!(a.message, b.message);
            assert_eq!(a.affected_students, b.affected_students);
            assert_eq!(a.conflicting_course, b.conflicting_course);
        }
    }

    #[test]
    fn test_soft_findings_when_back_to_back_disallowed() {
        let ctx = sample_context();
        let config = sample_config().with_allow_back_to_back(false);
        let mut state = seeded_state(&ctx);
        state.update_assignment("B", 0, 1, "R1");
        let validator = MoveValidator::new(&ctx, &config);

        // A shares students with B; slot 2 is adjacent to B's slot 1
        let result = validator.validate_move("A", 0, 2, "R1", &state);
        let soft = result
            .violations()
            .iter()
            .find(|v| v.constraint == "Consecutive Exams")
            .unwrap();
        assert!(!soft.is_hard);
        assert_eq!(soft.conflicting_course.as_deref(), Some("B"));
        assert!(!result.has_hard_violations());

        // Same probe with back-to-back allowed reports nothing
        let relaxed_config = sample_config();
        let relaxed = MoveValidator::new(&ctx, &relaxed_config);
        assert!(relaxed.validate_move("A", 0, 2, "R1", &state).is_valid());
    }

    #[test]
    fn test_third_exam_of_day_reported() {
        let ctx = ExamContext::new(
            vec![
                Course::new("A").with_student("s"),
                Course::new("B").with_student("s"),
                Course::new("C").with_student("s"),
            ],
            vec![Classroom::new("R1", 10)],
        );
        let config = sample_config().with_allow_back_to_back(false);
        let mut state = seeded_state(&ctx);
        state.update_assignment("A", 0, 0, "R1");
        state.update_assignment("B", 0, 2, "R1");
        let validator = MoveValidator::new(&ctx, &config);

        // C would be s's third exam on day 0
        let result = validator.validate_move("C", 0, 3, "R1", &state);
        assert!(result
            .violations()
            .iter()
            .any(|v| v.constraint == "Max Exams Per Day" && v.affected_students == ["s"]));
    }

    #[test]
    fn test_validate_schedule_flags_forced_move() {
        let ctx = sample_context();
        let config = sample_config();
        let mut state = seeded_state(&ctx);
        // A and B share students yet sit in the same slot (as if force-applied)
        state.update_assignment("A", 0, 0, "R1");
        state.update_assignment("B", 0, 0, "R2");
        let validator = MoveValidator::new(&ctx, &config);

        let result = validator.validate_schedule(&state);
        assert!(result.has_hard_violations());
        // Both directions of the pair are reported
        assert_eq!(
            result
                .violations()
                .iter()
                .filter(|v| v.constraint == "Student Conflict")
                .count(),
            2
        );
    }

    #[test]
    fn test_elide_students() {
        let few: Vec<String> = (0..3).map(|i| format!("s{i}")).collect();
        assert_eq!(elide_students(&few), "s0, s1, s2");

        let many: Vec<String> = (0..8).map(|i| format!("s{i}")).collect();
        let elided = elide_students(&many);
        assert!(elided.ends_with("and 3 more"));
        assert!(elided.contains("s4"));
        assert!(!elided.contains("s5,"));
    }
}
