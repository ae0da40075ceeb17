//! Scheduling constraints.
//!
//! Each rule is an independent [`Constraint`] evaluated against a
//! candidate assignment and the current schedule state. Hard
//! constraints must hold in any accepted assignment; the two soft
//! rules (no-consecutive-exam, max-two-per-day) are enforced only when
//! the configuration disallows back-to-back exams, in which case they
//! gate acceptance exactly like hard rules. Softer preferences are
//! expressed through schedule scoring, not here.

use std::fmt::Debug;

use crate::context::ExamContext;
use crate::models::{ExamAssignment, ScheduleState};

/// A rule that a candidate assignment must satisfy.
///
/// The candidate is *not* yet part of `state`; implementations compare
/// it against the committed assignments only, skipping the candidate's
/// own course wherever it may already appear (the incremental validator
/// probes moves of already placed exams).
pub trait Constraint: Debug + Send + Sync {
    /// Constraint identifier (e.g., "capacity").
    fn name(&self) -> &'static str;

    /// Whether this rule must hold in any accepted assignment.
    fn is_hard(&self) -> bool;

    /// Checks the candidate against the current state.
    fn is_satisfied(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> bool;

    /// Explains the violation, or `None` when satisfied.
    fn violation_message(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> Option<String>;
}

/// Hard: the classroom must seat the course's enrollment.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityConstraint;

impl Constraint for CapacityConstraint {
    fn name(&self) -> &'static str {
        "capacity"
    }

    fn is_hard(&self) -> bool {
        true
    }

    fn is_satisfied(
        &self,
        candidate: &ExamAssignment,
        _state: &ScheduleState,
        ctx: &ExamContext,
    ) -> bool {
        let Some(classroom_id) = candidate.classroom_id.as_deref() else {
            return true; // unassigned candidates are vacuously fine
        };
        ctx.classroom(classroom_id)
            .is_some_and(|room| room.fits(candidate.student_count))
    }

    fn violation_message(
        &self,
        candidate: &ExamAssignment,
        _state: &ScheduleState,
        ctx: &ExamContext,
    ) -> Option<String> {
        let classroom_id = candidate.classroom_id.as_deref()?;
        let room = ctx.classroom(classroom_id)?;
        if room.fits(candidate.student_count) {
            return None;
        }
        Some(format!(
            "classroom {} has capacity {} but course {} has {} students",
            classroom_id, room.capacity, candidate.course_id, candidate.student_count
        ))
    }
}

/// Hard: no other assigned course may hold the same classroom at the
/// same `(day, slot)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassroomConflictConstraint;

impl ClassroomConflictConstraint {
    /// The committed course colliding with the candidate, if any.
    fn occupant<'a>(candidate: &ExamAssignment, state: &'a ScheduleState) -> Option<&'a str> {
        let classroom_id = candidate.classroom_id.as_deref()?;
        state
            .occupant_of(classroom_id, candidate.day, candidate.slot)
            .filter(|occupant| *occupant != candidate.course_id)
    }
}

impl Constraint for ClassroomConflictConstraint {
    fn name(&self) -> &'static str {
        "classroom-conflict"
    }

    fn is_hard(&self) -> bool {
        true
    }

    fn is_satisfied(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        _ctx: &ExamContext,
    ) -> bool {
        !candidate.is_assigned() || Self::occupant(candidate, state).is_none()
    }

    fn violation_message(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        _ctx: &ExamContext,
    ) -> Option<String> {
        let occupant = Self::occupant(candidate, state)?;
        Some(format!(
            "classroom {} is already used by {} at day {}, slot {}",
            candidate.classroom_id.as_deref().unwrap_or("?"),
            occupant,
            candidate.day + 1,
            candidate.slot + 1
        ))
    }
}

/// Hard: no course sharing a student may sit in the same `(day, slot)`.
///
/// Looked up through the conflict graph and the slot index, so the cost
/// is O(degree), not O(courses).
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentConflictConstraint;

impl StudentConflictConstraint {
    fn conflicting_course<'a>(
        candidate: &ExamAssignment,
        state: &'a ScheduleState,
        ctx: &ExamContext,
    ) -> Option<&'a str> {
        if !candidate.is_assigned() {
            return None;
        }
        let at_slot: std::collections::HashSet<&str> =
            state.courses_at(candidate.day, candidate.slot).collect();
        ctx.conflict_graph()
            .conflicts_of(&candidate.course_id)
            .find_map(|neighbor| at_slot.get(neighbor).copied())
    }
}

impl Constraint for StudentConflictConstraint {
    fn name(&self) -> &'static str {
        "student-conflict"
    }

    fn is_hard(&self) -> bool {
        true
    }

    fn is_satisfied(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> bool {
        Self::conflicting_course(candidate, state, ctx).is_none()
    }

    fn violation_message(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> Option<String> {
        let other = Self::conflicting_course(candidate, state, ctx)?;
        let shared = ctx.shared_students(&candidate.course_id, other);
        Some(format!(
            "{} student(s) have exams for both {} and {} at day {}, slot {}",
            shared.len(),
            candidate.course_id,
            other,
            candidate.day + 1,
            candidate.slot + 1
        ))
    }
}

/// Soft: no student sits exams in adjacent slots on the same day.
///
/// Enforced during search only when the configuration disallows
/// back-to-back exams.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConsecutiveExamConstraint;

impl NoConsecutiveExamConstraint {
    fn adjacent_course<'a>(
        candidate: &ExamAssignment,
        state: &'a ScheduleState,
        ctx: &ExamContext,
    ) -> Option<&'a ExamAssignment> {
        if !candidate.is_assigned() {
            return None;
        }
        // A shared student is exactly a conflict-graph edge.
        ctx.conflict_graph()
            .conflicts_of(&candidate.course_id)
            .filter_map(|neighbor| state.assignment(neighbor))
            .find(|other| {
                other.is_assigned()
                    && other.day == candidate.day
                    && (other.slot - candidate.slot).abs() == 1
            })
    }
}

impl Constraint for NoConsecutiveExamConstraint {
    fn name(&self) -> &'static str {
        "no-consecutive-exam"
    }

    fn is_hard(&self) -> bool {
        false
    }

    fn is_satisfied(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> bool {
        Self::adjacent_course(candidate, state, ctx).is_none()
    }

    fn violation_message(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> Option<String> {
        let other = Self::adjacent_course(candidate, state, ctx)?;
        Some(format!(
            "back-to-back exams on day {}: {} (slot {}) and {} (slot {}) share students",
            candidate.day + 1,
            other.course_id,
            other.slot + 1,
            candidate.course_id,
            candidate.slot + 1
        ))
    }
}

/// Soft: no student sits more than two exams on one day.
///
/// Enforced during search only when the configuration disallows
/// back-to-back exams.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxTwoPerDayConstraint;

impl MaxTwoPerDayConstraint {
    /// A student of the candidate course who already has two exams that
    /// day, with the count the new assignment would produce.
    fn overloaded_student(
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> Option<(String, usize)> {
        if !candidate.is_assigned() {
            return None;
        }
        let course = ctx.course(&candidate.course_id)?;
        for student in &course.students {
            let same_day = ctx
                .courses_of_student(student)
                .iter()
                .filter(|other| other.as_str() != candidate.course_id)
                .filter_map(|other| state.assignment(other))
                .filter(|a| a.is_assigned() && a.day == candidate.day)
                .count();
            if same_day + 1 > 2 {
                return Some((student.clone(), same_day + 1));
            }
        }
        None
    }
}

impl Constraint for MaxTwoPerDayConstraint {
    fn name(&self) -> &'static str {
        "max-two-per-day"
    }

    fn is_hard(&self) -> bool {
        false
    }

    fn is_satisfied(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> bool {
        Self::overloaded_student(candidate, state, ctx).is_none()
    }

    fn violation_message(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> Option<String> {
        let (student, count) = Self::overloaded_student(candidate, state, ctx)?;
        Some(format!(
            "student {} would have {} exams on day {} (max 2)",
            student,
            count,
            candidate.day + 1
        ))
    }
}

/// An ordered collection of constraints evaluated together.
#[derive(Debug, Default)]
pub struct ConstraintSet {
    constraints: Vec<Box<dyn Constraint>>,
}

impl ConstraintSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule set: capacity, classroom conflict and student
    /// conflict (hard), plus no-consecutive-exam and max-two-per-day
    /// (soft, gated by the back-to-back flag).
    pub fn standard() -> Self {
        Self::new()
            .with_constraint(CapacityConstraint)
            .with_constraint(ClassroomConflictConstraint)
            .with_constraint(StudentConflictConstraint)
            .with_constraint(NoConsecutiveExamConstraint)
            .with_constraint(MaxTwoPerDayConstraint)
    }

    /// Adds a constraint.
    pub fn with_constraint<C: Constraint + 'static>(mut self, constraint: C) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Iterates over the registered constraints.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Constraint> {
        self.constraints.iter().map(Box::as_ref)
    }

    /// Whether the candidate is acceptable.
    ///
    /// Hard constraints always apply; soft constraints apply only when
    /// `enforce_soft` is set (configuration disallows back-to-back).
    pub fn is_consistent(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
        enforce_soft: bool,
    ) -> bool {
        self.constraints
            .iter()
            .filter(|c| c.is_hard() || enforce_soft)
            .all(|c| c.is_satisfied(candidate, state, ctx))
    }

    /// Messages of every violated constraint, hard and soft.
    pub fn violation_messages(
        &self,
        candidate: &ExamAssignment,
        state: &ScheduleState,
        ctx: &ExamContext,
    ) -> Vec<String> {
        self.constraints
            .iter()
            .filter_map(|c| c.violation_message(candidate, state, ctx))
            .collect()
    }

    /// Number of registered constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classroom, Course};

    fn sample_context() -> ExamContext {
        ExamContext::new(
            vec![
                Course::new("A").with_students(["s1", "s2"]),
                Course::new("B").with_students(["s2", "s3"]),
                Course::new("C").with_students(["s4"]),
                Course::new("D").with_students(["s2"]),
            ],
            vec![Classroom::new("R1", 2), Classroom::new("R2", 1)],
        )
    }

    fn state_with(assignments: &[(&str, i32, i32, &str)]) -> ScheduleState {
        let ctx = sample_context();
        let mut state = ScheduleState::new();
        for course in ctx.courses() {
            state.add_assignment(
                ExamAssignment::new(&course.id).with_student_count(course.enrollment()),
            );
        }
        for (course, day, slot, room) in assignments {
            assert!(state.update_assignment(course, *day, *slot, room));
        }
        state
    }

    fn candidate(course: &str, day: i32, slot: i32, room: &str, ctx: &ExamContext) -> ExamAssignment {
        ExamAssignment::assigned(course, day, slot, room)
            .with_student_count(ctx.course(course).map_or(0, Course::enrollment))
    }

    #[test]
    fn test_capacity() {
        let ctx = sample_context();
        let state = state_with(&[]);
        let rule = CapacityConstraint;

        // A has 2 students: fits R1 (cap 2), not R2 (cap 1)
        assert!(rule.is_satisfied(&candidate("A", 0, 0, "R1", &ctx), &state, &ctx));
        let over = candidate("A", 0, 0, "R2", &ctx);
        assert!(!rule.is_satisfied(&over, &state, &ctx));
        let msg = rule.violation_message(&over, &state, &ctx).unwrap();
        assert!(msg.contains("R2") && msg.contains("capacity 1"));
    }

    #[test]
    fn test_capacity_unknown_classroom() {
        let ctx = sample_context();
        let state = state_with(&[]);
        assert!(!CapacityConstraint.is_satisfied(&candidate("A", 0, 0, "R9", &ctx), &state, &ctx));
    }

    #[test]
    fn test_classroom_conflict() {
        let ctx = sample_context();
        let state = state_with(&[("A", 0, 0, "R1")]);
        let rule = ClassroomConflictConstraint;

        let clash = candidate("C", 0, 0, "R1", &ctx);
        assert!(!rule.is_satisfied(&clash, &state, &ctx));
        assert!(rule
            .violation_message(&clash, &state, &ctx)
            .unwrap()
            .contains("already used by A"));

        // Different room or different slot is fine
        assert!(rule.is_satisfied(&candidate("C", 0, 0, "R2", &ctx), &state, &ctx));
        assert!(rule.is_satisfied(&candidate("C", 0, 1, "R1", &ctx), &state, &ctx));
        // Probing the course's own current placement is not a conflict
        assert!(rule.is_satisfied(&candidate("A", 0, 0, "R1", &ctx), &state, &ctx));
    }

    #[test]
    fn test_student_conflict() {
        let ctx = sample_context();
        let state = state_with(&[("A", 0, 0, "R1")]);
        let rule = StudentConflictConstraint;

        // B shares s2 with A → same slot rejected even in another room
        let clash = candidate("B", 0, 0, "R2", &ctx);
        assert!(!rule.is_satisfied(&clash, &state, &ctx));
        assert!(rule
            .violation_message(&clash, &state, &ctx)
            .unwrap()
            .contains("1 student(s)"));

        // C shares nobody with A
        assert!(rule.is_satisfied(&candidate("C", 0, 0, "R2", &ctx), &state, &ctx));
        // B in another slot is fine
        assert!(rule.is_satisfied(&candidate("B", 0, 1, "R2", &ctx), &state, &ctx));
    }

    #[test]
    fn test_no_consecutive_exam() {
        let ctx = sample_context();
        let state = state_with(&[("A", 0, 1, "R1")]);
        let rule = NoConsecutiveExamConstraint;

        // B shares s2 with A: slots 0 and 2 are adjacent to 1
        assert!(!rule.is_satisfied(&candidate("B", 0, 0, "R2", &ctx), &state, &ctx));
        assert!(!rule.is_satisfied(&candidate("B", 0, 2, "R2", &ctx), &state, &ctx));
        // Same slot is not "consecutive" (that is the student-conflict rule)
        assert!(rule.is_satisfied(&candidate("B", 0, 1, "R2", &ctx), &state, &ctx));
        // Next day is fine
        assert!(rule.is_satisfied(&candidate("B", 1, 0, "R2", &ctx), &state, &ctx));
        // No shared students → adjacency is fine
        assert!(rule.is_satisfied(&candidate("C", 0, 0, "R2", &ctx), &state, &ctx));
    }

    #[test]
    fn test_max_two_per_day() {
        let ctx = sample_context();
        // s2 is in A, B and D; place A and B on day 0
        let state = state_with(&[("A", 0, 0, "R1"), ("B", 0, 2, "R1")]);
        let rule = MaxTwoPerDayConstraint;

        let third = candidate("D", 0, 4, "R1", &ctx);
        assert!(!rule.is_satisfied(&third, &state, &ctx));
        assert!(rule
            .violation_message(&third, &state, &ctx)
            .unwrap()
            .contains("student s2"));

        // Another day is fine
        assert!(rule.is_satisfied(&candidate("D", 1, 0, "R1", &ctx), &state, &ctx));
    }

    #[test]
    fn test_constraint_set_soft_gating() {
        let ctx = sample_context();
        let state = state_with(&[("A", 0, 0, "R1")]);
        let set = ConstraintSet::standard();
        assert_eq!(set.len(), 5);

        // D shares s2 with A; adjacent slot passes with back-to-back
        // allowed, fails without
        let adjacent = candidate("D", 0, 1, "R2", &ctx);
        assert!(set.is_consistent(&adjacent, &state, &ctx, false));
        assert!(!set.is_consistent(&adjacent, &state, &ctx, true));

        // Hard violation fails regardless
        let clash = candidate("D", 0, 0, "R2", &ctx);
        assert!(!set.is_consistent(&clash, &state, &ctx, false));
        assert_eq!(set.violation_messages(&clash, &state, &ctx).len(), 1);
    }
}
