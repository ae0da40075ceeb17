//! Schedule state: the working solution of the engine.
//!
//! Owns every course's [`ExamAssignment`] and keeps two derived indices
//! in lockstep with the assignment map:
//!
//! - classroom → occupied `(day, slot)` keys
//! - `(day, slot)` → courses examined in that slot
//!
//! The indices are always the exact inverse of the assignment map, and
//! no `(day, slot, classroom)` triple is ever held by two courses; every
//! mutation goes through `add` / `update` / `remove` so the invariant
//! cannot drift. `Clone` produces a fully independent deep snapshot,
//! which is what speculative search branches and the optimizer's
//! kept-best schedule rely on.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::ExamAssignment;

/// Complete state of an exam schedule, partial or finished.
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    /// Assignments indexed by course.
    assignments: HashMap<String, ExamAssignment>,
    /// classroom → occupied (day, slot) keys.
    classroom_usage: HashMap<String, HashSet<(i32, i32)>>,
    /// (day, slot) → courses in that slot.
    slot_courses: HashMap<(i32, i32), HashSet<String>>,
    /// Number of fully assigned courses.
    assigned_count: usize,
}

impl ScheduleState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructs a state from persisted assignment triples.
    ///
    /// This is the inbound half of the persistence boundary: a collaborator
    /// stores the assignment list and rebuilds the state (with indices)
    /// from it for inspection.
    pub fn from_assignments(assignments: impl IntoIterator<Item = ExamAssignment>) -> Self {
        let mut state = Self::new();
        for assignment in assignments {
            state.add_assignment(assignment);
        }
        state
    }

    /// Registers a course, indexing it if it is already assigned.
    ///
    /// A second registration under the same course replaces the first.
    pub fn add_assignment(&mut self, assignment: ExamAssignment) {
        if let Some(previous) = self.assignments.remove(&assignment.course_id) {
            if previous.is_assigned() {
                self.unindex(&previous);
                self.assigned_count -= 1;
            }
        }

        if assignment.is_assigned() {
            self.index(&assignment);
            self.assigned_count += 1;
        }
        self.assignments
            .insert(assignment.course_id.clone(), assignment);
    }

    /// Moves a course to a new `(day, slot, classroom)`.
    ///
    /// Returns `false` without touching the state when the course is
    /// unknown or locked, or when another course already holds that exact
    /// triple (the derived indices cannot represent a double booking).
    pub fn update_assignment(
        &mut self,
        course_id: &str,
        day: i32,
        slot: i32,
        classroom_id: &str,
    ) -> bool {
        match self.assignments.get(course_id) {
            Some(a) if !a.locked => {}
            _ => return false,
        }
        if self.occupant_of(classroom_id, day, slot).is_some_and(|c| c != course_id) {
            return false;
        }

        // Checks above guarantee the entry exists and is movable.
        let Some(assignment) = self.assignments.get_mut(course_id) else {
            return false;
        };

        let previous = assignment.clone();
        assignment.day = day;
        assignment.slot = slot;
        assignment.classroom_id = Some(classroom_id.to_string());
        let updated = assignment.clone();

        if previous.is_assigned() {
            self.unindex(&previous);
            self.assigned_count -= 1;
        }
        if updated.is_assigned() {
            self.index(&updated);
            self.assigned_count += 1;
        }
        true
    }

    /// Resets a course to unassigned.
    ///
    /// Returns `false` for unknown or locked courses.
    pub fn remove_assignment(&mut self, course_id: &str) -> bool {
        match self.assignments.get(course_id) {
            Some(a) if !a.locked => {}
            _ => return false,
        }
        let Some(assignment) = self.assignments.get_mut(course_id) else {
            return false;
        };

        let previous = assignment.clone();
        assignment.clear();

        if previous.is_assigned() {
            self.unindex(&previous);
            self.assigned_count -= 1;
        }
        true
    }

    /// Locks or unlocks a course. Returns `false` for unknown courses.
    pub fn set_locked(&mut self, course_id: &str, locked: bool) -> bool {
        match self.assignments.get_mut(course_id) {
            Some(a) => {
                a.locked = locked;
                true
            }
            None => false,
        }
    }

    /// Whether a classroom is free at `(day, slot)`. O(1).
    pub fn is_classroom_available(&self, classroom_id: &str, day: i32, slot: i32) -> bool {
        self.classroom_usage
            .get(classroom_id)
            .is_none_or(|slots| !slots.contains(&(day, slot)))
    }

    /// Courses examined at `(day, slot)`. O(1) lookup.
    pub fn courses_at(&self, day: i32, slot: i32) -> impl Iterator<Item = &str> {
        self.slot_courses
            .get(&(day, slot))
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// The course occupying `(classroom, day, slot)`, if any.
    pub fn occupant_of(&self, classroom_id: &str, day: i32, slot: i32) -> Option<&str> {
        if self.is_classroom_available(classroom_id, day, slot) {
            return None;
        }
        self.courses_at(day, slot).find(|course| {
            self.assignments
                .get(*course)
                .and_then(|a| a.classroom_id.as_deref())
                == Some(classroom_id)
        })
    }

    /// Looks up a course's assignment.
    pub fn assignment(&self, course_id: &str) -> Option<&ExamAssignment> {
        self.assignments.get(course_id)
    }

    /// All assignments, assigned or not.
    pub fn assignments(&self) -> impl Iterator<Item = &ExamAssignment> {
        self.assignments.values()
    }

    /// Assigned exams only.
    pub fn assigned(&self) -> impl Iterator<Item = &ExamAssignment> {
        self.assignments.values().filter(|a| a.is_assigned())
    }

    /// Courses still without a placement.
    pub fn unassigned(&self) -> impl Iterator<Item = &ExamAssignment> {
        self.assignments.values().filter(|a| !a.is_assigned())
    }

    /// Whether every course has a placement.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.assignments.len()
    }

    /// Number of assigned courses.
    #[inline]
    pub fn assigned_count(&self) -> usize {
        self.assigned_count
    }

    /// Number of registered courses.
    #[inline]
    pub fn total_courses(&self) -> usize {
        self.assignments.len()
    }

    /// Assigned fraction in `0.0..=1.0` (1.0 for an empty state).
    pub fn completion(&self) -> f64 {
        if self.assignments.is_empty() {
            return 1.0;
        }
        self.assigned_count as f64 / self.assignments.len() as f64
    }

    /// Assigned exams grouped by `(day, slot)` in chronological order.
    ///
    /// Ordered view for display and persistence collaborators.
    pub fn by_slot(&self) -> BTreeMap<(i32, i32), Vec<&ExamAssignment>> {
        let mut grouped: BTreeMap<(i32, i32), Vec<&ExamAssignment>> = BTreeMap::new();
        for assignment in self.assigned() {
            if let Some(key) = assignment.slot_key() {
                grouped.entry(key).or_default().push(assignment);
            }
        }
        for exams in grouped.values_mut() {
            exams.sort_by(|a, b| a.course_id.cmp(&b.course_id));
        }
        grouped
    }

    fn index(&mut self, assignment: &ExamAssignment) {
        let Some((key, classroom)) = assignment
            .slot_key()
            .zip(assignment.classroom_id.as_deref())
        else {
            return;
        };
        self.classroom_usage
            .entry(classroom.to_string())
            .or_default()
            .insert(key);
        self.slot_courses
            .entry(key)
            .or_default()
            .insert(assignment.course_id.clone());
    }

    fn unindex(&mut self, assignment: &ExamAssignment) {
        let Some((key, classroom)) = assignment
            .slot_key()
            .zip(assignment.classroom_id.as_deref())
        else {
            return;
        };
        if let Some(slots) = self.classroom_usage.get_mut(classroom) {
            slots.remove(&key);
            if slots.is_empty() {
                self.classroom_usage.remove(classroom);
            }
        }
        if let Some(courses) = self.slot_courses.get_mut(&key) {
            courses.remove(&assignment.course_id);
            if courses.is_empty() {
                self.slot_courses.remove(&key);
            }
        }
    }

    /// Verifies that the derived indices exactly mirror the assignment map.
    ///
    /// Exercised by tests after mutation sequences; not called in the
    /// search hot path.
    #[cfg(test)]
    pub(crate) fn indices_consistent(&self) -> bool {
        let mut expected_usage: HashMap<String, HashSet<(i32, i32)>> = HashMap::new();
        let mut expected_slots: HashMap<(i32, i32), HashSet<String>> = HashMap::new();
        for a in self.assigned() {
            let key = match a.slot_key() {
                Some(k) => k,
                None => return false,
            };
            let classroom = match a.classroom_id.as_deref() {
                Some(c) => c,
                None => return false,
            };
            // A triple held twice would collapse in the set; detect it here.
            if !expected_usage
                .entry(classroom.to_string())
                .or_default()
                .insert(key)
            {
                return false;
            }
            expected_slots
                .entry(key)
                .or_default()
                .insert(a.course_id.clone());
        }
        expected_usage == self.classroom_usage && expected_slots == self.slot_courses
    }
}
