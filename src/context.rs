//! Problem context shared by every engine entry point.
//!
//! [`ExamContext`] owns the course and classroom catalogs plus the
//! derived read-only structures (student→courses index, conflict
//! graph). It is built once per generation request and passed
//! explicitly wherever the original design reached into a process-wide
//! registry, which keeps the engine testable in isolation and safe to
//! share across independent restart attempts.

use std::collections::HashMap;

use crate::conflict::ConflictGraph;
use crate::models::{Classroom, Course};

/// Immutable catalogs and derived indices for one scheduling problem.
#[derive(Debug, Clone)]
pub struct ExamContext {
    courses: HashMap<String, Course>,
    classrooms: HashMap<String, Classroom>,
    /// Course ids in deterministic (sorted) order.
    course_order: Vec<String>,
    /// Classroom ids in deterministic (sorted) order.
    classroom_order: Vec<String>,
    /// student → ids of courses the student is enrolled in.
    student_courses: HashMap<String, Vec<String>>,
    conflicts: ConflictGraph,
}

impl ExamContext {
    /// Builds a context from the input catalogs.
    ///
    /// Duplicate ids keep the last occurrence; run
    /// [`validate_input`](crate::validation::validate_input) beforehand
    /// to surface duplicates to the operator.
    pub fn new(courses: Vec<Course>, classrooms: Vec<Classroom>) -> Self {
        let conflicts = ConflictGraph::build(&courses);

        let mut student_courses: HashMap<String, Vec<String>> = HashMap::new();
        for course in &courses {
            for student in &course.students {
                student_courses
                    .entry(student.clone())
                    .or_default()
                    .push(course.id.clone());
            }
        }
        for enrolled in student_courses.values_mut() {
            enrolled.sort();
            enrolled.dedup();
        }

        let mut course_order: Vec<String> = courses.iter().map(|c| c.id.clone()).collect();
        course_order.sort();
        course_order.dedup();
        let mut classroom_order: Vec<String> = classrooms.iter().map(|c| c.id.clone()).collect();
        classroom_order.sort();
        classroom_order.dedup();

        Self {
            courses: courses.into_iter().map(|c| (c.id.clone(), c)).collect(),
            classrooms: classrooms.into_iter().map(|c| (c.id.clone(), c)).collect(),
            course_order,
            classroom_order,
            student_courses,
            conflicts,
        }
    }

    /// Looks up a course.
    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.get(id)
    }

    /// Looks up a classroom.
    pub fn classroom(&self, id: &str) -> Option<&Classroom> {
        self.classrooms.get(id)
    }

    /// Courses in deterministic id order.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.course_order.iter().filter_map(|id| self.courses.get(id))
    }

    /// Classrooms in deterministic id order.
    pub fn classrooms(&self) -> impl Iterator<Item = &Classroom> {
        self.classroom_order
            .iter()
            .filter_map(|id| self.classrooms.get(id))
    }

    /// Number of courses.
    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Number of classrooms.
    pub fn classroom_count(&self) -> usize {
        self.classrooms.len()
    }

    /// The shared-student conflict graph.
    pub fn conflict_graph(&self) -> &ConflictGraph {
        &self.conflicts
    }

    /// Courses a student is enrolled in (sorted, deduplicated).
    pub fn courses_of_student(&self, student: &str) -> &[String] {
        self.student_courses
            .get(student)
            .map_or(&[], Vec::as_slice)
    }

    /// All students appearing in any roster.
    pub fn students(&self) -> impl Iterator<Item = &str> {
        self.student_courses.keys().map(String::as_str)
    }

    /// Students enrolled in both courses, sorted.
    pub fn shared_students(&self, a: &str, b: &str) -> Vec<String> {
        let (Some(course_a), Some(course_b)) = (self.courses.get(a), self.courses.get(b)) else {
            return Vec::new();
        };
        let roster_b: std::collections::HashSet<&str> =
            course_b.students.iter().map(String::as_str).collect();
        let mut shared: Vec<String> = course_a
            .students
            .iter()
            .filter(|s| roster_b.contains(s.as_str()))
            .cloned()
            .collect();
        shared.sort();
        shared.dedup();
        shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> ExamContext {
        ExamContext::new(
            vec![
                Course::new("B").with_students(["s1", "s2"]),
                Course::new("A").with_students(["s2", "s3"]),
            ],
            vec![Classroom::new("R2", 50), Classroom::new("R1", 30)],
        )
    }

    #[test]
    fn test_lookup() {
        let ctx = sample_context();
        assert_eq!(ctx.course("A").unwrap().enrollment(), 2);
        assert_eq!(ctx.classroom("R1").unwrap().capacity, 30);
        assert!(ctx.course("Z").is_none());
        assert_eq!(ctx.course_count(), 2);
        assert_eq!(ctx.classroom_count(), 2);
    }

    #[test]
    fn test_deterministic_order() {
        let ctx = sample_context();
        let course_ids: Vec<&str> = ctx.courses().map(|c| c.id.as_str()).collect();
        assert_eq!(course_ids, vec!["A", "B"]);
        let room_ids: Vec<&str> = ctx.classrooms().map(|c| c.id.as_str()).collect();
        assert_eq!(room_ids, vec!["R1", "R2"]);
    }

    #[test]
    fn test_student_index() {
        let ctx = sample_context();
        assert_eq!(ctx.courses_of_student("s2"), ["A", "B"]);
        assert_eq!(ctx.courses_of_student("s1"), ["B"]);
        assert!(ctx.courses_of_student("nobody").is_empty());
    }

    #[test]
    fn test_shared_students() {
        let ctx = sample_context();
        assert_eq!(ctx.shared_students("A", "B"), vec!["s2".to_string()]);
        assert!(ctx.shared_students("A", "Z").is_empty());
    }

    #[test]
    fn test_conflict_graph_wired() {
        let ctx = sample_context();
        assert!(ctx.conflict_graph().in_conflict("A", "B"));
        assert_eq!(ctx.conflict_graph().degree("A"), 1);
    }
}
