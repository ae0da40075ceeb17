//! Conflict graph over courses.
//!
//! Two courses are connected when they share at least one enrolled
//! student, which means their exams can never share a `(day, slot)`.
//! The graph is built once per course set from a student→courses
//! inverse index — O(S·C) for S students of C courses each — instead of
//! pairwise roster intersection, and is read-only afterwards. It feeds
//! the student-conflict constraint and the search's degree tie-break.

use std::collections::{HashMap, HashSet};

use crate::models::Course;

/// Undirected shared-student adjacency between courses.
#[derive(Debug, Clone, Default)]
pub struct ConflictGraph {
    edges: HashMap<String, HashSet<String>>,
}

impl ConflictGraph {
    /// Builds the graph from a course set.
    pub fn build(courses: &[Course]) -> Self {
        let mut student_courses: HashMap<&str, Vec<&str>> = HashMap::new();
        for course in courses {
            for student in &course.students {
                student_courses
                    .entry(student.as_str())
                    .or_default()
                    .push(course.id.as_str());
            }
        }

        let mut edges: HashMap<String, HashSet<String>> = courses
            .iter()
            .map(|c| (c.id.clone(), HashSet::new()))
            .collect();

        for enrolled in student_courses.values() {
            for i in 0..enrolled.len() {
                for j in (i + 1)..enrolled.len() {
                    let (a, b) = (enrolled[i], enrolled[j]);
                    if a == b {
                        continue;
                    }
                    if let Some(set) = edges.get_mut(a) {
                        set.insert(b.to_string());
                    }
                    if let Some(set) = edges.get_mut(b) {
                        set.insert(a.to_string());
                    }
                }
            }
        }

        Self { edges }
    }

    /// Courses that share at least one student with `course_id`.
    pub fn conflicts_of(&self, course_id: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(course_id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Number of conflict edges incident to a course.
    pub fn degree(&self, course_id: &str) -> usize {
        self.edges.get(course_id).map_or(0, HashSet::len)
    }

    /// Whether two courses share a student.
    pub fn in_conflict(&self, a: &str, b: &str) -> bool {
        self.edges.get(a).is_some_and(|set| set.contains(b))
    }

    /// Total number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(HashSet::len).sum::<usize>() / 2
    }

    /// Number of courses in the graph.
    pub fn course_count(&self) -> usize {
        self.edges.len()
    }
}
