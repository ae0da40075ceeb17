//! Backtracking search over course assignments.
//!
//! Depth-first search with the two classic CSP heuristics:
//!
//! - **Variable ordering (MRV)**: pick the unassigned course with the
//!   fewest remaining legal `(slot, classroom)` pairs — a pair is legal
//!   when the classroom fits the course and is free at that slot, a
//!   cheap surrogate that ignores student conflicts. Ties go to the
//!   course with the most conflict-graph edges (degree heuristic);
//!   remaining ties follow the attempt's preference order, which is
//!   what the optimizer perturbs between restarts.
//! - **Value ordering (LCV)**: sort a course's legal pairs by how many
//!   unassigned conflicting courses would lose that slot, ascending,
//!   with a strategy-specific secondary order (chronological, reuse
//!   rooms, or spread load).
//!
//! Assignments are made in place and undone exactly on backtrack. The
//! cancellation token and the deadline are checked unconditionally at
//! the top of every recursive call; both unwind as ordinary failure —
//! the stats record whether the deadline was the cause.

use std::collections::HashMap;
use std::time::Instant;

use log::trace;

use crate::constraints::ConstraintSet;
use crate::context::ExamContext;
use crate::models::{ExamAssignment, ScheduleConfig, ScheduleState, Strategy};
use crate::solver::{CancelToken, ProgressFn};

/// Diagnostics accumulated by one search attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Recursive calls entered.
    pub nodes_explored: u64,
    /// Assignments undone after a failed branch.
    pub backtracks: u64,
    /// Deepest number of simultaneously assigned courses reached.
    pub max_assigned: usize,
    /// Whether the deadline ended this attempt.
    pub timed_out: bool,
}

/// Slot preference within a day for the student-friendly strategy:
/// mid-morning and early-afternoon slots before the edges of the day.
const SLOT_PREFERENCE: [i64; 4] = [2, 0, 1, 3];

/// A legal `(day, slot, classroom)` value with its ordering key.
struct Candidate {
    day: i32,
    slot: i32,
    classroom: String,
    key: [i64; 6],
}

pub(crate) struct BacktrackingSearch<'a> {
    ctx: &'a ExamContext,
    config: &'a ScheduleConfig,
    constraints: &'a ConstraintSet,
    cancel: &'a CancelToken,
    deadline: Instant,
    /// Preference order breaking full MRV ties; perturbed per attempt.
    order: &'a [String],
    progress: Option<&'a ProgressFn>,
    stats: SearchStats,
}

impl<'a> BacktrackingSearch<'a> {
    pub(crate) fn new(
        ctx: &'a ExamContext,
        config: &'a ScheduleConfig,
        constraints: &'a ConstraintSet,
        cancel: &'a CancelToken,
        deadline: Instant,
        order: &'a [String],
        progress: Option<&'a ProgressFn>,
    ) -> Self {
        Self {
            ctx,
            config,
            constraints,
            cancel,
            deadline,
            order,
            progress,
            stats: SearchStats::default(),
        }
    }

    /// Runs the search to completion, timeout, or cancellation.
    ///
    /// Returns `true` when `state` ends up complete.
    pub(crate) fn solve(&mut self, state: &mut ScheduleState) -> bool {
        self.backtrack(state)
    }

    pub(crate) fn stats(&self) -> SearchStats {
        self.stats
    }

    fn backtrack(&mut self, state: &mut ScheduleState) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if Instant::now() >= self.deadline {
            self.stats.timed_out = true;
            return false;
        }

        self.stats.nodes_explored += 1;
        let assigned = state.assigned_count();
        let deepest_so_far = assigned > self.stats.max_assigned;
        if deepest_so_far {
            self.stats.max_assigned = assigned;
        }

        if state.is_complete() {
            return true;
        }

        let Some(course_id) = self.select_variable(state) else {
            return false;
        };

        // Report only when the high-water mark advances, so a thrashing
        // search does not flood the callback.
        if deepest_so_far {
            if let Some(progress) = self.progress {
                let fraction = assigned as f64 / state.total_courses().max(1) as f64;
                progress(fraction, &format!("Scheduling {course_id}..."));
            }
        }

        let student_count = state
            .assignment(&course_id)
            .map_or(0, |a| a.student_count);
        let enforce_soft = !self.config.allow_back_to_back;

        for value in self.order_values(&course_id, student_count, state) {
            let candidate = ExamAssignment::assigned(
                course_id.clone(),
                value.day,
                value.slot,
                value.classroom.clone(),
            )
            .with_student_count(student_count);

            if !self
                .constraints
                .is_consistent(&candidate, state, self.ctx, enforce_soft)
            {
                continue;
            }
            if !state.update_assignment(&course_id, value.day, value.slot, &value.classroom) {
                continue;
            }

            if self.backtrack(state) {
                return true;
            }

            self.stats.backtracks += 1;
            state.remove_assignment(&course_id);
        }

        trace!("dead end for {course_id} at {assigned} assigned, backtracking");
        false
    }

    /// MRV variable selection with degree and preference-order tie-breaks.
    fn select_variable(&self, state: &ScheduleState) -> Option<String> {
        let mut selected: Option<&str> = None;
        let mut min_values = usize::MAX;
        let mut max_degree = 0usize;

        for course_id in self.order {
            let unassigned = state
                .assignment(course_id)
                .is_some_and(|a| !a.is_assigned() && !a.locked);
            if !unassigned {
                continue;
            }

            let student_count = state
                .assignment(course_id)
                .map_or(0, |a| a.student_count);
            let remaining = self.count_remaining_values(student_count, state);
            let degree = self.ctx.conflict_graph().degree(course_id);

            if remaining < min_values || (remaining == min_values && degree > max_degree) {
                selected = Some(course_id);
                min_values = remaining;
                max_degree = degree;
            }
        }

        selected.map(str::to_string)
    }

    /// Counts legal `(slot, classroom)` pairs for a course of the given
    /// size: classroom fits and is free at that slot. Student conflicts
    /// are deliberately ignored here (countable surrogate).
    fn count_remaining_values(&self, student_count: usize, state: &ScheduleState) -> usize {
        let mut count = 0;
        for day in 0..self.config.num_days as i32 {
            for slot in 0..self.config.slots_per_day as i32 {
                for room in self.ctx.classrooms() {
                    if room.fits(student_count) && state.is_classroom_available(&room.id, day, slot)
                    {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// Enumerates legal values for a course, LCV-sorted.
    fn order_values(
        &self,
        course_id: &str,
        student_count: usize,
        state: &ScheduleState,
    ) -> Vec<Candidate> {
        // Per-classroom usage counts for the strategy tie-breaks.
        let mut usage: HashMap<&str, usize> = HashMap::new();
        for a in state.assigned() {
            if let Some(room) = a.classroom_id.as_deref() {
                *usage.entry(room).or_insert(0) += 1;
            }
        }

        let mut factors: HashMap<(i32, i32), i64> = HashMap::new();
        let mut candidates = Vec::new();

        for day in 0..self.config.num_days as i32 {
            for slot in 0..self.config.slots_per_day as i32 {
                let mut slot_has_candidate = false;

                for (room_index, room) in self.ctx.classrooms().enumerate() {
                    if !room.fits(student_count)
                        || !state.is_classroom_available(&room.id, day, slot)
                    {
                        continue;
                    }

                    if !slot_has_candidate {
                        factors
                            .entry((day, slot))
                            .or_insert_with(|| self.constraining_factor(course_id, day, slot, state));
                        slot_has_candidate = true;
                    }
                    let factor = factors[&(day, slot)];

                    let room_usage = usage.get(room.id.as_str()).copied().unwrap_or(0) as i64;
                    let key = match self.config.strategy {
                        Strategy::MinimizeDays => {
                            [factor, day as i64, slot as i64, room_index as i64, 0, 0]
                        }
                        Strategy::MinimizeClassrooms => [
                            factor,
                            -room_usage,
                            room.numeric_suffix().map_or(i64::MAX, |n| n as i64),
                            day as i64,
                            slot as i64,
                            room_index as i64,
                        ],
                        Strategy::StudentFriendly => [
                            factor,
                            day as i64,
                            slot_preference(slot),
                            room_usage,
                            room_index as i64,
                            0,
                        ],
                    };

                    candidates.push(Candidate {
                        day,
                        slot,
                        classroom: room.id.clone(),
                        key,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| a.key.cmp(&b.key));
        candidates
    }

    /// LCV constraining factor of a `(day, slot)` for a course: how many
    /// not-yet-assigned conflicting courses would lose availability of
    /// that slot (i.e., still have a fitting free classroom there).
    fn constraining_factor(&self, course_id: &str, day: i32, slot: i32, state: &ScheduleState) -> i64 {
        let mut factor = 0;
        for neighbor in self.ctx.conflict_graph().conflicts_of(course_id) {
            let unassigned = state
                .assignment(neighbor)
                .is_some_and(|a| !a.is_assigned());
            if !unassigned {
                continue;
            }
            let neighbor_size = self.ctx.course(neighbor).map_or(0, |c| c.enrollment());
            let slot_open = self.ctx.classrooms().any(|room| {
                room.fits(neighbor_size) && state.is_classroom_available(&room.id, day, slot)
            });
            if slot_open {
                factor += 1;
            }
        }
        factor
    }
}

/// Within-day slot preference for the student-friendly strategy.
fn slot_preference(slot: i32) -> i64 {
    SLOT_PREFERENCE
        .get(slot as usize)
        .copied()
        .unwrap_or(slot as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classroom, Course};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn config(days: u32, slots: u32) -> ScheduleConfig {
        ScheduleConfig::new(days, slots, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap())
    }

    fn context() -> ExamContext {
        ExamContext::new(
            vec![
                Course::new("A").with_students(["s1", "s2"]),
                Course::new("B").with_students(["s2", "s3"]),
                Course::new("C").with_students(["s4"]),
            ],
            vec![Classroom::new("R1", 10), Classroom::new("R2", 10)],
        )
    }

    fn fresh_state(ctx: &ExamContext) -> ScheduleState {
        let mut state = ScheduleState::new();
        for course in ctx.courses() {
            state.add_assignment(
                ExamAssignment::new(&course.id).with_student_count(course.enrollment()),
            );
        }
        state
    }

    fn run_search(
        ctx: &ExamContext,
        config: &ScheduleConfig,
        state: &mut ScheduleState,
    ) -> (bool, SearchStats) {
        let constraints = ConstraintSet::standard();
        let cancel = CancelToken::new();
        let order: Vec<String> = ctx.courses().map(|c| c.id.clone()).collect();
        let mut search = BacktrackingSearch::new(
            ctx,
            config,
            &constraints,
            &cancel,
            Instant::now() + Duration::from_secs(10),
            &order,
            None,
        );
        let solved = search.solve(state);
        (solved, search.stats())
    }

    #[test]
    fn test_solves_and_respects_conflicts() {
        let ctx = context();
        let config = config(1, 2);
        let mut state = fresh_state(&ctx);

        let (solved, stats) = run_search(&ctx, &config, &mut state);
        assert!(solved);
        assert!(state.is_complete());
        assert!(stats.nodes_explored >= 4); // one per depth + root

        // A and B share s2 → different slots
        let a = state.assignment("A").unwrap();
        let b = state.assignment("B").unwrap();
        assert!(!a.same_time_as(b));
        assert!(state.indices_consistent());
    }

    #[test]
    fn test_exhaustion_reports_failure() {
        // Two conflicting courses, a single slot: no schedule exists.
        let ctx = ExamContext::new(
            vec![
                Course::new("A").with_students(["s1"]),
                Course::new("B").with_students(["s1"]),
            ],
            vec![Classroom::new("R1", 10), Classroom::new("R2", 10)],
        );
        let config = config(1, 1);
        let mut state = fresh_state(&ctx);

        let (solved, stats) = run_search(&ctx, &config, &mut state);
        assert!(!solved);
        assert!(!stats.timed_out);
        assert_eq!(stats.max_assigned, 1);
        // Failed branches were undone exactly
        assert_eq!(state.assigned_count(), 0);
        assert!(state.indices_consistent());
    }

    #[test]
    fn test_deadline_sets_timed_out() {
        let ctx = context();
        let config = config(1, 2);
        let mut state = fresh_state(&ctx);
        let constraints = ConstraintSet::standard();
        let cancel = CancelToken::new();
        let order: Vec<String> = ctx.courses().map(|c| c.id.clone()).collect();

        let mut search = BacktrackingSearch::new(
            &ctx,
            &config,
            &constraints,
            &cancel,
            Instant::now() - Duration::from_millis(1),
            &order,
            None,
        );
        assert!(!search.solve(&mut state));
        assert!(search.stats().timed_out);
        assert_eq!(state.assigned_count(), 0);
    }

    #[test]
    fn test_cancellation_unwinds_without_timeout() {
        let ctx = context();
        let config = config(1, 2);
        let mut state = fresh_state(&ctx);
        let constraints = ConstraintSet::standard();
        let cancel = CancelToken::new();
        cancel.cancel();
        let order: Vec<String> = ctx.courses().map(|c| c.id.clone()).collect();

        let mut search = BacktrackingSearch::new(
            &ctx,
            &config,
            &constraints,
            &cancel,
            Instant::now() + Duration::from_secs(10),
            &order,
            None,
        );
        assert!(!search.solve(&mut state));
        assert!(!search.stats().timed_out);
    }

    #[test]
    fn test_locked_assignment_respected() {
        let ctx = context();
        let config = config(1, 3);
        let mut state = fresh_state(&ctx);
        // Pin A to (0, 0, R1) before the search
        assert!(state.update_assignment("A", 0, 0, "R1"));
        assert!(state.set_locked("A", true));

        let (solved, _) = run_search(&ctx, &config, &mut state);
        assert!(solved);

        let a = state.assignment("A").unwrap();
        assert_eq!(a.slot_key(), Some((0, 0)));
        assert_eq!(a.classroom_id.as_deref(), Some("R1"));
        // B shares s2 with A, so it landed elsewhere
        let b = state.assignment("B").unwrap();
        assert!(!a.same_time_as(b));
    }

    #[test]
    fn test_mrv_prefers_most_constrained() {
        // "big" fits only R_large; "small" fits both rooms.
        let ctx = ExamContext::new(
            vec![
                Course::new("big").with_students((0..20).map(|i| format!("b{i}"))),
                Course::new("small").with_students(["x"]),
            ],
            vec![Classroom::new("R_large", 30), Classroom::new("R_tiny", 5)],
        );
        let config = config(1, 1);
        let mut state = fresh_state(&ctx);

        // One slot only: both courses need it, but they don't conflict.
        let (solved, _) = run_search(&ctx, &config, &mut state);
        assert!(solved);
        // MRV must hand R_large to "big"; a greedy id-order assignment
        // could have parked "small" there and failed.
        assert_eq!(
            state.assignment("big").unwrap().classroom_id.as_deref(),
            Some("R_large")
        );
    }

    #[test]
    fn test_back_to_back_enforcement() {
        // A and B share a student; one day with two slots only.
        let ctx = ExamContext::new(
            vec![
                Course::new("A").with_students(["s1"]),
                Course::new("B").with_students(["s1"]),
            ],
            vec![Classroom::new("R1", 10)],
        );
        let mut state = fresh_state(&ctx);

        // Adjacent slots are the only option → infeasible without back-to-back
        let strict = config(1, 2).with_allow_back_to_back(false);
        let (solved, _) = run_search(&ctx, &strict, &mut state);
        assert!(!solved);

        // Same grid with back-to-back allowed succeeds
        let mut state = fresh_state(&ctx);
        let relaxed = config(1, 2).with_allow_back_to_back(true);
        let (solved, _) = run_search(&ctx, &relaxed, &mut state);
        assert!(solved);
    }
}
