//! Objective functions for schedule quality.
//!
//! Each optimization strategy scores a complete schedule; lower is
//! better. The optimizer generates several candidate schedules and
//! keeps the lowest-scoring one, which is how soft scheduling goals are
//! expressed without relaxing constraints during search.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use crate::context::ExamContext;
use crate::models::{ExamAssignment, ScheduleConfig, ScheduleState, Strategy};

/// Scores a schedule under the configured strategy. Lower is better.
pub fn score_schedule(state: &ScheduleState, config: &ScheduleConfig, ctx: &ExamContext) -> f64 {
    match config.strategy {
        Strategy::MinimizeDays => score_minimize_days(state),
        Strategy::MinimizeClassrooms => score_minimize_classrooms(state, ctx),
        Strategy::StudentFriendly => score_student_friendly(state, config, ctx),
    }
}

/// Pack exams into as few (and as early) days as possible.
///
/// Primary penalty of 1000 per distinct day used; mean day index and
/// mean slot index break ties toward earlier placements.
fn score_minimize_days(state: &ScheduleState) -> f64 {
    let days_used: HashSet<i32> = state.assigned().map(|a| a.day).collect();
    let mut score = days_used.len() as f64 * 1000.0;

    let assigned: Vec<&ExamAssignment> = state.assigned().collect();
    if !assigned.is_empty() {
        let avg_day =
            assigned.iter().map(|a| a.day as f64).sum::<f64>() / assigned.len() as f64;
        let avg_slot =
            assigned.iter().map(|a| a.slot as f64).sum::<f64>() / assigned.len() as f64;
        score += avg_day * 10.0 + avg_slot;
    }

    score
}

/// Use as few distinct classrooms as possible.
///
/// Primary penalty of 1000 per distinct classroom used; the numeric
/// suffix of each assigned room breaks ties toward lower-numbered
/// rooms.
fn score_minimize_classrooms(state: &ScheduleState, ctx: &ExamContext) -> f64 {
    let rooms_used: HashSet<&str> = state
        .assigned()
        .filter_map(|a| a.classroom_id.as_deref())
        .collect();
    let mut score = rooms_used.len() as f64 * 1000.0;

    for assignment in state.assigned() {
        if let Some(suffix) = assignment
            .classroom_id
            .as_deref()
            .and_then(|id| ctx.classroom(id))
            .and_then(|room| room.numeric_suffix())
        {
            score += suffix as f64 * 0.1;
        }
    }

    score
}

/// Minimize same-day gaps and edge-of-day slots for students.
///
/// Per student: 10 per empty slot strictly between two same-day exams,
/// 5 per first-slot exam, 3 per last-slot exam, 2 per pair of exams on
/// consecutive days. A balance bonus of 2 × the standard deviation of
/// per-classroom usage discourages piling everything into one room.
fn score_student_friendly(
    state: &ScheduleState,
    config: &ScheduleConfig,
    ctx: &ExamContext,
) -> f64 {
    let mut score = 0.0;
    let last_slot = config.slots_per_day as i32 - 1;

    for student in ctx.students().sorted() {
        let exams: Vec<(i32, i32)> = ctx
            .courses_of_student(student)
            .iter()
            .filter_map(|course| state.assignment(course))
            .filter_map(ExamAssignment::slot_key)
            .sorted()
            .collect();

        if exams.is_empty() {
            continue;
        }

        // Same-day gaps between adjacent exams
        for ((prev_day, prev_slot), (day, slot)) in exams.iter().copied().tuple_windows() {
            if prev_day == day {
                let gap = slot - prev_slot - 1;
                if gap > 0 {
                    score += gap as f64 * 10.0;
                }
            }
        }

        // Edge-of-day penalties
        for (_, slot) in &exams {
            if *slot == 0 {
                score += 5.0;
            }
            if *slot == last_slot {
                score += 3.0;
            }
        }

        // Exams on consecutive days
        let days: Vec<i32> = exams.iter().map(|(day, _)| *day).sorted().dedup().collect();
        score += days
            .iter()
            .tuple_windows()
            .filter(|(a, b)| *b - *a == 1)
            .count() as f64
            * 2.0;
    }

    score + classroom_usage_stddev(state) * 2.0
}

/// Standard deviation of per-classroom usage counts.
fn classroom_usage_stddev(state: &ScheduleState) -> f64 {
    let mut usage: HashMap<&str, usize> = HashMap::new();
    for assignment in state.assigned() {
        if let Some(room) = assignment.classroom_id.as_deref() {
            *usage.entry(room).or_insert(0) += 1;
        }
    }
    if usage.is_empty() {
        return 0.0;
    }

    let counts: Vec<f64> = usage.values().map(|&n| n as f64).collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    variance.sqrt()
}
