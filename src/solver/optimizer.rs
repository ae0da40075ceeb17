//! Multi-restart schedule generation.
//!
//! Runs the backtracking search several times with slightly perturbed
//! course orderings, scores every complete schedule with the
//! strategy's objective function, and keeps the best. Attempt 0 uses
//! the canonical MRV ordering; later attempts swap 2–3 random pairs,
//! seeded by the attempt index so a generation request is reproducible.
//!
//! All attempts share one wall-clock deadline. Input errors are
//! detected before any search work; cancellation is honored between
//! attempts and inside each attempt's search.

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::constraints::ConstraintSet;
use crate::context::ExamContext;
use crate::models::{
    Classroom, ConfigError, Course, ExamAssignment, ScheduleConfig, ScheduleState,
};
use crate::solver::search::BacktrackingSearch;
use crate::solver::{score_schedule, CancelToken, ProgressFn};

/// Number of independent search attempts per generation request.
pub const RESTART_ATTEMPTS: usize = 5;

/// Structured failure of a generation request.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// No courses were supplied.
    #[error("no courses to schedule")]
    NoCourses,

    /// No classrooms were supplied.
    #[error("no classrooms available")]
    NoClassrooms,

    /// The configuration fails [`ScheduleConfig::validate`].
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The wall-clock budget ran out before any attempt completed.
    /// More time or a wider grid might still succeed.
    #[error(
        "search timed out: {courses_placed} of {total_courses} courses placed \
         after {attempts} attempt(s)"
    )]
    Timeout {
        attempts: usize,
        courses_placed: usize,
        total_courses: usize,
    },

    /// Every branch of every attempt was exhausted without completion.
    #[error(
        "no feasible schedule: {message} \
         ({courses_placed} of {total_courses} courses placed, {attempts} attempt(s))"
    )]
    Infeasible {
        attempts: usize,
        courses_placed: usize,
        total_courses: usize,
        message: String,
    },

    /// The cancellation token was observed. Always wins over an
    /// in-progress success or failure determination.
    #[error("schedule generation was cancelled")]
    Cancelled,
}

/// Diagnostics aggregated across all attempts of one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationReport {
    /// Attempts actually run.
    pub attempts: usize,
    /// Attempts that produced a complete schedule.
    pub successful_attempts: usize,
    /// Search nodes explored across all attempts.
    pub nodes_explored: u64,
    /// Backtracks across all attempts.
    pub backtracks: u64,
}

/// A complete schedule and how it was found.
#[derive(Debug)]
pub struct GeneratedSchedule {
    /// The best complete schedule found.
    pub state: ScheduleState,
    /// Its objective score (lower is better).
    pub score: f64,
    /// Aggregate search diagnostics.
    pub report: GenerationReport,
}

/// Best-of-N schedule generator.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use examsched::models::{Classroom, Course, ScheduleConfig};
/// use examsched::solver::ScheduleGenerator;
///
/// let courses = vec![
///     Course::new("SE302").with_students(["s1", "s2"]),
///     Course::new("MATH101").with_students(["s2", "s3"]),
/// ];
/// let classrooms = vec![Classroom::new("R1", 40)];
/// let config = ScheduleConfig::new(2, 3, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
///
/// let generator = ScheduleGenerator::new(courses, classrooms, config);
/// let schedule = generator.generate().unwrap();
/// assert!(schedule.state.is_complete());
/// ```
pub struct ScheduleGenerator {
    ctx: ExamContext,
    config: ScheduleConfig,
    constraints: ConstraintSet,
    cancel: CancelToken,
    progress: Option<Box<ProgressFn>>,
    initial: Option<ScheduleState>,
}

impl ScheduleGenerator {
    /// Creates a generator with the standard constraint set.
    pub fn new(courses: Vec<Course>, classrooms: Vec<Classroom>, config: ScheduleConfig) -> Self {
        Self::from_context(ExamContext::new(courses, classrooms), config)
    }

    /// Creates a generator from a prebuilt context.
    pub fn from_context(ctx: ExamContext, config: ScheduleConfig) -> Self {
        Self {
            ctx,
            config,
            constraints: ConstraintSet::standard(),
            cancel: CancelToken::new(),
            progress: None,
            initial: None,
        }
    }

    /// Replaces the constraint set.
    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the progress callback.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(f64, &str) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Uses an externally supplied cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Starts every attempt from this partial state instead of an empty
    /// one. Locked assignments in it are never moved.
    pub fn with_initial_state(mut self, initial: ScheduleState) -> Self {
        self.initial = Some(initial);
        self
    }

    /// A handle to the cancellation flag, for a cancel button or
    /// supervising task.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The problem context this generator works against.
    pub fn context(&self) -> &ExamContext {
        &self.ctx
    }

    /// Runs up to [`RESTART_ATTEMPTS`] searches and returns the
    /// best-scoring complete schedule.
    pub fn generate(&self) -> Result<GeneratedSchedule, GenerateError> {
        self.config.validate()?;
        let total_courses = self.ctx.course_count();
        if total_courses == 0 {
            return Err(GenerateError::NoCourses);
        }
        if self.ctx.classroom_count() == 0 {
            return Err(GenerateError::NoClassrooms);
        }
        self.check_capacity_feasibility()?;

        info!(
            "generating schedule: {} courses, {} classrooms, {} slots, strategy {:?}",
            total_courses,
            self.ctx.classroom_count(),
            self.config.total_slots(),
            self.config.strategy
        );

        let base_order = self.canonical_order();
        let deadline = Instant::now() + self.config.timeout;

        let mut report = GenerationReport::default();
        let mut best: Option<(ScheduleState, f64)> = None;
        let mut courses_placed = 0usize;
        let mut timed_out = false;

        for attempt in 0..RESTART_ATTEMPTS {
            if self.cancel.is_cancelled() {
                return Err(GenerateError::Cancelled);
            }
            self.report_progress(
                attempt as f64 / RESTART_ATTEMPTS as f64,
                &format!("Attempt {}/{}: starting search...", attempt + 1, RESTART_ATTEMPTS),
            );

            let order = perturb_order(&base_order, attempt);
            let mut state = self.starting_state();

            let mut search = BacktrackingSearch::new(
                &self.ctx,
                &self.config,
                &self.constraints,
                &self.cancel,
                deadline,
                &order,
                self.progress.as_deref(),
            );
            let solved = search.solve(&mut state);
            let stats = search.stats();

            report.attempts = attempt + 1;
            report.nodes_explored += stats.nodes_explored;
            report.backtracks += stats.backtracks;
            courses_placed = courses_placed.max(stats.max_assigned);
            timed_out |= stats.timed_out;

            if solved {
                report.successful_attempts += 1;
                let score = score_schedule(&state, &self.config, &self.ctx);
                debug!(
                    "attempt {}/{}: complete schedule, score {:.1} ({} nodes, {} backtracks)",
                    attempt + 1,
                    RESTART_ATTEMPTS,
                    score,
                    stats.nodes_explored,
                    stats.backtracks
                );
                if best.as_ref().is_none_or(|(_, best_score)| score < *best_score) {
                    best = Some((state, score));
                }
            } else {
                debug!(
                    "attempt {}/{}: no complete schedule ({} nodes, {} backtracks{})",
                    attempt + 1,
                    RESTART_ATTEMPTS,
                    stats.nodes_explored,
                    stats.backtracks,
                    if stats.timed_out { ", timed out" } else { "" }
                );
            }

            if stats.timed_out {
                // The shared budget is gone; further attempts would
                // return immediately.
                break;
            }
        }

        if self.cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }

        match best {
            Some((state, score)) => {
                self.report_progress(
                    1.0,
                    &format!(
                        "Complete: best score {:.1} ({}/{} attempts succeeded)",
                        score, report.successful_attempts, report.attempts
                    ),
                );
                info!(
                    "schedule generated: score {:.1}, {} nodes, {} backtracks",
                    score, report.nodes_explored, report.backtracks
                );
                Ok(GeneratedSchedule {
                    state,
                    score,
                    report,
                })
            }
            None if timed_out => Err(GenerateError::Timeout {
                attempts: report.attempts,
                courses_placed,
                total_courses,
            }),
            None => Err(GenerateError::Infeasible {
                attempts: report.attempts,
                courses_placed,
                total_courses,
                message: "try increasing days, slots, or classrooms".to_string(),
            }),
        }
    }

    /// Rejects courses that no classroom can seat. Detectable before
    /// search, and the operator needs the specific course named.
    fn check_capacity_feasibility(&self) -> Result<(), GenerateError> {
        for course in self.ctx.courses() {
            let fits_somewhere = self.ctx.classrooms().any(|r| r.fits(course.enrollment()));
            if !fits_somewhere {
                let largest = self.ctx.classrooms().map(|r| r.capacity).max().unwrap_or(0);
                return Err(GenerateError::Infeasible {
                    attempts: 0,
                    courses_placed: 0,
                    total_courses: self.ctx.course_count(),
                    message: format!(
                        "course {} has {} students but the largest classroom seats {}",
                        course.id,
                        course.enrollment(),
                        largest
                    ),
                });
            }
        }
        Ok(())
    }

    /// Canonical MRV ordering: fewest initial legal `(slot, classroom)`
    /// pairs first, then highest conflict degree, then id.
    fn canonical_order(&self) -> Vec<String> {
        let total_slots = self.config.total_slots() as usize;
        let mut order: Vec<(usize, usize, String)> = self
            .ctx
            .courses()
            .map(|course| {
                let fitting = self
                    .ctx
                    .classrooms()
                    .filter(|r| r.fits(course.enrollment()))
                    .count();
                let degree = self.ctx.conflict_graph().degree(&course.id);
                (total_slots * fitting, degree, course.id.clone())
            })
            .collect();

        order.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));
        order.into_iter().map(|(_, _, id)| id).collect()
    }

    /// A fresh state for one attempt: the supplied partial state, or
    /// every course unassigned. Courses missing from a supplied state
    /// are registered unassigned.
    fn starting_state(&self) -> ScheduleState {
        let mut state = self.initial.clone().unwrap_or_default();
        for course in self.ctx.courses() {
            if state.assignment(&course.id).is_none() {
                state.add_assignment(
                    ExamAssignment::new(&course.id).with_student_count(course.enrollment()),
                );
            }
        }
        state
    }

    fn report_progress(&self, fraction: f64, status: &str) {
        if let Some(progress) = &self.progress {
            progress(fraction, status);
        }
    }
}

/// Swaps 2–3 random pairs in the course order, seeded by the attempt
/// index for reproducibility. Attempt 0 is the canonical order.
fn perturb_order(base: &[String], attempt: usize) -> Vec<String> {
    let mut order = base.to_vec();
    if attempt == 0 || order.len() < 2 {
        return order;
    }

    let mut rng = StdRng::seed_from_u64(attempt as u64 * 1000);
    let swaps = 2 + rng.random_range(0..2);
    for _ in 0..swaps {
        let i = rng.random_range(0..order.len());
        let j = rng.random_range(0..order.len());
        order.swap(i, j);
    }
    order
}
