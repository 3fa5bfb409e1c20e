pub mod check;
pub mod extract;
pub mod instance;
pub mod metrics;
pub mod model;

use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use extract::RawSolution;
pub use instance::{validate, Instance};
pub use metrics::{ScheduleMetrics, WorkerSchedule};
pub use model::{Infeasibility, Model, Occupancy, FIXED_POINT_SCALE};
pub use types::{
    Assignment, ConstraintParams, InstanceInput, ObjectiveWeights, SolveEnvelope, SolveParams,
    SolveResult, SolveStatus, SolverKind, Task, TaskId, WorkerId,
};

/// Longest accepted solve budget.
pub const MAX_TIME_LIMIT_SEC: f64 = 24.0 * 3600.0;

/// Largest magnitude accepted for any time or duration in an instance.
/// Keeps every tick sum well inside `i64`.
pub const MAX_HOURS: f64 = 1_000_000.0;

/// Largest accepted objective weight.
pub const MAX_OBJECTIVE_WEIGHT: i64 = 1_000_000;

/// A single problem with the input, naming the offending field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub field: String,
    pub reason: String,
}

impl Issue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid instance: {}", join_issues(.0))]
    InvalidInstance(Vec<Issue>),
}

impl ValidationError {
    pub fn issues(&self) -> &[Issue] {
        match self {
            ValidationError::InvalidInstance(issues) => issues,
        }
    }
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    InvalidInstance(#[from] ValidationError),
    /// The returned assignment broke a hard constraint. Never a valid outcome.
    #[error("solver internal error: {0}")]
    Internal(String),
}

pub fn validate_params(params: &SolveParams) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    let limit = params.time_limit_sec;
    if !limit.is_finite() || limit <= 0.0 {
        issues.push(Issue::new("timeLimitSec", format!("must be positive, got {limit}")));
    } else if limit > MAX_TIME_LIMIT_SEC {
        issues.push(Issue::new(
            "timeLimitSec",
            format!("must not exceed {MAX_TIME_LIMIT_SEC}, got {limit}"),
        ));
    }
    for (field, weight) in [
        ("weights.utilization", params.weights.utilization),
        ("weights.priority", params.weights.priority),
    ] {
        if weight < 0 {
            issues.push(Issue::new(field, "must be non-negative"));
        } else if weight > MAX_OBJECTIVE_WEIGHT {
            issues.push(Issue::new(
                field,
                format!("must not exceed {MAX_OBJECTIVE_WEIGHT}, got {weight}"),
            ));
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidInstance(issues))
    }
}

/// A search strategy over a built [`Model`]. Implementations keep all search
/// state local to the call so concurrent solves never share anything.
pub trait Solver: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn solve_model(&self, model: &Model, params: &SolveParams, deadline: Instant) -> RawSolution;
}

/// Builds the model, runs `solver` against the wall-clock budget in `params`
/// and extracts a checked result. Blocks the calling thread.
pub fn solve<S: Solver + ?Sized>(
    solver: &S,
    instance: &Instance,
    params: &SolveParams,
) -> Result<SolveResult, SolveError> {
    validate_params(params)?;
    let started = Instant::now();
    let deadline = started + Duration::from_secs_f64(params.time_limit_sec);

    let model = Model::build(instance, params.weights);
    tracing::info!(
        solver = solver.name(),
        tasks = model.task_count(),
        workers = model.worker_count(),
        conflict_pairs = model.conflict_pairs().len(),
        "solving instance"
    );
    let raw = solver.solve_model(&model, params, deadline);
    extract::extract(instance, &model, raw, started.elapsed())
}
