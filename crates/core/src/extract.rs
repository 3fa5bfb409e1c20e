use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, error};

use crate::{check, Instance, Model, SolveError};
use types::{Assignment, SolveResult, SolveStatus};

/// Raw engine output: a status and a task-indexed worker choice.
#[derive(Clone, Debug)]
pub struct RawSolution {
    pub status: SolveStatus,
    pub assignment: Vec<Option<usize>>,
    pub stats: serde_json::Value,
}

impl RawSolution {
    /// An outcome without a schedule (Infeasible or TimedOut).
    pub fn empty(status: SolveStatus, stats: serde_json::Value) -> Self {
        Self {
            status,
            assignment: Vec::new(),
            stats,
        }
    }
}

/// Turns engine output into a [`SolveResult`], re-checking every hard
/// constraint. A schedule-bearing status with violations is an
/// [`SolveError::Internal`], never a result.
pub fn extract(
    inst: &Instance,
    model: &Model,
    raw: RawSolution,
    elapsed: Duration,
) -> Result<SolveResult, SolveError> {
    let RawSolution {
        status,
        assignment,
        mut stats,
    } = raw;

    let mut per_worker_hours: BTreeMap<_, f64> =
        inst.workers().iter().map(|w| (w.clone(), 0.0)).collect();

    if !status.has_schedule() {
        debug!(%status, "no schedule to extract");
        annotate(&mut stats, model);
        return Ok(SolveResult {
            status,
            objective: 0,
            solve_duration_seconds: elapsed.as_secs_f64(),
            assignments: Vec::new(),
            per_worker_hours,
            violation_count: 0,
            violations: Vec::new(),
            stats,
        });
    }

    let violations = check::violations(inst, &assignment);
    if !violations.is_empty() {
        error!(
            %status,
            count = violations.len(),
            first = ?violations.first(),
            "solver returned a schedule that breaks hard constraints"
        );
        return Err(SolveError::Internal(format!(
            "{status} solution has {} hard-constraint violations",
            violations.len()
        )));
    }

    let mut assignments = Vec::with_capacity(assignment.len());
    for (t, w) in assignment.iter().enumerate() {
        let Some(w) = *w else { continue };
        let task = &inst.tasks()[t];
        let worker = &inst.workers()[w];
        if let Some(h) = per_worker_hours.get_mut(worker) {
            *h += task.duration;
        }
        assignments.push(Assignment {
            worker: worker.clone(),
            task: task.id.clone(),
            start: task.start,
            duration: task.duration,
            end: task.end(),
            priority: task.priority,
        });
    }

    annotate(&mut stats, model);
    Ok(SolveResult {
        status,
        objective: model.objective(&assignment),
        solve_duration_seconds: elapsed.as_secs_f64(),
        assignments,
        per_worker_hours,
        violation_count: 0,
        violations: Vec::new(),
        stats,
    })
}

fn annotate(stats: &mut serde_json::Value, model: &Model) {
    if !stats.is_object() {
        *stats = serde_json::json!({});
    }
    stats["tasks"] = serde_json::json!(model.task_count());
    stats["workers"] = serde_json::json!(model.worker_count());
    stats["conflictPairs"] = serde_json::json!(model.conflict_pairs().len());
    stats["upperBound"] = serde_json::json!(model.upper_bound());
}
