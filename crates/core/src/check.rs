//! Independent re-check of hard constraints on a finished assignment.
//!
//! Works from the [`Instance`] alone, on the raw hours, and never consults
//! the [`crate::Model`] or its tick rounding. A bug in model construction or
//! search shows up as a violation here.

use serde_json::json;

use crate::Instance;
use types::{Task, Violation};

/// Float slack, in hours, when comparing sums and gaps.
const HOURS_TOLERANCE: f64 = 1e-6;

fn rest_conflict(a: &Task, b: &Task, rest: f64) -> bool {
    !(a.end() + rest <= b.start + HOURS_TOLERANCE || b.end() + rest <= a.start + HOURS_TOLERANCE)
}

fn violation(kind: &str, details: serde_json::Value) -> Violation {
    Violation {
        r#type: kind.into(),
        weight: 1,
        details,
    }
}

/// Every hard-constraint violation in `assignment` (task index -> worker index).
pub fn violations(inst: &Instance, assignment: &[Option<usize>]) -> Vec<Violation> {
    let tasks = inst.tasks();
    let workers = inst.workers();
    let params = inst.params();
    let mut out = Vec::new();

    let mut per_worker: Vec<Vec<usize>> = vec![Vec::new(); workers.len()];
    for (t, task) in tasks.iter().enumerate() {
        match assignment.get(t).copied().flatten() {
            Some(w) if w < workers.len() => per_worker[w].push(t),
            Some(w) => out.push(violation(
                "unknown_worker",
                json!({"task": task.id, "workerIndex": w}),
            )),
            None => out.push(violation("uncovered_task", json!({"task": task.id}))),
        }
    }

    let rest = params.min_rest_hours;
    for (w, owned) in per_worker.iter().enumerate() {
        let load: f64 = owned.iter().map(|&t| tasks[t].duration).sum();
        if load > params.max_duty_hours + HOURS_TOLERANCE {
            out.push(violation(
                "duty_hours_exceeded",
                json!({
                    "worker": workers[w],
                    "hours": load,
                    "limit": params.max_duty_hours,
                }),
            ));
        }
        if owned.len() > params.max_tasks_per_worker as usize {
            out.push(violation(
                "task_count_exceeded",
                json!({
                    "worker": workers[w],
                    "tasks": owned.len(),
                    "limit": params.max_tasks_per_worker,
                }),
            ));
        }
        for (i, &a) in owned.iter().enumerate() {
            for &b in &owned[i + 1..] {
                let (ta, tb) = (&tasks[a], &tasks[b]);
                if rest_conflict(ta, tb, rest) {
                    out.push(violation(
                        "rest_conflict",
                        json!({"worker": workers[w], "tasks": [ta.id, tb.id]}),
                    ));
                }
            }
        }
    }

    out
}
