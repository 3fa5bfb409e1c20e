//! Aggregate statistics over a finished schedule. Pure derivation: no
//! constraint logic, no state between calls.

use serde::Serialize;
use std::collections::HashMap;

use crate::Instance;
use types::{Assignment, SolveResult, WorkerId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSchedule {
    pub worker: WorkerId,
    pub hours: f64,
    /// Utilization of this worker's duty limit (0.0..=1.0).
    pub utilization: f64,
    pub tasks: Vec<Assignment>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetrics {
    pub total_duty_hours: f64,
    /// total duty hours / (worker count * max duty hours)
    pub average_utilization: f64,
    /// One entry per instance worker, in input order; tasks sorted by start.
    pub workers: Vec<WorkerSchedule>,
    pub idle_workers: Vec<WorkerId>,
}

impl ScheduleMetrics {
    /// Rows naming a worker outside the instance are ignored.
    pub fn calculate(result: &SolveResult, inst: &Instance) -> Self {
        let max_duty = inst.params().max_duty_hours;

        let mut by_worker: HashMap<&WorkerId, Vec<Assignment>> = HashMap::new();
        for a in &result.assignments {
            by_worker.entry(&a.worker).or_default().push(a.clone());
        }

        let mut workers = Vec::with_capacity(inst.worker_count());
        let mut idle_workers = Vec::new();
        let mut total = 0.0;
        for w in inst.workers() {
            let mut tasks = by_worker.remove(w).unwrap_or_default();
            tasks.sort_by(|a, b| a.start.total_cmp(&b.start).then_with(|| a.task.cmp(&b.task)));
            let hours: f64 = tasks.iter().map(|a| a.duration).sum();
            if tasks.is_empty() {
                idle_workers.push(w.clone());
            }
            total += hours;
            workers.push(WorkerSchedule {
                worker: w.clone(),
                hours,
                utilization: hours / max_duty,
                tasks,
            });
        }

        let capacity = inst.worker_count() as f64 * max_duty;
        let average_utilization = if capacity > 0.0 { total / capacity } else { 0.0 };

        Self {
            total_duty_hours: total,
            average_utilization,
            workers,
            idle_workers,
        }
    }
}
