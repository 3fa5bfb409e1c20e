use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(TaskId);
id_newtype!(WorkerId);

/// A time-boxed unit of work (a flight). Times are fractional hours from a
/// reference midnight.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub start: f64,
    pub duration: f64,
    pub priority: u32,
}

impl Task {
    pub fn new(id: impl Into<String>, start: f64, duration: f64, priority: u32) -> Self {
        Self {
            id: TaskId(id.into()),
            start,
            duration,
            priority,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintParams {
    pub max_duty_hours: f64,
    #[serde(default)]
    pub min_rest_hours: f64,
    pub max_tasks_per_worker: u32,
}

impl Default for ConstraintParams {
    fn default() -> Self {
        Self {
            max_duty_hours: 9.0,
            min_rest_hours: 0.5,
            max_tasks_per_worker: 4,
        }
    }
}

/// Raw instance as supplied by the caller, before validation.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct InstanceInput {
    pub tasks: Vec<Task>,
    pub workers: Vec<WorkerId>,
    #[serde(default)]
    pub constraints: ConstraintParams,
}

fn default_utilization_weight() -> i64 {
    10
}

fn default_priority_weight() -> i64 {
    5
}

/// Objective coefficients. `utilization` rewards every worker that owns at
/// least one task, `priority` multiplies the priority of each assigned task.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq, Hash)]
pub struct ObjectiveWeights {
    #[serde(default = "default_utilization_weight")]
    pub utilization: i64,
    #[serde(default = "default_priority_weight")]
    pub priority: i64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            utilization: default_utilization_weight(),
            priority: default_priority_weight(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Exact,
    Heuristic,
}

fn default_time_limit() -> f64 {
    10.0
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolveParams {
    #[serde(default)]
    pub solver: SolverKind,
    #[serde(default = "default_time_limit")]
    pub time_limit_sec: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub weights: ObjectiveWeights,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            solver: SolverKind::default(),
            time_limit_sec: default_time_limit(),
            seed: 0,
            weights: ObjectiveWeights::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveEnvelope {
    pub instance: InstanceInput,
    #[serde(default)]
    pub params: SolveParams,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    TimedOut,
}

impl SolveStatus {
    /// Whether the status carries a complete schedule.
    pub fn has_schedule(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Feasible => "Feasible",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::TimedOut => "TimedOut",
        };
        f.write_str(s)
    }
}

/// One (worker, task) row of a returned schedule.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct Assignment {
    pub worker: WorkerId,
    pub task: TaskId,
    pub start: f64,
    pub duration: f64,
    pub end: f64,
    pub priority: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct Violation {
    pub r#type: String,
    pub weight: i64,
    pub details: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective: i64,
    pub solve_duration_seconds: f64,
    pub assignments: Vec<Assignment>,
    pub per_worker_hours: BTreeMap<WorkerId, f64>,
    pub violation_count: usize,
    #[serde(default)]
    pub violations: Vec<Violation>,
    pub stats: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_fill_defaults() {
        let p: SolveParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p.solver, SolverKind::Exact);
        assert_eq!(p.time_limit_sec, 10.0);
        assert_eq!(p.weights, ObjectiveWeights { utilization: 10, priority: 5 });
    }

    #[test]
    fn constraints_use_camel_case() {
        let c: ConstraintParams = serde_json::from_str(
            r#"{"maxDutyHours": 8.5, "minRestHours": 1.0, "maxTasksPerWorker": 3}"#,
        )
        .unwrap();
        assert_eq!(c.max_duty_hours, 8.5);
        assert_eq!(c.min_rest_hours, 1.0);
        assert_eq!(c.max_tasks_per_worker, 3);
    }

    #[test]
    fn status_serializes_by_name() {
        let s = serde_json::to_string(&SolveStatus::TimedOut).unwrap();
        assert_eq!(s, "\"TimedOut\"");
        assert!(SolveStatus::Feasible.has_schedule());
        assert!(!SolveStatus::Infeasible.has_schedule());
    }

    #[test]
    fn task_end_is_start_plus_duration() {
        let t = Task::new("F101", 6.0, 3.5, 1);
        assert_eq!(t.end(), 9.5);
    }
}
