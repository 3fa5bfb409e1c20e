use anyhow::{anyhow, Context};
use crew_core::{Instance, Solver};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use types::{SolveParams, SolveResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Extra wall-clock time a job gets on top of its solve budget.
pub const DEFAULT_DEADLINE_SLACK: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    /// Any solve outcome, Infeasible and TimedOut included.
    Solved { result: SolveResult },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Solved { .. } | JobStatus::Failed { .. })
    }
}

#[derive(Clone)]
pub struct InMemJobs<S: Solver> {
    inner: Arc<RwLock<HashMap<String, JobStatus>>>,
    solver: Arc<S>,
    slack: Duration,
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self {
            inner: Default::default(),
            solver: Arc::new(solver),
            slack: DEFAULT_DEADLINE_SLACK,
        }
    }

    pub fn with_slack(mut self, slack: Duration) -> Self {
        self.slack = slack;
        self
    }

    pub fn enqueue(&self, instance: Instance, params: SolveParams) -> JobId {
        self.enqueue_then(instance, params, |_| {})
    }

    /// Like [`enqueue`](Self::enqueue); `on_done` sees the result of a
    /// successful solve before the job is marked finished.
    pub fn enqueue_then<F>(&self, instance: Instance, params: SolveParams, on_done: F) -> JobId
    where
        F: FnOnce(&SolveResult) + Send + 'static,
    {
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let slack = self.slack;
        let id_for_task = id.clone();

        tokio::spawn(async move {
            map.write().insert(id_for_task.clone(), JobStatus::Running);
            let status = match run(solver, instance, params, slack).await {
                Ok(result) => {
                    info!(job = %id_for_task, status = %result.status, "job finished");
                    on_done(&result);
                    JobStatus::Solved { result }
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    error!(job = %id_for_task, error = %message, "job failed");
                    JobStatus::Failed { message }
                }
            };
            map.write().insert(id_for_task, status);
        });

        JobId(id)
    }

    /// Registers an already known result as a finished job.
    pub fn complete(&self, result: SolveResult) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner
            .write()
            .insert(id.clone(), JobStatus::Solved { result });
        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}

/// One solve on the blocking pool, bounded by budget + slack. The engines
/// stop at their own deadline; the outer timeout only catches a runaway.
async fn run<S: Solver>(
    solver: Arc<S>,
    instance: Instance,
    params: SolveParams,
    slack: Duration,
) -> anyhow::Result<SolveResult> {
    let budget = Duration::try_from_secs_f64(params.time_limit_sec).unwrap_or_default() + slack;
    let task =
        tokio::task::spawn_blocking(move || crew_core::solve(&*solver, &instance, &params));
    let joined = tokio::time::timeout(budget, task).await.map_err(|_| {
        anyhow!(
            "solve exceeded request deadline of {:.1}s",
            budget.as_secs_f64()
        )
    })?;
    Ok(joined.context("solver task panicked")??)
}
