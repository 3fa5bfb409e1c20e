use std::sync::Arc;
use std::time::Instant;

use crate::cache::ResultCache;
use crate::config::Config;
use crew_core::{Model, RawSolution, Solver};
use jobs::InMemJobs;
use solver_bnb::BnbSolver;
use solver_heur::HeurSolver;
use types::{SolveParams, SolverKind};

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<DispatchSolver>>,
    pub cache: Arc<ResultCache>,
}

/// Routes each solve to the engine named in its params.
#[derive(Clone, Default)]
pub struct DispatchSolver {
    exact: BnbSolver,
    heur: HeurSolver,
}

impl Solver for DispatchSolver {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn solve_model(&self, model: &Model, params: &SolveParams, deadline: Instant) -> RawSolution {
        match params.solver {
            SolverKind::Exact => self.exact.solve_model(model, params, deadline),
            SolverKind::Heuristic => self.heur.solve_model(model, params, deadline),
        }
    }
}

impl AppState {
    pub fn new(cfg: &Config) -> Self {
        let jobs = InMemJobs::new(DispatchSolver::default()).with_slack(cfg.deadline_slack);
        Self {
            jobs: Arc::new(jobs),
            cache: Arc::new(ResultCache::new(cfg.cache_capacity)),
        }
    }
}
