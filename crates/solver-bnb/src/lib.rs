#[cfg(feature = "with-milp")]
mod milp_core;
mod search;

use std::time::Instant;

use crew_core::{Model, Occupancy, RawSolution, Solver};
use search::{branch_order, Outcome, Search};
use tracing::{info, warn};
use types::{SolveParams, SolveStatus};

/// Exact engine: presolve, greedy warm start, then branch-and-bound until
/// optimality is proven or the deadline passes.
#[derive(Clone, Copy, Debug, Default)]
pub struct BnbSolver;

impl BnbSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for BnbSolver {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn solve_model(&self, model: &Model, _params: &SolveParams, deadline: Instant) -> RawSolution {
        if let Some(reason) = model.presolve() {
            info!(%reason, "instance infeasible by presolve");
            return RawSolution::empty(
                SolveStatus::Infeasible,
                serde_json::json!({"method": "presolve", "reason": reason.to_string()}),
            );
        }

        #[cfg(feature = "with-milp")]
        {
            match milp_core::solve_with_milp(model) {
                Ok(Some(assignment)) => {
                    return RawSolution {
                        status: SolveStatus::Optimal,
                        assignment,
                        stats: serde_json::json!({"method": "milp"}),
                    }
                }
                Ok(None) => {
                    return RawSolution::empty(
                        SolveStatus::Infeasible,
                        serde_json::json!({"method": "milp"}),
                    )
                }
                Err(e) => warn!(error = %e, "milp backend failed, falling back to search"),
            }
        }

        let warm = solve_greedy(model);
        let warm_objective = warm.as_ref().map(|a| model.objective(a));
        let mut search = Search::new(model, deadline);
        if let Some(assignment) = warm {
            search = search.with_incumbent(assignment);
        }
        let out = search.run();

        let status = status_of(&out);
        if out.timed_out {
            warn!(nodes = out.nodes, %status, "search hit the deadline");
        }
        info!(
            %status,
            nodes = out.nodes,
            pruned = out.pruned,
            objective = out.best.as_ref().map(|(o, _)| *o),
            "search finished"
        );

        let stats = serde_json::json!({
            "method": "branch-and-bound",
            "nodes": out.nodes,
            "pruned": out.pruned,
            "warmStartObjective": warm_objective,
            "timedOut": out.timed_out,
        });
        match out.best {
            Some((_, assignment)) => RawSolution {
                status,
                assignment,
                stats,
            },
            None => RawSolution::empty(status, stats),
        }
    }
}

/// A schedule held at the deadline is `Feasible`; `TimedOut` means there is
/// nothing to return.
fn status_of(out: &Outcome) -> SolveStatus {
    match (&out.best, out.timed_out) {
        (Some(_), false) => SolveStatus::Optimal,
        (Some(_), true) => SolveStatus::Feasible,
        (None, false) => SolveStatus::Infeasible,
        (None, true) => SolveStatus::TimedOut,
    }
}

/// First-fit in branch order, preferring the worker with the fewest tasks
/// (lowest index on ties). `None` when some task cannot be placed.
fn solve_greedy(model: &Model) -> Option<Vec<Option<usize>>> {
    let mut occ = Occupancy::new(model);
    for t in branch_order(model) {
        let w = (0..model.worker_count())
            .filter(|&w| occ.fits(model, t, w))
            .min_by_key(|&w| (occ.count(w), w))?;
        occ.place(model, t, w);
    }
    Some(occ.into_assignment())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::{check, Instance};
    use types::{ConstraintParams, ObjectiveWeights, Task, WorkerId};

    fn instance(tasks: Vec<Task>, workers: usize) -> Instance {
        let workers = (0..workers).map(|i| WorkerId(format!("C{i}"))).collect();
        Instance::build(tasks, workers, ConstraintParams::default()).unwrap()
    }

    fn model(tasks: Vec<Task>, workers: usize) -> Model {
        Model::build(&instance(tasks, workers), ObjectiveWeights::default())
    }

    #[test]
    fn greedy_prefers_least_loaded_worker() {
        let m = model(
            vec![
                Task::new("A", 6.0, 1.0, 1),
                Task::new("B", 8.0, 1.0, 1),
                Task::new("C", 10.0, 1.0, 1),
            ],
            2,
        );
        assert_eq!(solve_greedy(&m), Some(vec![Some(0), Some(1), Some(0)]));
    }

    #[test]
    fn greedy_gives_up_on_unplaceable_task() {
        let m = model(vec![Task::new("A", 6.0, 2.0, 1), Task::new("B", 7.0, 2.0, 1)], 1);
        assert_eq!(solve_greedy(&m), None);
    }

    #[test]
    fn deadline_with_incumbent_is_feasible() {
        let inst = instance(vec![Task::new("A", 6.0, 1.0, 1), Task::new("B", 12.0, 1.0, 1)], 2);
        let m = Model::build(&inst, ObjectiveWeights::default());
        // Both on one worker scores below the two-worker ceiling.
        let out = Search::new(&m, Instant::now())
            .with_incumbent(vec![Some(0), Some(0)])
            .run();
        assert!(out.timed_out);
        assert_eq!(status_of(&out), SolveStatus::Feasible);

        let (objective, assignment) = out.best.unwrap();
        assert_eq!(objective, 10 + 5 * 2);
        assert!(assignment.iter().all(Option::is_some));
        assert!(check::violations(&inst, &assignment).is_empty());
    }

    #[test]
    fn deadline_without_incumbent_is_timed_out() {
        let m = model(vec![Task::new("A", 6.0, 1.0, 1)], 1);
        let out = Search::new(&m, Instant::now()).run();
        assert_eq!(status_of(&out), SolveStatus::TimedOut);
    }
}
