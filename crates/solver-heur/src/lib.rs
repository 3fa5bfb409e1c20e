use std::cmp::Reverse;
use std::time::Instant;

use crew_core::{Model, Occupancy, RawSolution, Solver};
use rand::{seq::SliceRandom, Rng};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use types::{SolveParams, SolveStatus};

/// Population search: randomized construction, tournament selection and
/// single-task mutations. Reproducible for a fixed seed as long as the
/// deadline is not what ends the run.
#[derive(Clone, Copy, Debug)]
pub struct HeurSolver {
    iterations: usize,
    construct_attempts: usize,
}

impl Default for HeurSolver {
    fn default() -> Self {
        Self {
            iterations: 2_000,
            construct_attempts: 200,
        }
    }
}

impl HeurSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

impl Solver for HeurSolver {
    fn name(&self) -> &'static str {
        "ga"
    }

    fn solve_model(&self, model: &Model, params: &SolveParams, deadline: Instant) -> RawSolution {
        if let Some(reason) = model.presolve() {
            info!(%reason, "instance infeasible by presolve");
            return RawSolution::empty(
                SolveStatus::Infeasible,
                serde_json::json!({"method": "presolve", "reason": reason.to_string()}),
            );
        }

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let ceiling = model.upper_bound();
        let pop_size = 40usize.min(10 + model.task_count() * 2);

        let mut population: Vec<Candidate> = Vec::new();
        let mut attempts = 0usize;
        // Random construction proves nothing, so an empty population keeps
        // trying until the deadline instead of giving up at the attempt cap.
        while population.len() < pop_size {
            if Instant::now() >= deadline {
                break;
            }
            if attempts >= self.construct_attempts && !population.is_empty() {
                break;
            }
            attempts += 1;
            if let Some(c) = randomized_construct(model, &mut rng) {
                insert_sorted(&mut population, c);
            }
        }

        if population.is_empty() {
            info!(attempts, "no feasible construction found before the deadline");
            return RawSolution::empty(
                SolveStatus::TimedOut,
                serde_json::json!({"method": "ga", "constructAttempts": attempts}),
            );
        }

        let mut generations = 0usize;
        let mut timed_out = false;
        while population[0].objective < ceiling && generations < self.iterations {
            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }
            generations += 1;
            let parent = tournament(&population, 3, &mut rng);
            let child = mutate(model, parent, &mut rng);
            if let Some(worst) = population.last() {
                if child.objective > worst.objective {
                    if child.objective > population[0].objective {
                        debug!(objective = child.objective, generations, "new best");
                    }
                    population.pop();
                    insert_sorted(&mut population, child);
                }
            }
        }

        let best = population.swap_remove(0);
        let status = if best.objective >= ceiling {
            SolveStatus::Optimal
        } else {
            SolveStatus::Feasible
        };
        info!(%status, objective = best.objective, generations, timed_out, "ga finished");
        RawSolution {
            status,
            assignment: best.assignment,
            stats: serde_json::json!({
                "method": "ga",
                "pop": population.len() + 1,
                "generations": generations,
                "constructAttempts": attempts,
                "best": best.objective,
                "timedOut": timed_out,
            }),
        }
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    assignment: Vec<Option<usize>>,
    objective: i64,
}

impl Candidate {
    fn evaluate(model: &Model, assignment: Vec<Option<usize>>) -> Self {
        let objective = model.objective(&assignment);
        Self {
            assignment,
            objective,
        }
    }
}

/// Keeps the population sorted best first; equal objectives stay in
/// arrival order.
fn insert_sorted(pop: &mut Vec<Candidate>, c: Candidate) {
    let pos = pop.partition_point(|x| x.objective >= c.objective);
    pop.insert(pos, c);
}

fn occupancy_of(model: &Model, assignment: &[Option<usize>]) -> Occupancy {
    let mut occ = Occupancy::new(model);
    for (t, w) in assignment.iter().enumerate() {
        if let Some(w) = *w {
            occ.place(model, t, w);
        }
    }
    occ
}

/// Most conflicted tasks first (ties shuffled), each onto a random worker
/// it fits, half the time the least loaded one. `None` if some task has nowhere
/// to go.
fn randomized_construct(model: &Model, rng: &mut ChaCha8Rng) -> Option<Candidate> {
    let mut order: Vec<usize> = (0..model.task_count()).collect();
    order.shuffle(rng);
    order.sort_by_key(|&t| Reverse(model.conflicts(t).len()));

    let mut occ = Occupancy::new(model);
    let mut workers: Vec<usize> = (0..model.worker_count()).collect();
    for t in order {
        workers.shuffle(rng);
        let mut open = workers.iter().copied().filter(|&w| occ.fits(model, t, w));
        let w = if rng.gen_bool(0.5) {
            open.min_by_key(|&w| occ.count(w))?
        } else {
            open.next()?
        };
        occ.place(model, t, w);
    }
    Some(Candidate::evaluate(model, occ.into_assignment()))
}

fn tournament<'a>(pop: &'a [Candidate], k: usize, rng: &mut ChaCha8Rng) -> &'a Candidate {
    let mut best = &pop[rng.gen_range(0..pop.len())];
    for _ in 1..k {
        let c = &pop[rng.gen_range(0..pop.len())];
        if c.objective > best.objective {
            best = c;
        }
    }
    best
}

/// Moves one task to another worker it fits, or swaps it with a task held
/// by another worker. Returns the parent unchanged when neither is possible.
fn mutate(model: &Model, parent: &Candidate, rng: &mut ChaCha8Rng) -> Candidate {
    let n = model.task_count();
    let m = model.worker_count();
    if n == 0 || m < 2 {
        return parent.clone();
    }

    let mut occ = occupancy_of(model, &parent.assignment);
    let t = rng.gen_range(0..n);
    let Some(from) = occ.unplace(model, t) else {
        return parent.clone();
    };

    let targets: Vec<usize> = (0..m)
        .filter(|&w| w != from && occ.fits(model, t, w))
        .collect();
    if let Some(&w) = targets.choose(rng) {
        occ.place(model, t, w);
        return Candidate::evaluate(model, occ.into_assignment());
    }

    let u = rng.gen_range(0..n);
    match occ.worker_of(u) {
        Some(to) if to != from => {
            occ.unplace(model, u);
            if occ.fits(model, t, to) {
                occ.place(model, t, to);
                if occ.fits(model, u, from) {
                    occ.place(model, u, from);
                    return Candidate::evaluate(model, occ.into_assignment());
                }
            }
        }
        _ => {}
    }
    parent.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::{check, solve, Instance};
    use std::time::Duration;
    use types::{ConstraintParams, ObjectiveWeights, Task, WorkerId};

    fn instance(tasks: Vec<Task>, workers: usize, params: ConstraintParams) -> Instance {
        let workers = (1..=workers).map(|i| WorkerId(format!("C{i:02}"))).collect();
        Instance::build(tasks, workers, params).unwrap()
    }

    fn heuristic() -> SolveParams {
        SolveParams {
            solver: types::SolverKind::Heuristic,
            seed: 7,
            ..SolveParams::default()
        }
    }

    fn day() -> Vec<Task> {
        vec![
            Task::new("F101", 6.0, 3.5, 1),
            Task::new("F102", 7.0, 3.5, 1),
            Task::new("F203", 10.5, 2.5, 2),
            Task::new("F204", 13.0, 3.0, 2),
            Task::new("F305", 13.0, 5.0, 1),
            Task::new("F108", 12.0, 2.0, 1),
            Task::new("F601", 6.0, 1.0, 1),
            Task::new("F602", 7.5, 4.0, 2),
            Task::new("F701", 11.0, 3.0, 1),
            Task::new("F801", 8.0, 2.0, 1),
        ]
    }

    #[test]
    fn finds_valid_schedule() {
        let inst = instance(day(), 5, ConstraintParams::default());
        let res = solve(&HeurSolver::new(), &inst, &heuristic()).unwrap();
        assert!(res.status.has_schedule(), "status {}", res.status);
        assert_eq!(res.assignments.len(), 10);
        assert_eq!(res.violation_count, 0);
        assert!(res.objective <= 10 * 5 + 5 * 13);
    }

    #[test]
    fn reaching_the_upper_bound_is_optimal() {
        let tasks = vec![Task::new("A", 6.0, 1.0, 1), Task::new("B", 12.0, 1.0, 2)];
        let inst = instance(tasks, 2, ConstraintParams::default());
        let res = solve(&HeurSolver::new(), &inst, &heuristic()).unwrap();
        assert_eq!(res.status, SolveStatus::Optimal);
        assert_eq!(res.objective, 10 * 2 + 5 * 3);
    }

    #[test]
    fn same_seed_same_schedule() {
        let inst = instance(day(), 5, ConstraintParams::default());
        let a = solve(&HeurSolver::new(), &inst, &heuristic()).unwrap();
        let b = solve(&HeurSolver::new(), &inst, &heuristic()).unwrap();
        assert_eq!(a.status, b.status);
        assert_eq!(a.objective, b.objective);
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn presolve_infeasibility_is_reported() {
        let params = ConstraintParams {
            max_duty_hours: 2.0,
            ..ConstraintParams::default()
        };
        let inst = instance(vec![Task::new("A", 6.0, 3.0, 1)], 3, params);
        let res = solve(&HeurSolver::new(), &inst, &heuristic()).unwrap();
        assert_eq!(res.status, SolveStatus::Infeasible);
        assert_eq!(res.stats["method"], "presolve");
    }

    #[test]
    fn unproven_failure_runs_to_the_deadline() {
        let tasks = vec![Task::new("A", 6.0, 2.0, 1), Task::new("B", 7.0, 2.0, 1)];
        let inst = instance(tasks, 1, ConstraintParams::default());
        let params = SolveParams {
            time_limit_sec: 0.2,
            ..heuristic()
        };
        let res = solve(&HeurSolver::new(), &inst, &params).unwrap();
        assert_eq!(res.status, SolveStatus::TimedOut);
        assert!(res.assignments.is_empty());
        assert!(res.solve_duration_seconds >= 0.2, "{}", res.solve_duration_seconds);
        assert!(res.stats["constructAttempts"].as_u64().unwrap() > 200);
    }

    #[test]
    fn expired_deadline_yields_no_schedule() {
        let inst = instance(day(), 5, ConstraintParams::default());
        let model = Model::build(&inst, ObjectiveWeights::default());
        let raw = HeurSolver::new().solve_model(&model, &heuristic(), Instant::now());
        assert_eq!(raw.status, SolveStatus::TimedOut);
    }

    #[test]
    fn mutation_keeps_assignment_feasible() {
        let inst = instance(day(), 5, ConstraintParams::default());
        let model = Model::build(&inst, ObjectiveWeights::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut cand = (0..50)
            .find_map(|_| randomized_construct(&model, &mut rng))
            .expect("construction");
        for _ in 0..200 {
            cand = mutate(&model, &cand, &mut rng);
            assert!(check::violations(&inst, &cand.assignment).is_empty());
            assert_eq!(cand.objective, model.objective(&cand.assignment));
        }
    }

    #[test]
    fn insert_sorted_keeps_best_first() {
        let mut pop = Vec::new();
        for objective in [5, 9, 1, 9] {
            insert_sorted(
                &mut pop,
                Candidate {
                    assignment: vec![],
                    objective,
                },
            );
        }
        let order: Vec<_> = pop.iter().map(|c| c.objective).collect();
        assert_eq!(order, vec![9, 9, 5, 1]);
    }

    #[test]
    fn tight_deadline_still_returns() {
        let inst = instance(day(), 5, ConstraintParams::default());
        let model = Model::build(&inst, ObjectiveWeights::default());
        let deadline = Instant::now() + Duration::from_millis(50);
        let raw = HeurSolver::new()
            .with_iterations(usize::MAX)
            .solve_model(&model, &heuristic(), deadline);
        assert!(matches!(
            raw.status,
            SolveStatus::Optimal | SolveStatus::Feasible | SolveStatus::TimedOut
        ));
    }
}
