//! The same model handed to a general MILP backend through `good_lp`.
//!
//! `x[t][w]` is the assignment decision, `y[w]` marks a worker in use and is
//! bounded above by the worker's task count, so maximising it rewards spread.

use crew_core::Model;
use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

pub(crate) struct Vars {
    pub x: Vec<Vec<Variable>>,
    pub y: Vec<Variable>,
}

pub(crate) fn declare_vars(model: &Model, vars: &mut ProblemVariables) -> Vars {
    let m = model.worker_count();
    let x = (0..model.task_count())
        .map(|_| (0..m).map(|_| vars.add(variable().binary())).collect())
        .collect();
    let y = (0..m).map(|_| vars.add(variable().binary())).collect();
    Vars { x, y }
}

pub(crate) fn build_objective(model: &Model, v: &Vars) -> Expression {
    let weights = model.weights();
    let mut objective = Expression::from(0.0);
    for &used in &v.y {
        objective = objective + (weights.utilization as f64) * used;
    }
    for (t, row) in v.x.iter().enumerate() {
        let coef = (weights.priority * model.priority(t)) as f64;
        for &x in row {
            objective = objective + coef * x;
        }
    }
    objective
}

pub(crate) fn add_coverage_constraints<M: SolverModel>(mut problem: M, v: &Vars) -> M {
    for row in &v.x {
        let mut sum = Expression::from(0.0);
        for &x in row {
            sum = sum + x;
        }
        problem = problem.with(sum.eq(1.0));
    }
    problem
}

pub(crate) fn add_worker_constraints<M: SolverModel>(mut problem: M, model: &Model, v: &Vars) -> M {
    for w in 0..model.worker_count() {
        let mut duty = Expression::from(0.0);
        let mut count = Expression::from(0.0);
        for t in 0..model.task_count() {
            duty = duty + (model.duration(t) as f64) * v.x[t][w];
            count = count + v.x[t][w];
        }
        problem = problem.with(duty.leq(model.capacity() as f64));
        problem = problem.with(count.clone().leq(model.max_tasks() as f64));
        problem = problem.with((Expression::from(v.y[w]) - count).leq(0.0));
    }
    problem
}

pub(crate) fn add_conflict_constraints<M: SolverModel>(mut problem: M, model: &Model, v: &Vars) -> M {
    for &(a, b) in model.conflict_pairs() {
        for w in 0..model.worker_count() {
            problem = problem.with((v.x[a][w] + v.x[b][w]).leq(1.0));
        }
    }
    problem
}

pub(crate) fn extract_solution(v: &Vars, sol: &impl Solution) -> Vec<Option<usize>> {
    v.x.iter()
        .map(|row| row.iter().position(|&x| sol.value(x) > 0.5))
        .collect()
}

/// `Ok(None)` when the backend proves the model infeasible.
pub(crate) fn solve_with_milp(model: &Model) -> Result<Option<Vec<Option<usize>>>, ResolutionError> {
    let mut pvars = ProblemVariables::new();
    let v = declare_vars(model, &mut pvars);
    let objective = build_objective(model, &v);

    let mut problem = pvars.maximise(objective).using(default_solver);
    problem = add_coverage_constraints(problem, &v);
    problem = add_worker_constraints(problem, model, &v);
    problem = add_conflict_constraints(problem, model, &v);

    match problem.solve() {
        Ok(sol) => Ok(Some(extract_solution(&v, &sol))),
        Err(ResolutionError::Infeasible) => Ok(None),
        Err(e) => Err(e),
    }
}
