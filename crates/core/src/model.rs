//! Integer formulation of an [`Instance`].
//!
//! All times are held as fixed-point ticks (hundredths of an hour) so that
//! capacity sums and the rest-buffer conflict test run on integers. Hours
//! that fall between ticks are rounded against the schedule: durations, ends
//! and rest up, starts and the duty limit down. Whatever the model accepts
//! therefore also holds on the raw hours.
//!
//! - coverage: each task on exactly one worker
//! - duty: sum of duration ticks per worker <= capacity ticks
//! - count: tasks per worker <= `max_tasks`
//! - rest: two conflicting tasks never share a worker
//!
//! The objective rewards every worker that owns at least one task
//! (`weights.utilization`) plus the priority of every assigned task
//! (`weights.priority`).

use std::fmt;

use crate::Instance;
use types::ObjectiveWeights;

pub const FIXED_POINT_SCALE: f64 = 100.0;

// Absorbs float noise such as 1.1 * 100 = 110.00000000000001.
const TICK_EPSILON: f64 = 1e-7;

/// Largest tick count not above `hours`.
pub fn ticks_down(hours: f64) -> i64 {
    (hours * FIXED_POINT_SCALE + TICK_EPSILON).floor() as i64
}

/// Smallest tick count not below `hours`.
pub fn ticks_up(hours: f64) -> i64 {
    (hours * FIXED_POINT_SCALE - TICK_EPSILON).ceil() as i64
}

/// Whether two intervals, widened by `rest` on the trailing side, overlap.
pub fn intervals_conflict(start1: i64, end1: i64, start2: i64, end2: i64, rest: i64) -> bool {
    !(end1.saturating_add(rest) <= start2 || end2.saturating_add(rest) <= start1)
}

/// Reason a model cannot have any feasible assignment, found before search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Infeasibility {
    NoWorkers { tasks: usize },
    TaskExceedsDuty { task: usize, duration: i64, capacity: i64 },
    SlotShortage { slots: usize, tasks: usize },
    DutyShortage { demand: i64, capacity: i64 },
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::NoWorkers { tasks } => write!(f, "{tasks} tasks but no workers"),
            Infeasibility::TaskExceedsDuty {
                task,
                duration,
                capacity,
            } => write!(
                f,
                "task #{task} needs {duration} ticks, duty limit is {capacity}"
            ),
            Infeasibility::SlotShortage { slots, tasks } => {
                write!(f, "{tasks} tasks but only {slots} worker slots")
            }
            Infeasibility::DutyShortage { demand, capacity } => {
                write!(f, "{demand} duty ticks demanded, {capacity} available")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Model {
    start: Vec<i64>,
    end: Vec<i64>,
    duration: Vec<i64>,
    priority: Vec<i64>,
    worker_count: usize,
    capacity: i64,
    max_tasks: usize,
    rest: i64,
    conflicts: Vec<Vec<usize>>,
    pairs: Vec<(usize, usize)>,
    weights: ObjectiveWeights,
}

impl Model {
    pub fn build(inst: &Instance, weights: ObjectiveWeights) -> Self {
        let tasks = inst.tasks();
        let params = inst.params();

        let start: Vec<i64> = tasks.iter().map(|t| ticks_down(t.start)).collect();
        let end: Vec<i64> = tasks.iter().map(|t| ticks_up(t.end())).collect();
        let duration: Vec<i64> = tasks.iter().map(|t| ticks_up(t.duration)).collect();
        let priority: Vec<i64> = tasks.iter().map(|t| i64::from(t.priority)).collect();
        let rest = ticks_up(params.min_rest_hours);

        // The predicate depends only on the pair, so one list serves every worker.
        let n = tasks.len();
        let mut conflicts: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut pairs = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                if intervals_conflict(start[a], end[a], start[b], end[b], rest) {
                    conflicts[a].push(b);
                    conflicts[b].push(a);
                    pairs.push((a, b));
                }
            }
        }

        Self {
            start,
            end,
            duration,
            priority,
            worker_count: inst.worker_count(),
            capacity: ticks_down(params.max_duty_hours),
            max_tasks: params.max_tasks_per_worker as usize,
            rest,
            conflicts,
            pairs,
            weights,
        }
    }

    pub fn task_count(&self) -> usize {
        self.duration.len()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn start(&self, t: usize) -> i64 {
        self.start[t]
    }

    pub fn end(&self, t: usize) -> i64 {
        self.end[t]
    }

    pub fn duration(&self, t: usize) -> i64 {
        self.duration[t]
    }

    pub fn priority(&self, t: usize) -> i64 {
        self.priority[t]
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn rest(&self) -> i64 {
        self.rest
    }

    pub fn weights(&self) -> ObjectiveWeights {
        self.weights
    }

    /// Tasks that may not share a worker with `t`, ascending.
    pub fn conflicts(&self, t: usize) -> &[usize] {
        &self.conflicts[t]
    }

    pub fn conflict_pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn in_conflict(&self, a: usize, b: usize) -> bool {
        self.conflicts[a].binary_search(&b).is_ok()
    }

    pub fn priority_total(&self) -> i64 {
        self.priority.iter().fold(0, |acc, &p| acc.saturating_add(p))
    }

    pub fn spread_bonus(&self, workers_used: usize) -> i64 {
        self.weights.utilization.saturating_mul(workers_used as i64)
    }

    /// Objective for `workers_used` distinct workers and a priority sum.
    /// Saturates instead of wrapping on extreme weights.
    pub fn score(&self, workers_used: usize, priority_sum: i64) -> i64 {
        self.spread_bonus(workers_used)
            .saturating_add(self.weights.priority.saturating_mul(priority_sum))
    }

    /// Objective of a (possibly partial) assignment.
    pub fn objective(&self, assignment: &[Option<usize>]) -> i64 {
        let mut used = vec![false; self.worker_count];
        let mut prio = 0i64;
        for (t, w) in assignment.iter().enumerate() {
            if let Some(w) = *w {
                if let Some(slot) = used.get_mut(w) {
                    *slot = true;
                }
                prio = prio.saturating_add(self.priority[t]);
            }
        }
        let used_count = used.iter().filter(|&&u| u).count();
        self.score(used_count, prio)
    }

    /// Best objective any complete assignment could reach.
    pub fn upper_bound(&self) -> i64 {
        let spread = self.worker_count.min(self.task_count());
        self.score(spread, self.priority_total())
    }

    pub fn presolve(&self) -> Option<Infeasibility> {
        let n = self.task_count();
        if n == 0 {
            return None;
        }
        if self.worker_count == 0 {
            return Some(Infeasibility::NoWorkers { tasks: n });
        }
        if let Some(task) = (0..n).find(|&t| self.duration[t] > self.capacity) {
            return Some(Infeasibility::TaskExceedsDuty {
                task,
                duration: self.duration[task],
                capacity: self.capacity,
            });
        }
        let slots = self.worker_count.saturating_mul(self.max_tasks);
        if slots < n {
            return Some(Infeasibility::SlotShortage { slots, tasks: n });
        }
        let demand = self.duration.iter().fold(0i64, |acc, &d| acc.saturating_add(d));
        let capacity = self.capacity.saturating_mul(self.worker_count as i64);
        if demand > capacity {
            return Some(Infeasibility::DutyShortage { demand, capacity });
        }
        None
    }
}

/// Per-worker accumulators for a partial assignment.
#[derive(Clone, Debug)]
pub struct Occupancy {
    assignment: Vec<Option<usize>>,
    load: Vec<i64>,
    count: Vec<usize>,
    placed: usize,
}

impl Occupancy {
    pub fn new(model: &Model) -> Self {
        Self {
            assignment: vec![None; model.task_count()],
            load: vec![0; model.worker_count()],
            count: vec![0; model.worker_count()],
            placed: 0,
        }
    }

    pub fn assignment(&self) -> &[Option<usize>] {
        &self.assignment
    }

    pub fn worker_of(&self, t: usize) -> Option<usize> {
        self.assignment[t]
    }

    pub fn load(&self, w: usize) -> i64 {
        self.load[w]
    }

    pub fn count(&self, w: usize) -> usize {
        self.count[w]
    }

    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn is_complete(&self) -> bool {
        self.placed == self.assignment.len()
    }

    pub fn fits(&self, model: &Model, t: usize, w: usize) -> bool {
        self.count[w] < model.max_tasks
            && self.load[w] + model.duration[t] <= model.capacity
            && model
                .conflicts(t)
                .iter()
                .all(|&u| self.assignment[u] != Some(w))
    }

    pub fn place(&mut self, model: &Model, t: usize, w: usize) {
        debug_assert!(self.assignment[t].is_none());
        self.assignment[t] = Some(w);
        self.load[w] += model.duration[t];
        self.count[w] += 1;
        self.placed += 1;
    }

    pub fn unplace(&mut self, model: &Model, t: usize) -> Option<usize> {
        let w = self.assignment[t].take()?;
        self.load[w] -= model.duration[t];
        self.count[w] -= 1;
        self.placed -= 1;
        Some(w)
    }

    pub fn into_assignment(self) -> Vec<Option<usize>> {
        self.assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ConstraintParams, Task, WorkerId};

    fn instance(tasks: Vec<Task>, workers: usize, params: ConstraintParams) -> Instance {
        let workers = (0..workers).map(|i| WorkerId(format!("C{i:02}"))).collect();
        Instance::build(tasks, workers, params).unwrap()
    }

    fn params(max_duty: f64, rest: f64, max_tasks: u32) -> ConstraintParams {
        ConstraintParams {
            max_duty_hours: max_duty,
            min_rest_hours: rest,
            max_tasks_per_worker: max_tasks,
        }
    }

    #[test]
    fn rest_buffer_creates_conflict() {
        // 6.0-8.0 and 8.25-9.0 are 15 minutes apart, rest needs 30.
        let inst = instance(
            vec![
                Task::new("A", 6.0, 2.0, 1),
                Task::new("B", 8.25, 0.75, 1),
                Task::new("C", 8.5, 1.0, 1),
            ],
            1,
            params(9.0, 0.5, 4),
        );
        let m = Model::build(&inst, ObjectiveWeights::default());
        assert!(m.in_conflict(0, 1));
        assert!(!m.in_conflict(0, 2));
        assert!(m.in_conflict(1, 2));
        assert_eq!(m.conflict_pairs(), &[(0, 1), (1, 2)]);
        assert_eq!(m.conflicts(1), &[0, 2]);
    }

    #[test]
    fn exact_rest_gap_is_allowed() {
        let inst = instance(
            vec![Task::new("A", 6.0, 1.0, 1), Task::new("B", 7.5, 1.0, 1)],
            1,
            params(9.0, 0.5, 4),
        );
        let m = Model::build(&inst, ObjectiveWeights::default());
        assert!(m.conflict_pairs().is_empty());
    }

    #[test]
    fn durations_are_fixed_point() {
        let inst = instance(vec![Task::new("A", 6.0, 3.5, 2)], 1, params(9.0, 0.5, 4));
        let m = Model::build(&inst, ObjectiveWeights::default());
        assert_eq!(m.duration(0), 350);
        assert_eq!(m.end(0), 950);
        assert_eq!(m.capacity(), 900);
        assert_eq!(m.rest(), 50);
    }

    #[test]
    fn sub_tick_hours_round_against_the_schedule() {
        assert_eq!(ticks_down(0.996), 99);
        assert_eq!(ticks_up(0.004), 1);
        assert_eq!(ticks_up(1.1), 110);
        assert_eq!(ticks_down(1.1), 110);

        // 0.996h of duty cannot hold a 1h task.
        let inst = instance(vec![Task::new("A", 6.0, 1.0, 1)], 1, params(0.996, 0.0, 4));
        let m = Model::build(&inst, ObjectiveWeights::default());
        assert!(matches!(
            m.presolve(),
            Some(Infeasibility::TaskExceedsDuty { task: 0, .. })
        ));

        // A 0.004h rest still separates back-to-back tasks.
        let inst = instance(
            vec![Task::new("A", 6.0, 1.0, 1), Task::new("B", 7.0, 1.0, 1)],
            1,
            params(9.0, 0.004, 4),
        );
        let m = Model::build(&inst, ObjectiveWeights::default());
        assert!(m.in_conflict(0, 1));
    }

    #[test]
    fn huge_duty_limit_and_weights_do_not_overflow() {
        let inst = instance(
            vec![Task::new("A", 6.0, 1.0, 1), Task::new("B", 12.0, 1.0, 1)],
            2,
            params(crate::MAX_HOURS, 0.5, 4),
        );
        let m = Model::build(&inst, ObjectiveWeights::default());
        assert_eq!(m.presolve(), None);
        assert_eq!(m.capacity(), 100_000_000);

        let heavy = ObjectiveWeights {
            utilization: i64::MAX / 2,
            priority: i64::MAX / 2,
        };
        let m = Model::build(&inst, heavy);
        assert_eq!(m.upper_bound(), i64::MAX);
        assert_eq!(m.objective(&[Some(0), Some(1)]), i64::MAX);
    }

    #[test]
    fn objective_counts_workers_and_priorities() {
        let inst = instance(
            vec![Task::new("A", 6.0, 1.0, 1), Task::new("B", 10.0, 1.0, 3)],
            2,
            params(9.0, 0.5, 4),
        );
        let m = Model::build(&inst, ObjectiveWeights::default());
        assert_eq!(m.objective(&[Some(0), Some(1)]), 10 * 2 + 5 * 4);
        assert_eq!(m.objective(&[Some(0), Some(0)]), 10 + 5 * 4);
        assert_eq!(m.upper_bound(), 40);
    }

    #[test]
    fn presolve_detects_trivial_infeasibility() {
        let tasks = || vec![Task::new("A", 6.0, 2.0, 1), Task::new("B", 12.0, 2.0, 1)];

        let m = Model::build(&instance(tasks(), 0, params(9.0, 0.5, 4)), Default::default());
        assert_eq!(m.presolve(), Some(Infeasibility::NoWorkers { tasks: 2 }));

        let m = Model::build(&instance(tasks(), 3, params(1.5, 0.5, 4)), Default::default());
        assert!(matches!(
            m.presolve(),
            Some(Infeasibility::TaskExceedsDuty { task: 0, .. })
        ));

        let m = Model::build(&instance(tasks(), 1, params(9.0, 0.5, 1)), Default::default());
        assert_eq!(
            m.presolve(),
            Some(Infeasibility::SlotShortage { slots: 1, tasks: 2 })
        );

        let m = Model::build(&instance(tasks(), 1, params(3.0, 0.5, 4)), Default::default());
        assert_eq!(
            m.presolve(),
            Some(Infeasibility::DutyShortage {
                demand: 400,
                capacity: 300
            })
        );

        let m = Model::build(&instance(tasks(), 1, params(9.0, 0.5, 4)), Default::default());
        assert_eq!(m.presolve(), None);
    }

    #[test]
    fn occupancy_tracks_fit() {
        let inst = instance(
            vec![
                Task::new("A", 6.0, 2.0, 1),
                Task::new("B", 7.0, 2.0, 1),
                Task::new("C", 12.0, 2.0, 1),
            ],
            2,
            params(3.0, 0.5, 4),
        );
        let m = Model::build(&inst, ObjectiveWeights::default());
        let mut occ = Occupancy::new(&m);
        occ.place(&m, 0, 0);
        assert!(!occ.fits(&m, 1, 0), "conflict with A");
        assert!(occ.fits(&m, 1, 1));
        assert!(!occ.fits(&m, 2, 0), "duty limit");
        assert_eq!(occ.unplace(&m, 0), Some(0));
        assert!(occ.fits(&m, 2, 0));
        assert_eq!(occ.placed(), 0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn conflict_is_symmetric(
                s1 in 0i64..2400, d1 in 1i64..600,
                s2 in 0i64..2400, d2 in 1i64..600,
                rest in 0i64..200,
            ) {
                prop_assert_eq!(
                    intervals_conflict(s1, s1 + d1, s2, s2 + d2, rest),
                    intervals_conflict(s2, s2 + d2, s1, s1 + d1, rest)
                );
                prop_assert!(intervals_conflict(s1, s1 + d1, s1, s1 + d1, rest));
            }

            #[test]
            fn unplace_restores_occupancy(
                moves in prop::collection::vec((0usize..4, 0usize..3), 1..12)
            ) {
                let tasks = (0..4)
                    .map(|i| Task::new(format!("T{i}"), 6.0 + 3.0 * i as f64, 1.0, 1))
                    .collect();
                let m = Model::build(&instance(tasks, 3, params(9.0, 0.5, 4)), Default::default());
                let mut occ = Occupancy::new(&m);
                let mut placed = Vec::new();
                for (t, w) in moves {
                    if occ.worker_of(t).is_none() && occ.fits(&m, t, w) {
                        occ.place(&m, t, w);
                        placed.push(t);
                    }
                }
                for t in placed.into_iter().rev() {
                    prop_assert!(occ.unplace(&m, t).is_some());
                }
                prop_assert_eq!(occ.placed(), 0);
                for w in 0..3 {
                    prop_assert_eq!(occ.load(w), 0);
                    prop_assert_eq!(occ.count(w), 0);
                }
            }
        }
    }
}
