//! Depth-first branch-and-bound over task -> worker choices.
//!
//! Tasks are branched in a fixed order. Workers carry no attributes, so any
//! two empty workers are interchangeable: a node only ever tries the
//! lowest-index empty worker, then the workers already in use. Used workers
//! therefore always form the index prefix `0..used`.

use std::cmp::Reverse;
use std::time::Instant;

use crew_core::{Model, Occupancy};
use tracing::debug;

enum Flow {
    Continue,
    Stop,
}

#[derive(Debug)]
pub(crate) struct Outcome {
    pub best: Option<(i64, Vec<Option<usize>>)>,
    pub timed_out: bool,
    pub nodes: u64,
    pub pruned: u64,
}

/// Branch order: by start tick, most conflicted first, then input index.
pub(crate) fn branch_order(model: &Model) -> Vec<usize> {
    let mut order: Vec<usize> = (0..model.task_count()).collect();
    order.sort_by_key(|&t| (model.start(t), Reverse(model.conflicts(t).len()), t));
    order
}

pub(crate) struct Search<'a> {
    model: &'a Model,
    order: Vec<usize>,
    occ: Occupancy,
    used: usize,
    remaining_duty: i64,
    free_duty: i64,
    free_slots: usize,
    ceiling: i64,
    best: Option<(i64, Vec<Option<usize>>)>,
    deadline: Instant,
    nodes: u64,
    pruned: u64,
    timed_out: bool,
}

impl<'a> Search<'a> {
    pub fn new(model: &'a Model, deadline: Instant) -> Self {
        let m = model.worker_count();
        Self {
            model,
            order: branch_order(model),
            occ: Occupancy::new(model),
            used: 0,
            remaining_duty: (0..model.task_count()).map(|t| model.duration(t)).sum(),
            free_duty: model.capacity().saturating_mul(m as i64),
            free_slots: m.saturating_mul(model.max_tasks()),
            ceiling: model.upper_bound(),
            best: None,
            deadline,
            nodes: 0,
            pruned: 0,
            timed_out: false,
        }
    }

    /// Starts the search with a known feasible assignment as incumbent.
    pub fn with_incumbent(mut self, assignment: Vec<Option<usize>>) -> Self {
        let objective = self.model.objective(&assignment);
        self.best = Some((objective, assignment));
        self
    }

    pub fn run(mut self) -> Outcome {
        let proven = matches!(&self.best, Some((b, _)) if *b >= self.ceiling);
        if !proven {
            self.branch(0);
        }
        Outcome {
            best: self.best,
            timed_out: self.timed_out,
            nodes: self.nodes,
            pruned: self.pruned,
        }
    }

    fn branch(&mut self, depth: usize) -> Flow {
        self.nodes += 1;
        if Instant::now() >= self.deadline {
            self.timed_out = true;
            return Flow::Stop;
        }

        if depth == self.order.len() {
            return self.record_leaf();
        }

        if let Some((best, _)) = &self.best {
            if self.bound(depth) <= *best {
                self.pruned += 1;
                return Flow::Continue;
            }
        }

        let t = self.order[depth];
        let m = self.model.worker_count();
        let first_empty = (self.used < m).then_some(self.used);
        for w in first_empty.into_iter().chain(0..self.used) {
            if !self.occ.fits(self.model, t, w) {
                continue;
            }
            self.place(t, w);
            let flow = if self.forward_ok(t) {
                self.branch(depth + 1)
            } else {
                self.pruned += 1;
                Flow::Continue
            };
            self.unplace(t);
            if let Flow::Stop = flow {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn record_leaf(&mut self) -> Flow {
        let objective = self.model.score(self.used, self.model.priority_total());
        let improves = self.best.as_ref().map_or(true, |(b, _)| objective > *b);
        if improves {
            debug!(objective, nodes = self.nodes, "new incumbent");
            self.best = Some((objective, self.occ.assignment().to_vec()));
        }
        if objective >= self.ceiling {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    /// Best objective reachable below a node at `depth`.
    fn bound(&self, depth: usize) -> i64 {
        let remaining = self.order.len() - depth;
        let extra = (self.model.worker_count() - self.used).min(remaining);
        self.model.score(self.used + extra, self.model.priority_total())
    }

    fn forward_ok(&self, placed: usize) -> bool {
        let remaining = self.order.len() - self.occ.placed();
        if self.remaining_duty > self.free_duty || remaining > self.free_slots {
            return false;
        }
        // While an empty worker exists every remaining task still fits it.
        let m = self.model.worker_count();
        if self.used < m {
            return true;
        }
        self.model.conflicts(placed).iter().all(|&u| {
            self.occ.worker_of(u).is_some() || (0..m).any(|w| self.occ.fits(self.model, u, w))
        })
    }

    fn place(&mut self, t: usize, w: usize) {
        if self.occ.count(w) == 0 {
            self.used += 1;
        }
        self.occ.place(self.model, t, w);
        let d = self.model.duration(t);
        self.remaining_duty -= d;
        self.free_duty -= d;
        self.free_slots -= 1;
    }

    fn unplace(&mut self, t: usize) {
        if let Some(w) = self.occ.unplace(self.model, t) {
            if self.occ.count(w) == 0 {
                self.used -= 1;
            }
            let d = self.model.duration(t);
            self.remaining_duty += d;
            self.free_duty += d;
            self.free_slots += 1;
        }
    }
}
