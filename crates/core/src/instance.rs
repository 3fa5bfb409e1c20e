use std::collections::HashSet;

use crate::{Issue, ValidationError, MAX_HOURS};
use types::{ConstraintParams, InstanceInput, Task, WorkerId};

/// A validated solve instance. Only constructible through [`Instance::build`],
/// so every value reaching the model is well-formed.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    tasks: Vec<Task>,
    workers: Vec<WorkerId>,
    params: ConstraintParams,
}

impl Instance {
    pub fn build(
        tasks: Vec<Task>,
        workers: Vec<WorkerId>,
        params: ConstraintParams,
    ) -> Result<Self, ValidationError> {
        let issues = collect_issues(&tasks, &workers, &params);
        if !issues.is_empty() {
            return Err(ValidationError::InvalidInstance(issues));
        }
        Ok(Self {
            tasks,
            workers,
            params,
        })
    }

    pub fn from_input(input: &InstanceInput) -> Result<Self, ValidationError> {
        Self::build(
            input.tasks.clone(),
            input.workers.clone(),
            input.constraints.clone(),
        )
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn workers(&self) -> &[WorkerId] {
        &self.workers
    }

    pub fn params(&self) -> &ConstraintParams {
        &self.params
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

pub fn validate(input: &InstanceInput) -> Result<(), ValidationError> {
    let issues = collect_issues(&input.tasks, &input.workers, &input.constraints);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidInstance(issues))
    }
}

fn collect_issues(tasks: &[Task], workers: &[WorkerId], params: &ConstraintParams) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();

    fn chk_unique<'a>(name: &str, ids: impl Iterator<Item = &'a str>, issues: &mut Vec<Issue>) {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                issues.push(Issue::new(format!("{name}s"), format!("duplicate {name} id {id}")));
            }
        }
    }
    chk_unique("task", tasks.iter().map(|t| t.id.0.as_str()), &mut issues);
    chk_unique("worker", workers.iter().map(|w| w.0.as_str()), &mut issues);

    let too_large = |v: f64| v.abs() > MAX_HOURS;
    let limit_issue = |field: String, v: f64| {
        Issue::new(field, format!("must not exceed {MAX_HOURS} hours, got {v}"))
    };

    for t in tasks {
        let field = |f: &str| format!("tasks[{}].{f}", t.id);
        if !t.start.is_finite() {
            issues.push(Issue::new(field("start"), format!("must be finite, got {}", t.start)));
        } else if too_large(t.start) {
            issues.push(limit_issue(field("start"), t.start));
        }
        if !t.duration.is_finite() || t.duration <= 0.0 {
            issues.push(Issue::new(
                field("duration"),
                format!("must be positive, got {}", t.duration),
            ));
        } else if too_large(t.duration) {
            issues.push(limit_issue(field("duration"), t.duration));
        }
        if t.priority == 0 {
            issues.push(Issue::new(field("priority"), "must be at least 1"));
        }
    }

    if !params.max_duty_hours.is_finite() || params.max_duty_hours <= 0.0 {
        issues.push(Issue::new(
            "constraints.maxDutyHours",
            format!("must be positive, got {}", params.max_duty_hours),
        ));
    } else if too_large(params.max_duty_hours) {
        issues.push(limit_issue(
            "constraints.maxDutyHours".into(),
            params.max_duty_hours,
        ));
    }
    if !params.min_rest_hours.is_finite() || params.min_rest_hours < 0.0 {
        issues.push(Issue::new(
            "constraints.minRestHours",
            format!("must be non-negative, got {}", params.min_rest_hours),
        ));
    } else if too_large(params.min_rest_hours) {
        issues.push(limit_issue(
            "constraints.minRestHours".into(),
            params.min_rest_hours,
        ));
    }
    if params.max_tasks_per_worker == 0 {
        issues.push(Issue::new(
            "constraints.maxTasksPerWorker",
            "must be positive, got 0",
        ));
    }

    issues
}
