//! Task scheduler
//!
//! Tasks are declared once with their dependencies and an action. A run
//! resolves the requested targets depth-first, executing each task at most
//! once. Completion state lives only for the duration of one run.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::graph::{SchedulingError, TaskGraph};

/// Side effect performed by a task against the build context
pub type Action<C> = Box<dyn Fn(&C) -> anyhow::Result<()> + Send + Sync>;

/// A declared task
pub struct Task<C> {
    pub id: String,
    pub depends_on: Vec<String>,
    action: Action<C>,
}

/// Outcome of a single task within one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed {
        #[serde(with = "millis")]
        duration: Duration,
    },
    Failed {
        error: String,
    },
    /// Not executed because a dependency failed
    Blocked {
        by: String,
    },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. })
    }
}

/// Progress notifications emitted while a run executes
#[derive(Debug, Clone)]
pub enum TaskEvent<'a> {
    Started(&'a str),
    Finished(&'a str, &'a TaskOutcome),
}

/// Per-task outcomes of one run, in execution order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub tasks: Vec<(String, TaskOutcome)>,
}

impl RunReport {
    /// True when every visited task completed
    pub fn success(&self) -> bool {
        self.tasks.iter().all(|(_, outcome)| outcome.is_success())
    }

    pub fn outcome(&self, id: &str) -> Option<&TaskOutcome> {
        self.tasks
            .iter()
            .find(|(task, _)| task == id)
            .map(|(_, outcome)| outcome)
    }

    /// Ids of tasks whose action returned an error
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.tasks
            .iter()
            .filter_map(|(id, outcome)| match outcome {
                TaskOutcome::Failed { error } => Some((id.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Ids of tasks whose action actually ran (completed or failed)
    pub fn executed(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, TaskOutcome::Blocked { .. }))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Declares tasks and runs targets against a context of type `C`
pub struct Scheduler<C> {
    tasks: Vec<Task<C>>,
    index: HashMap<String, usize>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Declares a task
    ///
    /// Ids must be unique. A second declaration of an id is kept so that
    /// [`validate`](Self::validate) reports it; lookups resolve to the first.
    pub fn declare_task<I, S, F>(&mut self, id: impl Into<String>, depends_on: I, action: F)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&C) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let task = Task {
            id: id.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            action: Box::new(action),
        };

        self.index.entry(task.id.clone()).or_insert(self.tasks.len());
        self.tasks.push(task);
    }

    /// Declares a task that only groups its dependencies
    pub fn declare_group<I, S>(&mut self, id: impl Into<String>, depends_on: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare_task(id, depends_on, |_: &C| Ok(()));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task<C>> {
        self.index.get(id).map(|&pos| &self.tasks[pos])
    }

    /// Checks the declared tasks form a closed, acyclic graph
    pub fn validate(&self) -> Result<TaskGraph, SchedulingError> {
        TaskGraph::from_declarations(self.tasks.iter().map(|task| {
            (
                task.id.as_str(),
                task.depends_on.iter().map(String::as_str),
            )
        }))
    }

    /// Runs the given targets once
    pub fn run(&self, targets: &[&str], ctx: &C) -> Result<RunReport, SchedulingError> {
        self.run_with(targets, ctx, |_| {})
    }

    /// Runs the given targets once, reporting progress through `on_event`
    ///
    /// Validation happens before any action executes. A failed task blocks
    /// its dependents; unrelated targets still run.
    pub fn run_with<F>(
        &self,
        targets: &[&str],
        ctx: &C,
        mut on_event: F,
    ) -> Result<RunReport, SchedulingError>
    where
        F: FnMut(TaskEvent<'_>),
    {
        self.validate()?;
        for target in targets {
            if !self.contains(target) {
                return Err(SchedulingError::UnknownTask(target.to_string()));
            }
        }

        let mut run = Run {
            scheduler: self,
            ctx,
            outcomes: HashMap::new(),
            report: RunReport::default(),
            on_event: &mut on_event,
        };

        for target in targets {
            run.visit(target);
        }

        Ok(run.report)
    }
}

struct Run<'s, C, F> {
    scheduler: &'s Scheduler<C>,
    ctx: &'s C,
    outcomes: HashMap<&'s str, bool>,
    report: RunReport,
    on_event: &'s mut F,
}

impl<'s, C, F> Run<'s, C, F>
where
    F: FnMut(TaskEvent<'_>),
{
    /// Visits a task, returns whether it completed successfully
    fn visit(&mut self, id: &str) -> bool {
        let scheduler = self.scheduler;
        let task = &scheduler.tasks[scheduler.index[id]];

        if let Some(&ok) = self.outcomes.get(task.id.as_str()) {
            return ok;
        }

        let mut blocked_by = None;
        for dep in &task.depends_on {
            if !self.visit(dep) && blocked_by.is_none() {
                blocked_by = Some(dep.clone());
            }
        }

        let outcome = match blocked_by {
            Some(by) => TaskOutcome::Blocked { by },
            None => {
                (self.on_event)(TaskEvent::Started(&task.id));
                let start = Instant::now();
                match (task.action)(self.ctx) {
                    Ok(()) => TaskOutcome::Completed {
                        duration: start.elapsed(),
                    },
                    Err(e) => TaskOutcome::Failed {
                        error: format!("{:#}", e),
                    },
                }
            }
        };

        (self.on_event)(TaskEvent::Finished(&task.id, &outcome));

        let ok = outcome.is_success();
        self.outcomes.insert(task.id.as_str(), ok);
        self.report.tasks.push((task.id.clone(), outcome));
        ok
    }
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
