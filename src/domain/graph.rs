//! Dependency graph for build tasks
//!
//! Validates declared task dependencies with cycle detection and topological
//! ordering. Uses petgraph for graph operations.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SchedulingError {
    #[error("Task dependency would create a cycle: {0} -> {1}")]
    CycleDetected(String, String),

    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(String),

    #[error("Task declared twice: {0}")]
    DuplicateTask(String),
}

/// A dependency graph over task ids
#[derive(Debug, Default)]
pub struct TaskGraph {
    /// Edge direction is dependency -> dependent
    graph: DiGraph<String, ()>,

    /// Map from task id to node index
    node_map: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from `(id, depends_on)` declarations
    ///
    /// Every referenced dependency must itself be declared.
    pub fn from_declarations<'a, I, D>(declarations: I) -> Result<Self, SchedulingError>
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let mut graph = Self::new();

        let declarations: Vec<(&str, Vec<&str>)> = declarations
            .into_iter()
            .map(|(id, deps)| (id, deps.into_iter().collect()))
            .collect();

        // First pass: add all nodes
        for (id, _) in &declarations {
            if graph.contains(id) {
                return Err(SchedulingError::DuplicateTask(id.to_string()));
            }
            graph.add_task(id);
        }

        // Second pass: add all edges
        for (id, deps) in &declarations {
            for dep in deps {
                if !graph.contains(dep) {
                    return Err(SchedulingError::UnknownDependency {
                        task: id.to_string(),
                        dependency: dep.to_string(),
                    });
                }
                graph.add_dependency(id, dep)?;
            }
        }

        Ok(graph)
    }

    /// Adds a task to the graph
    pub fn add_task(&mut self, id: &str) {
        if !self.node_map.contains_key(id) {
            let idx = self.graph.add_node(id.to_string());
            self.node_map.insert(id.to_string(), idx);
        }
    }

    /// Adds a dependency edge: `task` depends on `depends_on`
    pub fn add_dependency(&mut self, task: &str, depends_on: &str) -> Result<(), SchedulingError> {
        if task == depends_on {
            return Err(SchedulingError::SelfDependency(task.to_string()));
        }

        let task_idx = *self
            .node_map
            .get(task)
            .ok_or_else(|| SchedulingError::UnknownTask(task.to_string()))?;

        let dep_idx = *self
            .node_map
            .get(depends_on)
            .ok_or_else(|| SchedulingError::UnknownTask(depends_on.to_string()))?;

        if self.graph.find_edge(dep_idx, task_idx).is_some() {
            return Ok(());
        }

        self.graph.add_edge(dep_idx, task_idx, ());

        if is_cyclic_directed(&self.graph) {
            if let Some(edge) = self.graph.find_edge(dep_idx, task_idx) {
                self.graph.remove_edge(edge);
            }
            return Err(SchedulingError::CycleDetected(
                task.to_string(),
                depends_on.to_string(),
            ));
        }

        Ok(())
    }

    /// Returns all tasks in topological order (dependencies before dependents)
    pub fn topological_order(&self) -> Result<Vec<String>, SchedulingError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                let id = self
                    .graph
                    .node_weight(cycle.node_id())
                    .cloned()
                    .unwrap_or_default();
                Err(SchedulingError::CycleDetected(id.clone(), id))
            }
        }
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }
}
