//! Watch mode
//!
//! The main thread receives debounced file system batches and routes each
//! changed path to the watch groups whose patterns match it. Every group
//! has a worker thread and a [`RerunGate`], so a group never runs twice at
//! once and changes made during a run collapse into one trailing run.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use glob::Pattern;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;

use super::tasks::BuildScheduler;
use crate::domain::{RerunGate, Request, SchedulingError};
use crate::pipeline::BuildContext;
use crate::storage::WatchGroup;

/// A watch group with parsed patterns
#[derive(Debug)]
pub struct CompiledGroup {
    pub patterns: Vec<Pattern>,
    pub targets: Vec<String>,
}

impl CompiledGroup {
    pub fn compile(group: &WatchGroup) -> Result<Self> {
        let patterns = group
            .patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid watch pattern '{}'", p)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns,
            targets: group.targets.clone(),
        })
    }

    /// Whether a root-relative path matches any pattern
    pub fn matches(&self, rel: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_path(rel))
    }
}

/// Leading directories of a pattern that contain no glob syntax
///
/// `src/**/*.js` yields `src`; the directory observers are registered on.
pub fn static_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                if part.contains(['*', '?', '[', '{']) {
                    break;
                }
                prefix.push(part.as_ref());
            }
            Component::CurDir => {}
            _ => break,
        }
    }
    // A plain file pattern: watch its directory
    if prefix == Path::new(pattern) && prefix.extension().is_some() {
        prefix.pop();
    }
    prefix
}

/// Indices of the groups a changed path belongs to
pub fn route(groups: &[CompiledGroup], roots: &[PathBuf], path: &Path) -> Vec<usize> {
    let Some(rel) = roots.iter().find_map(|root| path.strip_prefix(root).ok()) else {
        return Vec::new();
    };
    groups
        .iter()
        .enumerate()
        .filter(|(_, group)| group.matches(rel))
        .map(|(i, _)| i)
        .collect()
}

/// Routes one batch of changed paths and requests a run of every group hit
///
/// Each group is requested at most once per batch.
pub fn dispatch<'a, I>(
    groups: &[CompiledGroup],
    roots: &[PathBuf],
    gates: &[RerunGate],
    paths: I,
) -> Vec<(usize, Request)>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut hit = BTreeSet::new();
    for path in paths {
        hit.extend(route(groups, roots, path));
    }
    hit.into_iter().map(|i| (i, gates[i].request())).collect()
}

/// Calls `run` for every run the gate admits, until it is closed
pub fn serve(gate: &RerunGate, mut run: impl FnMut()) {
    while gate.wait_begin() {
        run();
        gate.finish();
    }
}

/// Runs `targets` once and reports through the context's output
pub fn run_targets(
    scheduler: &BuildScheduler,
    ctx: &BuildContext,
    targets: &[String],
) -> Result<bool, SchedulingError> {
    let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
    let report = scheduler.run_with(&targets, ctx, |event| ctx.output.task_event(&event))?;
    ctx.output.report(&report);
    Ok(report.success())
}

/// Observes the configured paths and re-runs groups until the watcher stops
pub fn watch(scheduler: &BuildScheduler, ctx: &BuildContext) -> Result<()> {
    let project = &ctx.project;
    let config = project.config();

    let groups = config
        .watch
        .iter()
        .map(CompiledGroup::compile)
        .collect::<Result<Vec<_>>>()?;
    for group in &groups {
        for target in &group.targets {
            if !scheduler.contains(target) {
                return Err(SchedulingError::UnknownTask(target.clone()).into());
            }
        }
    }

    let root = project.root().to_path_buf();
    let mut roots = vec![root.clone()];
    if let Ok(canonical) = root.canonicalize() {
        if canonical != root {
            roots.push(canonical);
        }
    }

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(config.tools.debounce_ms), tx)
        .context("Failed to start file watcher")?;

    let dirs: BTreeSet<PathBuf> = config
        .watch
        .iter()
        .flat_map(|g| g.patterns.iter())
        .map(|p| root.join(static_prefix(p)))
        .collect();
    for dir in &dirs {
        if !dir.exists() {
            ctx.output
                .verbose_ctx("watch", &format!("Not watching missing {}", dir.display()));
            continue;
        }
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        ctx.output.log(&format!("Watching {}", project.display_path(dir)));
    }

    let gates: Vec<RerunGate> = groups.iter().map(|_| RerunGate::new()).collect();

    thread::scope(|scope| {
        for (group, gate) in groups.iter().zip(&gates) {
            scope.spawn(move || {
                serve(gate, || {
                    if let Err(e) = run_targets(scheduler, ctx, &group.targets) {
                        ctx.output.error(&e.to_string());
                    }
                })
            });
        }

        loop {
            match rx.recv() {
                Ok(Ok(events)) => {
                    let paths = events.iter().map(|event| event.path.as_path());
                    for (i, request) in dispatch(&groups, &roots, &gates, paths) {
                        ctx.output.verbose_ctx(
                            "watch",
                            &format!("{} -> {:?}", groups[i].targets.join(", "), request),
                        );
                        if request == Request::Scheduled {
                            ctx.output.log(&format!(
                                "Change detected, re-running {}",
                                groups[i].targets.join(", ")
                            ));
                        }
                    }
                }
                Ok(Err(error)) => ctx.output.error(&format!("Watch error: {:?}", error)),
                Err(_) => break,
            }
        }

        for gate in &gates {
            gate.close();
        }
    });

    Ok(())
}
