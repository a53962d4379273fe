//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use super::output::{Output, OutputFormat};
use super::tasks::{declare_tasks, implies_fast_mode, BuildScheduler};
use super::watch;
use crate::domain::TaskGraph;
use crate::pipeline::{BuildContext, BuildMode, Toolchain};
use crate::storage::Project;

#[derive(Parser)]
#[command(name = "polyform")]
#[command(author, version, about = "Build one library source tree into several module conventions")]
pub struct Cli {
    /// Targets to run
    #[arg(default_value = "default")]
    pub targets: Vec<String>,

    /// Project directory
    #[arg(long = "project", short = 'C', default_value = ".")]
    pub project: PathBuf,

    /// Skip minify and archive, then keep rebuilding on source changes
    #[arg(long, env = "POLYFORM_WATCH")]
    pub watch: bool,

    /// Skip minify and archive without watching
    #[arg(long, env = "POLYFORM_FAST")]
    pub fast: bool,

    /// Show the UI test runner window
    #[arg(long, env = "POLYFORM_VISIBLE")]
    pub visible: bool,

    /// Output format
    #[arg(long, short = 'f', default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// List declared tasks and their dependencies
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// Build mode of this invocation
    pub fn mode(&self) -> BuildMode {
        if self.watch || self.fast || implies_fast_mode(&self.targets) {
            BuildMode::Watch
        } else {
            BuildMode::Release
        }
    }

    /// Whether observers start once the initial run succeeds
    pub fn observes_changes(&self) -> bool {
        self.watch || self.targets.iter().any(|t| t == "watch")
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("polyform starting");

    let project = Project::open(&cli.project)?;
    output.verbose_ctx(
        "project",
        &format!(
            "{} {} at {}",
            project.metadata().name,
            project.metadata().version,
            project.root().display()
        ),
    );

    let scheduler = declare_tasks(&project);
    let graph = scheduler.validate()?;

    if cli.list {
        list_tasks(&output, &scheduler, &graph)?;
        return Ok(());
    }

    let mode = cli.mode();
    output.verbose_ctx("mode", &format!("{:?}", mode));

    let tools = Toolchain::for_project(&project);
    let mut ctx = BuildContext::new(project, mode, tools, output);
    ctx.visible = cli.visible;

    let success = watch::run_targets(&scheduler, &ctx, &cli.targets)?;
    if !success {
        bail!("Build failed");
    }

    if cli.observes_changes() {
        watch::watch(&scheduler, &ctx)?;
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Prints every task in run order with its declared dependencies
fn list_tasks(output: &Output, scheduler: &BuildScheduler, graph: &TaskGraph) -> Result<()> {
    let order = graph.topological_order()?;
    let tasks = order.iter().filter_map(|id| scheduler.task(id));

    if output.is_json() {
        let tasks: Vec<_> = tasks
            .map(|t| serde_json::json!({ "id": t.id, "depends_on": t.depends_on }))
            .collect();
        output.data(&tasks);
        return Ok(());
    }

    for task in tasks {
        let deps = task.depends_on.join(", ");
        output.row(&[task.id.as_str(), deps.as_str()]);
    }
    Ok(())
}
