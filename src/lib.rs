//! polyform - multi-convention build orchestrator for JavaScript libraries
//!
//! One source tree whose files declare `@module` / `@requires` tags is
//! rewritten into standalone, AMD, CommonJS, KISSY and CMD builds, with
//! platform adapter bundles, per-language API docs and registry staging.
//! Work is expressed as tasks in a dependency graph, run once or re-run on
//! file changes.

pub mod domain;
pub mod storage;
pub mod pipeline;
pub mod cli;

pub use domain::{Scheduler, TargetConvention, TaskOutcome};
pub use pipeline::{BuildContext, BuildMode};
pub use storage::Project;
