//! Domain models for polyform
//!
//! Contains the task graph, scheduling and source transformation logic
//! without any file system concerns.

mod convention;
mod gate;
mod graph;
mod module;
mod scheduler;
mod transform;

pub use convention::{
    relative_id, ModuleWrapper, TargetConvention, WrapContext, Wrapper,
};
pub use gate::{RerunGate, Request};
pub use graph::{SchedulingError, TaskGraph};
pub use module::{name_of, ModuleMetadata, ModuleSet, TransformError};
pub use scheduler::{Action, RunReport, Scheduler, Task, TaskEvent, TaskOutcome};
pub use transform::{CommentRules, Header, Transformer};
