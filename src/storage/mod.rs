//! # Storage Layer
//!
//! Loads the project and owns the on-disk layout the pipelines write to.
//!
//! ## Inputs
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project descriptor | JSON | `package.json` |
//! | Build configuration | TOML | `build.toml` (optional) |
//! | Tool overrides | TOML | `~/.config/polyform/config.toml` (optional) |
//!
//! ## Output Layout
//!
//! ```text
//! build/
//! ├── standalone/
//! │   ├── hilo/…             # per-file outputs (+ .min.js)
//! │   ├── hilo-standalone.js # combined artifact (+ .min.js)
//! │   └── hilo-standalone.zip
//! ├── commonjs/…             # per-file outputs only
//! ├── flash/                 # adapter bundle and assets
//! ├── <extension>/           # one directory per extension
//! └── npm/                   # publish staging
//! docs/
//! └── api-<lang>/
//!     └── code/              # filtered sources for the doc generator
//! ```

mod config;
mod descriptor;
pub mod fsutil;
mod project;

pub use config::{
    AdapterConfig, BuildConfig, ConfigError, DocsConfig, GlobalConfig, HeaderConfig,
    PublishConfig, TestConfig, ToolOverrides, ToolsConfig, WatchGroup, CONFIG_FILE,
};
pub use descriptor::{Extension, ProjectMetadata, Sources, DESCRIPTOR_FILE};
pub use project::{Project, ProjectError, SourceFile};
