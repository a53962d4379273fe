//! Project descriptor (`package.json`)
//!
//! The descriptor is read once at startup and never changes during a
//! process. Only the fields the build needs are modelled.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::project::ProjectError;

/// File name of the project descriptor
pub const DESCRIPTOR_FILE: &str = "package.json";

/// Source tree declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sources {
    /// Source directory, relative to the project root
    pub dir: PathBuf,

    /// Ordered globs relative to `dir`; order is the concatenation order
    pub files: Vec<String>,

    /// Entry file relative to `dir`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,
}

/// One extension bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Extension {
    /// Directory under `<sources.dir>/extensions/`
    pub dir: PathBuf,

    /// Files in concatenation order, relative to `dir`
    pub files: Vec<PathBuf>,
}

/// Immutable project metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
    pub sources: Sources,

    #[serde(default)]
    pub extensions: BTreeMap<String, Extension>,
}

impl ProjectMetadata {
    /// Loads and validates the descriptor in `root`
    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let path = root.join(DESCRIPTOR_FILE);
        let content = fs::read_to_string(&path).map_err(|_| ProjectError::NotFound(path.clone()))?;
        Self::parse(&content).map_err(|e| match e {
            ProjectError::Parse(msg) => ProjectError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parses and validates descriptor JSON
    pub fn parse(content: &str) -> Result<Self, ProjectError> {
        let metadata: Self =
            serde_json::from_str(content).map_err(|e| ProjectError::Parse(e.to_string()))?;
        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> Result<(), ProjectError> {
        if self.name.trim().is_empty() {
            return Err(ProjectError::Invalid("name must not be empty".into()));
        }
        if self.version.trim().is_empty() {
            return Err(ProjectError::Invalid("version must not be empty".into()));
        }
        if self.sources.files.is_empty() {
            return Err(ProjectError::Invalid("sources.files must list at least one file".into()));
        }
        Ok(())
    }

    /// Lowercase library name used for output file names
    pub fn lib_name(&self) -> String {
        self.name.to_lowercase()
    }
}
