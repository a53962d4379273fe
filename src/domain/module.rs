//! Per-file module declarations
//!
//! Source files declare themselves with doc tags:
//!
//! ```text
//! /**
//!  * @module hilo/view/Bitmap
//!  * @requires hilo/core/Hilo
//!  * @requires hilo/core/Class
//!  */
//! ```
//!
//! The module name is the last segment of the id (`Bitmap`) and is also the
//! name of the variable the file exports.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("{0}: missing @module declaration")]
    MissingModule(PathBuf),

    #[error("{file}: module name '{name}' is already declared by {other}")]
    DuplicateModule {
        file: PathBuf,
        name: String,
        other: PathBuf,
    },

    #[error("{file}: module '{module}' requires unknown module '{dependency}'")]
    UnresolvedDependency {
        file: PathBuf,
        module: String,
        dependency: String,
    },
}

/// Module declaration parsed from one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    /// Full module id, e.g. `hilo/view/Bitmap`
    pub module_id: String,

    /// Exported name, e.g. `Bitmap`
    pub module_name: String,

    /// Required module ids in declaration order, without duplicates
    pub requires: Vec<String>,
}

fn module_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@module\s+([\w$./-]+)").expect("valid regex"))
}

fn requires_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@requires\s+([\w$./-]+)").expect("valid regex"))
}

/// Returns the last `/`-separated segment of a module id
pub fn name_of(module_id: &str) -> &str {
    module_id.rsplit('/').next().unwrap_or(module_id)
}

impl ModuleMetadata {
    pub fn new(module_id: impl Into<String>, requires: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let module_id = module_id.into();
        let mut deps: Vec<String> = Vec::new();
        for dep in requires {
            let dep = dep.into();
            if dep != module_id && !deps.contains(&dep) {
                deps.push(dep);
            }
        }

        Self {
            module_name: name_of(&module_id).to_string(),
            module_id,
            requires: deps,
        }
    }

    /// Parses the declaration tags of a file
    pub fn parse(path: &Path, content: &str) -> Result<Self, TransformError> {
        let module_id = module_tag()
            .captures(content)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| TransformError::MissingModule(path.to_path_buf()))?;

        let requires = requires_tag()
            .captures_iter(content)
            .map(|caps| caps[1].to_string());

        Ok(Self::new(module_id, requires))
    }

    /// Names of the required modules, in declaration order
    pub fn require_classes(&self) -> impl Iterator<Item = &str> {
        self.requires.iter().map(|id| name_of(id))
    }
}

/// All modules of one source tree, keyed by module id
#[derive(Debug, Default)]
pub struct ModuleSet {
    modules: HashMap<String, (PathBuf, ModuleMetadata)>,
    names: HashMap<String, PathBuf>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module, rejecting duplicate module names
    pub fn insert(&mut self, path: &Path, metadata: ModuleMetadata) -> Result<(), TransformError> {
        if let Some(other) = self.names.get(&metadata.module_name) {
            return Err(TransformError::DuplicateModule {
                file: path.to_path_buf(),
                name: metadata.module_name.clone(),
                other: other.clone(),
            });
        }

        self.names
            .insert(metadata.module_name.clone(), path.to_path_buf());
        self.modules
            .insert(metadata.module_id.clone(), (path.to_path_buf(), metadata));
        Ok(())
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.modules.contains_key(module_id)
    }

    /// Checks every `@requires` of `metadata` names a known module
    pub fn resolve(&self, path: &Path, metadata: &ModuleMetadata) -> Result<(), TransformError> {
        for dep in &metadata.requires {
            if !self.contains(dep) {
                return Err(TransformError::UnresolvedDependency {
                    file: path.to_path_buf(),
                    module: metadata.module_id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITMAP: &str = r#"/**
 * @class Bitmap
 * @module hilo/view/Bitmap
 * @requires hilo/core/Hilo
 * @requires hilo/core/Class
 * @requires hilo/core/Hilo
 */
var Bitmap = Class.create({});
"#;

    #[test]
    fn parses_module_and_requires() {
        let meta = ModuleMetadata::parse(Path::new("view/Bitmap.js"), BITMAP).unwrap();

        assert_eq!(meta.module_id, "hilo/view/Bitmap");
        assert_eq!(meta.module_name, "Bitmap");
        assert_eq!(meta.requires, vec!["hilo/core/Hilo", "hilo/core/Class"]);
        assert_eq!(meta.require_classes().collect::<Vec<_>>(), vec!["Hilo", "Class"]);
    }

    #[test]
    fn missing_module_tag_is_an_error() {
        let result = ModuleMetadata::parse(Path::new("a.js"), "var a = 1;");
        assert_eq!(result, Err(TransformError::MissingModule(PathBuf::from("a.js"))));
    }

    #[test]
    fn self_requirement_is_dropped() {
        let meta = ModuleMetadata::new("hilo/core/Hilo", ["hilo/core/Hilo"]);
        assert!(meta.requires.is_empty());
    }

    #[test]
    fn name_of_handles_flat_ids() {
        assert_eq!(name_of("Hilo"), "Hilo");
        assert_eq!(name_of("hilo/util/Tween"), "Tween");
    }

    #[test]
    fn module_set_rejects_duplicate_names() {
        let mut set = ModuleSet::new();
        set.insert(Path::new("a/Foo.js"), ModuleMetadata::new("lib/a/Foo", Vec::<String>::new()))
            .unwrap();
        let err = set
            .insert(Path::new("b/Foo.js"), ModuleMetadata::new("lib/b/Foo", Vec::<String>::new()))
            .unwrap_err();

        assert!(matches!(err, TransformError::DuplicateModule { name, .. } if name == "Foo"));
    }

    #[test]
    fn resolve_reports_unknown_dependency() {
        let mut set = ModuleSet::new();
        set.insert(Path::new("core/Hilo.js"), ModuleMetadata::new("hilo/core/Hilo", Vec::<String>::new()))
            .unwrap();

        let ok = ModuleMetadata::new("hilo/view/Stage", ["hilo/core/Hilo"]);
        assert!(set.resolve(Path::new("view/Stage.js"), &ok).is_ok());

        let bad = ModuleMetadata::new("hilo/view/Stage", ["hilo/core/Missing"]);
        let err = set.resolve(Path::new("view/Stage.js"), &bad).unwrap_err();
        assert_eq!(
            err,
            TransformError::UnresolvedDependency {
                file: PathBuf::from("view/Stage.js"),
                module: "hilo/view/Stage".to_string(),
                dependency: "hilo/core/Missing".to_string(),
            }
        );
    }
}
