//! Project management
//!
//! A project is a directory holding the descriptor (`package.json`) and an
//! optional `build.toml`. Provides the paths every pipeline writes to.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::BuildConfig;
use super::descriptor::ProjectMetadata;
use super::fsutil::find_files;
use crate::domain::{CommentRules, Header, TargetConvention, Transformer, WrapContext};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project descriptor not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid project descriptor: {0}")]
    Invalid(String),

    #[error("Failed to parse project descriptor: {0}")]
    Parse(String),

    #[error("Source pattern '{0}' matched no files")]
    NoMatch(String),
}

/// One source file of the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (root-joined) path
    pub path: PathBuf,

    /// Path relative to the source directory
    pub rel: PathBuf,
}

/// A polyform project
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    metadata: ProjectMetadata,
    config: BuildConfig,
}

impl Project {
    /// Opens the project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = ProjectMetadata::load(&root)?;
        let config = BuildConfig::load(&root)?;
        Ok(Self {
            root,
            metadata,
            config,
        })
    }

    /// Builds a project from already loaded parts
    pub fn from_parts(root: impl Into<PathBuf>, metadata: ProjectMetadata, config: BuildConfig) -> Self {
        Self {
            root: root.into(),
            metadata,
            config,
        }
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Lowercase library name used in output file names
    pub fn lib_name(&self) -> String {
        self.metadata.lib_name()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.metadata.sources.dir)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.config.build_dir)
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.root.join(&self.config.docs_dir)
    }

    /// Output directory of one convention
    pub fn convention_dir(&self, convention: TargetConvention) -> PathBuf {
        self.build_dir().join(convention.as_str())
    }

    /// Combined artifact of a concatenating convention
    pub fn bundle_path(&self, convention: TargetConvention) -> PathBuf {
        self.convention_dir(convention)
            .join(format!("{}-{}.js", self.lib_name(), convention))
    }

    /// Archive of one convention
    pub fn archive_path(&self, convention: TargetConvention) -> PathBuf {
        self.convention_dir(convention)
            .join(format!("{}-{}.zip", self.lib_name(), convention))
    }

    /// Directory the per-file outputs of a convention are written to
    pub fn module_dir(&self, convention: TargetConvention) -> PathBuf {
        if convention.concatenates_output() {
            self.convention_dir(convention).join(self.lib_name())
        } else {
            self.convention_dir(convention)
        }
    }

    /// Root of one language's documentation
    pub fn doc_dir(&self, language: &str) -> PathBuf {
        self.docs_dir().join(format!("api-{}", language))
    }

    /// Filtered source tree handed to the documentation generator
    pub fn doc_staging_dir(&self, language: &str) -> PathBuf {
        self.doc_dir(language).join("code")
    }

    pub fn publish_dir(&self) -> PathBuf {
        self.build_dir().join(&self.config.publish.dir)
    }

    /// Expands the declared source globs in declaration order
    ///
    /// Matches of one glob are sorted; a file matched by several globs is
    /// kept at its first position. A glob matching nothing is an error.
    pub fn source_files(&self) -> Result<Vec<SourceFile>> {
        let source_dir = self.source_dir();
        let mut files: Vec<SourceFile> = Vec::new();

        for pattern in &self.metadata.sources.files {
            let matches = find_files(&source_dir, pattern)
                .with_context(|| format!("Failed to expand source pattern '{}'", pattern))?;
            if matches.is_empty() {
                return Err(ProjectError::NoMatch(pattern.clone()).into());
            }

            for path in matches {
                if files.iter().any(|f| f.path == path) {
                    continue;
                }
                let rel = path.strip_prefix(&source_dir).unwrap_or(&path).to_path_buf();
                files.push(SourceFile { path, rel });
            }
        }

        Ok(files)
    }

    fn names_entry(&self, file: &SourceFile) -> bool {
        match &self.metadata.sources.entry {
            Some(entry) => file.rel == *entry,
            None => file
                .rel
                .file_stem()
                .map(|stem| stem.to_string_lossy() == self.metadata.name)
                .unwrap_or(false),
        }
    }

    /// Picks the library's entry file among `files`
    ///
    /// Without an explicit `sources.entry` this is the first listed file
    /// whose stem equals the project name. Later namesakes are ordinary
    /// modules.
    pub fn entry_file<'a>(&self, files: &'a [SourceFile]) -> Option<&'a SourceFile> {
        files.iter().find(|f| self.names_entry(f))
    }

    /// Header stamped on artifacts
    pub fn header(&self) -> Header {
        Header {
            name: self.metadata.name.clone(),
            version: self.metadata.version.clone(),
            copyright: self.config.header.copyright.clone(),
            license: self.config.header.license.clone(),
        }
    }

    pub fn comment_rules(&self) -> Result<CommentRules> {
        CommentRules::new(
            &self.config.header.holder,
            &self.config.header.license,
            &self.config.docs.languages,
        )
        .context("Failed to compile comment patterns")
    }

    /// Transformer configured for this project
    pub fn transformer(&self) -> Result<Transformer> {
        Ok(Transformer {
            wrap: WrapContext::new(&self.metadata.name, &self.config.global_object),
            rules: self.comment_rules()?,
            version: self.metadata.version.clone(),
            placeholder: self.config.version_placeholder.clone(),
        })
    }

    /// Returns a relative path from the project root
    pub fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root).ok().map(|p| p.to_path_buf())
    }

    /// Display form of a path, relative to the root when possible
    pub fn display_path(&self, path: &Path) -> String {
        self.relative_path(path)
            .unwrap_or_else(|| path.to_path_buf())
            .display()
            .to_string()
    }
}
