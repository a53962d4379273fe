//! # Build Pipelines
//!
//! The actions behind every task. Each pipeline writes only its own output
//! subtree, so chains of different conventions never touch the same files.
//!
//! | Module | Tasks |
//! |--------|-------|
//! | [`artifact`] | `<conv>-clean`, `<conv>-format`, `<conv>-minify`, `<conv>-archive` |
//! | [`adapter`] | `<adapter>-clean`, `<adapter>` |
//! | [`extension`] | `extensions` |
//! | [`docs`] | `doc-clean-<lang>`, `doc-comment-<lang>`, `doc-<lang>` |
//! | [`publish`] | `publish-clean`, `publish-stage`, `publish` |
//! | [`quality`] | `lint`, `test` |

pub mod adapter;
pub mod artifact;
pub mod docs;
pub mod extension;
pub mod publish;
pub mod quality;
pub mod tools;

use crate::cli::Output;
use crate::storage::Project;

pub use tools::{
    Archiver, DocGenerator, DocRequest, ExternalCommand, Linter, Minifier, Publisher, TestRunner,
    ToolError, Toolchain,
};

/// How much work an invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Full build: minified siblings and archives included
    #[default]
    Release,

    /// Fast build for watching, linting and testing: no minify, no archive
    Watch,
}

impl BuildMode {
    pub fn is_watch(&self) -> bool {
        *self == BuildMode::Watch
    }
}

/// Everything a task action needs; shared read-only across watch workers
pub struct BuildContext {
    pub project: Project,
    pub mode: BuildMode,
    pub tools: Toolchain,
    pub output: Output,

    /// Show the UI test runner window
    pub visible: bool,
}

impl BuildContext {
    pub fn new(project: Project, mode: BuildMode, tools: Toolchain, output: Output) -> Self {
        Self {
            project,
            mode,
            tools,
            output,
            visible: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake tools and project fixtures shared by pipeline tests

    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;
    use crate::cli::OutputFormat;
    use crate::storage::fsutil::write_file;
    use crate::storage::{BuildConfig, ProjectMetadata};

    /// Uppercases its input so minified output is recognizable
    pub struct UpperMinifier;

    impl Minifier for UpperMinifier {
        fn minify(&self, source: &str) -> Result<String, ToolError> {
            Ok(source.trim().to_uppercase())
        }
    }

    /// Records what it was asked to do
    #[derive(Default)]
    pub struct Recorder {
        pub calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    pub struct RecordingArchiver(pub std::sync::Arc<Recorder>);

    impl Archiver for RecordingArchiver {
        fn archive(&self, base: &Path, files: &[PathBuf], dest: &Path) -> Result<(), ToolError> {
            let names: Vec<_> = files.iter().map(|f| f.display().to_string()).collect();
            self.0.push(format!("archive {} [{}]", dest.display(), names.join(",")));
            std::fs::write(dest, b"zip").map_err(|source| ToolError::Io {
                tool: format!("archive in {}", base.display()),
                source,
            })
        }
    }

    pub struct RecordingDocs(pub std::sync::Arc<Recorder>);

    impl DocGenerator for RecordingDocs {
        fn generate(&self, request: &DocRequest) -> Result<(), ToolError> {
            self.0.push(format!("doc {} {}", request.language, request.version));
            Ok(())
        }
    }

    pub struct RecordingLinter(pub std::sync::Arc<Recorder>);

    impl Linter for RecordingLinter {
        fn lint(&self, files: &[PathBuf]) -> Result<(), ToolError> {
            self.0.push(format!("lint {}", files.len()));
            Ok(())
        }
    }

    pub struct RecordingTests(pub std::sync::Arc<Recorder>);

    impl TestRunner for RecordingTests {
        fn run(&self, page: &Path, visible: bool) -> Result<(), ToolError> {
            self.0.push(format!("test {} {}", page.display(), visible));
            Ok(())
        }
    }

    pub struct RecordingPublisher(pub std::sync::Arc<Recorder>);

    impl Publisher for RecordingPublisher {
        fn publish(&self, dir: &Path) -> Result<String, ToolError> {
            self.0.push(format!("publish {}", dir.display()));
            Ok("+ hilojs@1.1.0".to_string())
        }
    }

    pub fn fake_tools(recorder: &std::sync::Arc<Recorder>) -> Toolchain {
        Toolchain {
            minifier: Box::new(UpperMinifier),
            archiver: Box::new(RecordingArchiver(recorder.clone())),
            docs: Box::new(RecordingDocs(recorder.clone())),
            linter: Box::new(RecordingLinter(recorder.clone())),
            test_runner: Box::new(RecordingTests(recorder.clone())),
            publisher: Box::new(RecordingPublisher(recorder.clone())),
        }
    }

    pub const HILO: &str = "/**\n * Hilo\n * Copyright 2015 alibaba.com\n * Licensed under the MIT License\n */\n\n/**\n * @language=en\n * The namespace.\n * @module hilo/core/Hilo\n */\n/**\n * @language=zh\n * 命名空间。\n * @module hilo/core/Hilo\n */\nvar Hilo = {version:'{{$version}}'};\n";

    pub const CLASS: &str = "/**\n * @module hilo/core/Class\n * @requires hilo/core/Hilo\n */\nvar Class = {version:'{{$version}}'};\n";

    /// A two-file project: `core/Hilo.js` (entry) and `core/Class.js`
    pub fn fixture(mode: BuildMode) -> (TempDir, BuildContext, std::sync::Arc<Recorder>) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_file(&root.join("src/core/Hilo.js"), HILO).unwrap();
        write_file(&root.join("src/core/Class.js"), CLASS).unwrap();

        let descriptor = serde_json::json!({
            "name": "Hilo",
            "version": "1.1.0",
            "sources": { "dir": "src", "files": ["core/Hilo.js", "core/Class.js"] },
        });
        write_file(&root.join("package.json"), descriptor.to_string()).unwrap();

        let metadata = ProjectMetadata::load(root).unwrap();
        let project = Project::from_parts(root, metadata, BuildConfig::default());
        let recorder = std::sync::Arc::new(Recorder::default());
        let ctx = BuildContext::new(
            project,
            mode,
            fake_tools(&recorder),
            Output::new(OutputFormat::Text, false),
        );
        (dir, ctx, recorder)
    }
}
