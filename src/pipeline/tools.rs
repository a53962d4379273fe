//! External collaborators
//!
//! The minifier, archiver, documentation generator, lint engine, UI test
//! runner and registry client are opaque programs. Each is reached through a
//! small trait so pipelines can be exercised without them; the default
//! implementations run the commands configured in `[tools]`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::storage::{Project, ToolsConfig};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error talking to {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Shrinks JavaScript source without changing its behavior
pub trait Minifier: Send + Sync {
    fn minify(&self, source: &str) -> Result<String, ToolError>;
}

/// Bundles files into one compressed archive
pub trait Archiver: Send + Sync {
    /// `files` are relative to `base`; `dest` is the archive path
    fn archive(&self, base: &Path, files: &[PathBuf], dest: &Path) -> Result<(), ToolError>;
}

/// Parameters of one documentation generator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRequest {
    pub staging_dir: PathBuf,
    pub output_dir: PathBuf,
    pub template: PathBuf,
    pub version: String,
    pub language: String,
}

/// Renders API documentation from a staged source tree
pub trait DocGenerator: Send + Sync {
    fn generate(&self, request: &DocRequest) -> Result<(), ToolError>;
}

/// Checks source files; an error means lint failures
pub trait Linter: Send + Sync {
    fn lint(&self, files: &[PathBuf]) -> Result<(), ToolError>;
}

/// Runs the browser test page
pub trait TestRunner: Send + Sync {
    fn run(&self, page: &Path, visible: bool) -> Result<(), ToolError>;
}

/// Publishes a staged package directory; returns the client's report
pub trait Publisher: Send + Sync {
    fn publish(&self, dir: &Path) -> Result<String, ToolError>;
}

/// A program plus fixed leading arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl ExternalCommand {
    /// Builds a command from `[program, args...]`
    pub fn from_argv(argv: &[String], cwd: impl Into<PathBuf>) -> Self {
        let (program, args) = match argv.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (String::new(), Vec::new()),
        };
        Self {
            program,
            args,
            cwd: cwd.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command<I, S>(&self, extra: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(extra).current_dir(&self.cwd);
        cmd
    }

    /// Runs to completion, returning stdout; non-zero exit is an error
    pub fn run<I, S>(&self, extra: I, input: Option<&str>) -> Result<String, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let spawn_err = |source: std::io::Error| ToolError::Spawn {
            tool: self.program.clone(),
            source,
        };
        let io_err = |source: std::io::Error| ToolError::Io {
            tool: self.program.clone(),
            source,
        };

        let mut child = self
            .command(extra)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        let output = match (input, child.stdin.take()) {
            (Some(input), Some(mut stdin)) => {
                // Feed stdin from a separate thread so a full stdout pipe cannot deadlock us
                let input = input.to_string();
                let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));
                let output = child.wait_with_output().map_err(io_err)?;
                if let Ok(Err(e)) = writer.join() {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(io_err(e));
                    }
                }
                output
            }
            _ => child.wait_with_output().map_err(io_err)?,
        };

        if !output.status.success() {
            // Lint engines report on stdout
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(ToolError::Failed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

/// Minifies through a filter program (source on stdin, result on stdout)
pub struct CommandMinifier(pub ExternalCommand);

impl Minifier for CommandMinifier {
    fn minify(&self, source: &str) -> Result<String, ToolError> {
        self.0.run(std::iter::empty::<&str>(), Some(source))
    }
}

/// Archives with a `zip`-style program: `<cmd> <dest> <files...>` run in `base`
pub struct CommandArchiver(pub ExternalCommand);

impl Archiver for CommandArchiver {
    fn archive(&self, base: &Path, files: &[PathBuf], dest: &Path) -> Result<(), ToolError> {
        let mut cmd = self.0.clone();
        cmd.cwd = base.to_path_buf();
        let args = std::iter::once(dest.as_os_str()).chain(files.iter().map(|f| f.as_os_str()));
        cmd.run(args, None).map(|_| ())
    }
}

/// JsDoc Toolkit run through `java -jar`
pub struct JsdocToolkit {
    pub java: ExternalCommand,
    pub toolkit: PathBuf,
}

impl JsdocToolkit {
    /// Arguments after the java program
    pub fn arguments(&self, request: &DocRequest) -> Vec<String> {
        vec![
            "-jar".to_string(),
            self.toolkit.join("jsrun.jar").display().to_string(),
            self.toolkit.join("app/run.js").display().to_string(),
            request.staging_dir.display().to_string(),
            format!("-d={}", request.output_dir.display()),
            format!("-t={}", request.template.display()),
            "-r=5".to_string(),
            "-x=js".to_string(),
            "-E=FilesLoad.js".to_string(),
            format!("-D=ver:{}", request.version),
            format!("-lang={}", request.language),
        ]
    }
}

impl DocGenerator for JsdocToolkit {
    fn generate(&self, request: &DocRequest) -> Result<(), ToolError> {
        self.java.run(self.arguments(request), None).map(|_| ())
    }
}

pub struct CommandLinter(pub ExternalCommand);

impl Linter for CommandLinter {
    fn lint(&self, files: &[PathBuf]) -> Result<(), ToolError> {
        self.0.run(files, None).map(|_| ())
    }
}

/// Runs `<cmd> <page>`, adding `--show` for a visible runner window
pub struct CommandTestRunner(pub ExternalCommand);

impl TestRunner for CommandTestRunner {
    fn run(&self, page: &Path, visible: bool) -> Result<(), ToolError> {
        let mut args = vec![page.as_os_str().to_os_string()];
        if visible {
            args.push("--show".into());
        }
        self.0.run(args, None).map(|_| ())
    }
}

pub struct CommandPublisher(pub ExternalCommand);

impl Publisher for CommandPublisher {
    fn publish(&self, dir: &Path) -> Result<String, ToolError> {
        self.0.run([dir], None)
    }
}

/// The set of external collaborators a build uses
pub struct Toolchain {
    pub minifier: Box<dyn Minifier>,
    pub archiver: Box<dyn Archiver>,
    pub docs: Box<dyn DocGenerator>,
    pub linter: Box<dyn Linter>,
    pub test_runner: Box<dyn TestRunner>,
    pub publisher: Box<dyn Publisher>,
}

impl Toolchain {
    /// Process-backed tools configured for `project`
    pub fn for_project(project: &Project) -> Self {
        let root = project.root();
        let tools: &ToolsConfig = &project.config().tools;
        let cmd = |argv: &[String]| ExternalCommand::from_argv(argv, root);

        Self {
            minifier: Box::new(CommandMinifier(cmd(&tools.minifier))),
            archiver: Box::new(CommandArchiver(cmd(&tools.archiver))),
            docs: Box::new(JsdocToolkit {
                java: cmd(std::slice::from_ref(&tools.java)),
                toolkit: project.config().docs.toolkit.clone(),
            }),
            linter: Box::new(CommandLinter(cmd(&tools.linter))),
            test_runner: Box::new(CommandTestRunner(cmd(&tools.test_runner))),
            publisher: Box::new(CommandPublisher(cmd(&tools.publisher))),
        }
    }
}
