//! Output formatting for CLI commands

use chrono::Local;
use serde::Serialize;

use crate::domain::{RunReport, TaskEvent, TaskOutcome};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output helper for consistent formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints an error message
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("Error: {}", message),
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "success": false,
                        "error": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints a table row (text only, ignored in JSON mode)
    pub fn row(&self, columns: &[&str]) {
        if self.format == OutputFormat::Text {
            println!("{}", columns.join("\t"));
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }

    /// Prints a timestamped line, e.g. `[14:02:11] Using build.toml`
    pub fn log(&self, message: &str) {
        if self.format == OutputFormat::Text {
            println!("[{}] {}", timestamp(), message);
        }
    }

    /// Reports scheduler progress
    pub fn task_event(&self, event: &TaskEvent<'_>) {
        match self.format {
            OutputFormat::Text => match event {
                TaskEvent::Started(id) => self.log(&format!("Starting '{}'...", id)),
                TaskEvent::Finished(id, outcome) => match outcome {
                    TaskOutcome::Completed { duration } => self.log(&format!(
                        "Finished '{}' after {}",
                        id,
                        format_duration(*duration)
                    )),
                    TaskOutcome::Failed { error } => {
                        eprintln!("[{}] '{}' errored: {}", timestamp(), id, error)
                    }
                    TaskOutcome::Blocked { by } => {
                        self.log(&format!("Skipping '{}' (blocked by '{}')", id, by))
                    }
                },
            },
            OutputFormat::Json => {
                let line = match event {
                    TaskEvent::Started(id) => serde_json::json!({
                        "event": "started",
                        "task": id,
                        "time": Local::now().to_rfc3339(),
                    }),
                    TaskEvent::Finished(id, outcome) => serde_json::json!({
                        "event": "finished",
                        "task": id,
                        "time": Local::now().to_rfc3339(),
                        "outcome": outcome,
                    }),
                };
                println!("{}", line);
            }
        }
    }

    /// Summarizes a finished run
    pub fn report(&self, report: &RunReport) {
        if self.is_json() {
            println!(
                "{}",
                serde_json::json!({
                    "event": "report",
                    "success": report.success(),
                    "tasks": report.tasks.iter().map(|(id, outcome)| {
                        serde_json::json!({ "task": id, "outcome": outcome })
                    }).collect::<Vec<_>>(),
                })
            );
            return;
        }

        for (id, error) in report.failures() {
            self.error(&format!("'{}' failed: {}", id, error));
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn format_duration(duration: std::time::Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{} ms", ms)
    } else {
        format!("{:.2} s", duration.as_secs_f64())
    }
}
