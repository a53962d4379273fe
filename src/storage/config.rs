//! Configuration handling for polyform
//!
//! Build configuration is stored in `build.toml` at the project root.
//! Machine-specific tool commands may be overridden in
//! `~/.config/polyform/config.toml` (global).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TargetConvention;

/// File name of the project build configuration
pub const CONFIG_FILE: &str = "build.toml";

/// Task ids declared independently of the adapter list
const FIXED_TASKS: [&str; 10] = [
    "format",
    "extensions",
    "doc",
    "lint",
    "test",
    "publish",
    "publish-clean",
    "publish-stage",
    "watch",
    "default",
];

/// Whether `id` is, or may become, the id of a non-adapter task
fn reserved_task_id(id: &str) -> bool {
    if FIXED_TASKS.contains(&id) || id.starts_with("doc-") {
        return true;
    }
    let base = ["-clean", "-format", "-minify", "-archive"]
        .iter()
        .find_map(|suffix| id.strip_suffix(suffix))
        .unwrap_or(id);
    base.parse::<TargetConvention>().is_ok()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Identity lines written into every artifact header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Copyright line
    pub copyright: String,

    /// Copyright holder, used to recognize the license comment in sources
    pub holder: String,

    /// License name
    pub license: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            copyright: "Copyright 2016 alibaba.com".to_string(),
            holder: "alibaba.com".to_string(),
            license: "MIT".to_string(),
        }
    }
}

/// A platform adapter bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdapterConfig {
    /// Task id and output directory name
    pub name: String,

    /// Header variant label
    pub label: String,

    /// Sources in concatenation order, relative to the project root
    pub files: Vec<PathBuf>,

    /// Prebuilt files copied through unchanged
    #[serde(default)]
    pub assets: Vec<PathBuf>,
}

/// Documentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Languages in the order their blocks appear in sources
    pub languages: Vec<String>,

    /// Template directory handed to the generator
    pub template: PathBuf,

    /// JsDoc Toolkit installation directory
    pub toolkit: PathBuf,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "zh".to_string()],
            template: PathBuf::from("docs/api_template/"),
            toolkit: PathBuf::from("tools/jsdoc-toolkit-2.4.0"),
        }
    }
}

/// Registry package staging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Staging directory name under the build dir
    pub dir: String,

    /// Package name on the registry
    pub registry_name: String,

    /// Static files copied to the staging root; `package.json` is required
    pub files: Vec<PathBuf>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            dir: "npm".to_string(),
            registry_name: "hilojs".to_string(),
            files: vec![
                PathBuf::from("package.json"),
                PathBuf::from(".npmignore"),
                PathBuf::from("LICENSE"),
                PathBuf::from("README.md"),
                PathBuf::from("d.ts/hilo.d.ts"),
            ],
        }
    }
}

/// UI test settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Test page handed to the runner
    pub page: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            page: PathBuf::from("test/html/index.html"),
        }
    }
}

/// Paths that re-run a fixed set of targets when they change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchGroup {
    /// Globs relative to the project root
    pub patterns: Vec<String>,

    /// Targets re-run on change
    pub targets: Vec<String>,
}

/// External tool commands (program followed by fixed arguments)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    pub minifier: Vec<String>,
    pub archiver: Vec<String>,
    pub java: String,
    pub linter: Vec<String>,
    pub test_runner: Vec<String>,
    pub publisher: Vec<String>,

    /// Debounce delay in milliseconds for watch mode
    pub debounce_ms: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            minifier: vec!["uglifyjs".into(), "--compress".into(), "--mangle".into()],
            archiver: vec!["zip".into(), "-q".into()],
            java: "java".to_string(),
            linter: vec!["jshint".into()],
            test_runner: vec!["uitest".into()],
            publisher: vec!["npm".into(), "publish".into()],
            debounce_ms: 300,
        }
    }
}

/// Global tool overrides; unset fields keep the project's values
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolOverrides {
    pub minifier: Option<Vec<String>>,
    pub archiver: Option<Vec<String>>,
    pub java: Option<String>,
    pub linter: Option<Vec<String>>,
    pub test_runner: Option<Vec<String>>,
    pub publisher: Option<Vec<String>>,
    pub debounce_ms: Option<u64>,
}

impl ToolOverrides {
    fn apply(self, tools: &mut ToolsConfig) {
        if let Some(v) = self.minifier {
            tools.minifier = v;
        }
        if let Some(v) = self.archiver {
            tools.archiver = v;
        }
        if let Some(v) = self.java {
            tools.java = v;
        }
        if let Some(v) = self.linter {
            tools.linter = v;
        }
        if let Some(v) = self.test_runner {
            tools.test_runner = v;
        }
        if let Some(v) = self.publisher {
            tools.publisher = v;
        }
        if let Some(v) = self.debounce_ms {
            tools.debounce_ms = v;
        }
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    pub tools: ToolOverrides,
}

/// Project build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output root, relative to the project root
    pub build_dir: PathBuf,

    /// Documentation root, relative to the project root
    pub docs_dir: PathBuf,

    /// Conventions to build, in task declaration order
    pub conventions: Vec<TargetConvention>,

    /// Token replaced by the version in the entry file
    pub version_placeholder: String,

    /// Host object of the standalone namespace
    pub global_object: String,

    pub header: HeaderConfig,
    pub adapters: Vec<AdapterConfig>,
    pub docs: DocsConfig,
    pub publish: PublishConfig,
    pub test: TestConfig,
    pub watch: Vec<WatchGroup>,
    pub tools: ToolsConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            docs_dir: PathBuf::from("docs"),
            conventions: TargetConvention::ALL.to_vec(),
            version_placeholder: "{{$version}}".to_string(),
            global_object: "window".to_string(),
            header: HeaderConfig::default(),
            adapters: vec![AdapterConfig {
                name: "flash".to_string(),
                label: "flashAdaptor".to_string(),
                files: vec![
                    PathBuf::from("src/flash/FlashRenderer.js"),
                    PathBuf::from("src/flash/FlashAdaptor.js"),
                ],
                assets: vec![PathBuf::from("src/flash/as/bin/hilo.swf")],
            }],
            docs: DocsConfig::default(),
            publish: PublishConfig::default(),
            test: TestConfig::default(),
            watch: vec![
                WatchGroup {
                    patterns: vec!["src/**/*.js".to_string()],
                    targets: vec!["standalone".to_string(), "flash".to_string()],
                },
                WatchGroup {
                    patterns: vec!["src/extensions/**/*.js".to_string()],
                    targets: vec!["extensions".to_string()],
                },
            ],
            tools: ToolsConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Loads the project configuration and applies global tool overrides
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut config = Self::load_project_config(project_root)?;
        let global = Self::load_global()?;
        global.tools.apply(&mut config.tools);
        config.validate()?;
        Ok(config)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "polyform", "polyform").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read build config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse build config")
    }

    /// Rejects configurations whose task ids would collide
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.docs.languages.is_empty() {
            return Err(ConfigError::Invalid("docs.languages must not be empty".into()));
        }
        let mut adapter_ids = HashSet::new();
        for adapter in &self.adapters {
            let clean = format!("{}-clean", adapter.name);
            for id in [adapter.name.as_str(), clean.as_str()] {
                if reserved_task_id(id) || !adapter_ids.insert(id.to_string()) {
                    return Err(ConfigError::Invalid(format!(
                        "adapter '{}' collides with task '{}'",
                        adapter.name, id
                    )));
                }
            }
        }
        for (name, tool) in [
            ("minifier", &self.tools.minifier),
            ("archiver", &self.tools.archiver),
            ("linter", &self.tools.linter),
            ("test_runner", &self.tools.test_runner),
            ("publisher", &self.tools.publisher),
        ] {
            if tool.is_empty() {
                return Err(ConfigError::Invalid(format!("tools.{} must name a program", name)));
            }
        }
        Ok(())
    }

    pub fn has_convention(&self, convention: TargetConvention) -> bool {
        self.conventions.contains(&convention)
    }
}
