//! Module conventions
//!
//! Each convention wraps a loader-agnostic file body in the prologue and
//! epilogue its loader expects. The set of conventions is closed; each one
//! is a strategy value selected by [`TargetConvention::wrapper`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::module::{name_of, ModuleMetadata};

/// Target module convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetConvention {
    /// Self-contained script publishing into one global namespace
    Standalone,
    /// `define(id, deps, factory)`
    Amd,
    /// `require()` / `module.exports`
    #[value(name = "commonjs")]
    CommonJs,
    /// `KISSY.add(id, factory, {requires})`
    Kissy,
    /// `define(id, deps, function(require, exports, module))`
    Cmd,
}

impl TargetConvention {
    pub const ALL: [TargetConvention; 5] = [
        TargetConvention::Standalone,
        TargetConvention::Amd,
        TargetConvention::CommonJs,
        TargetConvention::Kissy,
        TargetConvention::Cmd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetConvention::Standalone => "standalone",
            TargetConvention::Amd => "amd",
            TargetConvention::CommonJs => "commonjs",
            TargetConvention::Kissy => "kissy",
            TargetConvention::Cmd => "cmd",
        }
    }

    /// Whether the per-file outputs are also joined into one artifact
    pub fn concatenates_output(&self) -> bool {
        !matches!(self, TargetConvention::CommonJs)
    }

    /// Strategy producing this convention's wrapper
    pub fn wrapper(&self) -> &'static dyn ModuleWrapper {
        match self {
            TargetConvention::Standalone => &Standalone,
            TargetConvention::Amd => &Amd,
            TargetConvention::CommonJs => &CommonJs,
            TargetConvention::Kissy => &Kissy,
            TargetConvention::Cmd => &Cmd,
        }
    }
}

impl fmt::Display for TargetConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetConvention::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown module convention: {}", s))
    }
}

/// Library-wide facts a wrapper needs besides the file's own declaration
#[derive(Debug, Clone)]
pub struct WrapContext {
    /// Name of the root module, which is also the namespace name
    pub root: String,

    /// Host object the standalone namespace hangs off, e.g. `window`
    pub global_object: String,
}

impl WrapContext {
    pub fn new(root: impl Into<String>, global_object: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            global_object: global_object.into(),
        }
    }

    /// Expression evaluating to the shared namespace, creating it on first use
    pub fn namespace_expr(&self) -> String {
        let ns = format!("{}.{}", self.global_object, self.root);
        format!("{} = {} || {{}}", ns, ns)
    }
}

/// Prologue and epilogue around a file body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub head: String,
    pub tail: String,
}

impl Wrapper {
    pub fn apply(&self, body: &str) -> String {
        format!("{}{}{}", self.head, body, self.tail)
    }
}

/// A convention's wrapping rule
pub trait ModuleWrapper: Sync {
    fn wrap(&self, ctx: &WrapContext, module: &ModuleMetadata) -> Wrapper;
}

/// Parameter name the standalone wrapper receives the namespace under
const NAMESPACE_PARAM: &str = "ns";

pub struct Standalone;

impl ModuleWrapper for Standalone {
    fn wrap(&self, ctx: &WrapContext, module: &ModuleMetadata) -> Wrapper {
        let mut head = format!("(function({}){{\n", NAMESPACE_PARAM);
        for name in module.require_classes() {
            if name == ctx.root {
                head.push_str(&format!("var {} = {};\n", name, NAMESPACE_PARAM));
            } else {
                head.push_str(&format!("var {} = {}.{};\n", name, NAMESPACE_PARAM, name));
            }
        }

        let name = &module.module_name;
        let publish = if *name == ctx.root {
            // Merge so members published by other files survive
            format!("\nfor(var i in {0}){{{1}[i] = {0}[i];}}", name, NAMESPACE_PARAM)
        } else {
            format!("\n{}.{} = {};", NAMESPACE_PARAM, name, name)
        };

        Wrapper {
            head,
            tail: format!("{}\n}})({});", publish, ctx.namespace_expr()),
        }
    }
}

fn quoted_list(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("'{}'", id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn name_list(module: &ModuleMetadata) -> String {
    module.require_classes().collect::<Vec<_>>().join(", ")
}

pub struct Amd;

impl ModuleWrapper for Amd {
    fn wrap(&self, _ctx: &WrapContext, module: &ModuleMetadata) -> Wrapper {
        Wrapper {
            head: format!(
                "define('{}', [{}], function({}){{\n",
                module.module_id,
                quoted_list(&module.requires),
                name_list(module)
            ),
            tail: format!("\nreturn {};\n}});", module.module_name),
        }
    }
}

pub struct CommonJs;

impl ModuleWrapper for CommonJs {
    fn wrap(&self, _ctx: &WrapContext, module: &ModuleMetadata) -> Wrapper {
        let mut head = String::new();
        for dep in &module.requires {
            head.push_str(&format!(
                "var {} = require('{}');\n",
                name_of(dep),
                relative_id(&module.module_id, dep)
            ));
        }

        Wrapper {
            head,
            tail: format!("\nmodule.exports = {};", module.module_name),
        }
    }
}

pub struct Kissy;

impl ModuleWrapper for Kissy {
    fn wrap(&self, _ctx: &WrapContext, module: &ModuleMetadata) -> Wrapper {
        let params = std::iter::once("S")
            .chain(module.require_classes())
            .collect::<Vec<_>>()
            .join(", ");

        Wrapper {
            head: format!("KISSY.add('{}', function({}){{\n", module.module_id, params),
            tail: format!(
                "\nreturn {};\n}}, {{\n    requires: [{}]\n}});",
                module.module_name,
                quoted_list(&module.requires)
            ),
        }
    }
}

pub struct Cmd;

impl ModuleWrapper for Cmd {
    fn wrap(&self, _ctx: &WrapContext, module: &ModuleMetadata) -> Wrapper {
        let mut head = format!(
            "define('{}', [{}], function(require, exports, module){{\n",
            module.module_id,
            quoted_list(&module.requires)
        );
        for dep in &module.requires {
            head.push_str(&format!("var {} = require('{}');\n", name_of(dep), dep));
        }

        Wrapper {
            head,
            tail: format!("\nmodule.exports = {};\n}});", module.module_name),
        }
    }
}

/// Path of module `to` relative to the directory of module `from`
///
/// `relative_id("hilo/view/Bitmap", "hilo/core/Class")` is `../core/Class`.
pub fn relative_id(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = {
        let mut parts: Vec<&str> = from.split('/').collect();
        parts.pop();
        parts
    };
    let to_parts: Vec<&str> = to.split('/').collect();

    let common = from_dir
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dir.len() - common;
    let mut segments: Vec<&str> = Vec::with_capacity(ups + to_parts.len() - common + 1);
    if ups == 0 {
        segments.push(".");
    } else {
        segments.extend(std::iter::repeat("..").take(ups));
    }
    segments.extend(&to_parts[common..]);
    segments.join("/")
}
