//! Source rewriting shared by the artifact and documentation pipelines
//!
//! Before a file is wrapped for a convention it is preprocessed: the
//! version placeholder is stamped into the entry file, the license comment
//! is stripped, and each bilingual API comment pair is collapsed to the
//! reference language's block.

use std::borrow::Cow;
use std::path::Path;

use regex::Regex;

use super::convention::{TargetConvention, WrapContext};
use super::module::{ModuleMetadata, TransformError};

/// Compiled comment patterns for one project
#[derive(Debug, Clone)]
pub struct CommentRules {
    license: Regex,
    bilingual: Regex,
    marker: Regex,
    languages: Vec<String>,
}

impl CommentRules {
    /// Builds the patterns
    ///
    /// `holder` and `license` identify the license comment to strip;
    /// `languages` is the fixed order bilingual blocks appear in.
    pub fn new(holder: &str, license: &str, languages: &[String]) -> Result<Self, regex::Error> {
        let license = Regex::new(&format!(
            r"(?s)/\*\*.+?{}.+?Licensed under the {} License\s+?\*/",
            regex::escape(holder),
            regex::escape(license)
        ))?;

        let blocks: Vec<String> = languages
            .iter()
            .map(|lang| format!(r"(/\*\*\s+?\*\s+?@language={}.+?\*/)", regex::escape(lang)))
            .collect();
        let bilingual = Regex::new(&format!(r"(?s){}", blocks.join(r"\s+")))?;

        let marker = Regex::new(r"\*\s*@language=[a-z]+\s*")?;

        Ok(Self {
            license,
            bilingual,
            marker,
            languages: languages.to_vec(),
        })
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Removes the license comment block
    pub fn strip_license<'a>(&self, content: &'a str) -> Cow<'a, str> {
        self.license.replace_all(content, "")
    }

    /// Keeps only the block at `position` of every bilingual block group
    pub fn collapse<'a>(&self, content: &'a str, position: usize) -> Cow<'a, str> {
        let replacement = format!("${{{}}}", position + 1);
        self.bilingual.replace_all(content, replacement.as_str())
    }

    /// Keeps only `language`'s block and drops the `@language` markers
    ///
    /// Returns `None` for a language outside the configured set.
    pub fn localize(&self, content: &str, language: &str) -> Option<String> {
        let position = self.languages.iter().position(|l| l == language)?;
        let collapsed = self.collapse(content, position);
        Some(self.marker.replace_all(&collapsed, "").into_owned())
    }
}

/// Identity stamped at the top of every artifact
#[derive(Debug, Clone)]
pub struct Header {
    pub name: String,
    pub version: String,
    pub copyright: String,
    pub license: String,
}

impl Header {
    /// Renders the header block, optionally labelled with a variant
    pub fn render(&self, variant: Option<&str>) -> String {
        let variant = variant.map(|v| format!(" for {}", v)).unwrap_or_default();
        let mut info = String::from("/**\n");
        info.push_str(&format!(" * {} {}{}\n", self.name, self.version, variant));
        if !self.copyright.is_empty() {
            info.push_str(&format!(" * {}\n", self.copyright));
        }
        info.push_str(&format!(" * Licensed under the {} License\n", self.license));
        info.push_str(" */\n");
        info
    }

    /// Prepends the header to `body`
    pub fn stamp(&self, variant: Option<&str>, body: &str) -> String {
        format!("{}{}", self.render(variant), body)
    }
}

/// Rewrites source files into convention wrappers
#[derive(Debug, Clone)]
pub struct Transformer {
    pub wrap: WrapContext,
    pub rules: CommentRules,
    pub version: String,
    pub placeholder: String,
}

impl Transformer {
    /// Applies version stamping and comment filtering to one file
    pub fn preprocess(&self, content: &str, is_entry: bool) -> String {
        let stamped = if is_entry && !self.placeholder.is_empty() {
            Cow::Owned(content.replace(&self.placeholder, &self.version))
        } else {
            Cow::Borrowed(content)
        };
        let stripped = self.rules.strip_license(&stamped);
        self.rules.collapse(&stripped, 0).into_owned()
    }

    /// Preprocesses a file and parses its module declaration
    pub fn prepare(
        &self,
        path: &Path,
        content: &str,
        is_entry: bool,
    ) -> Result<(String, ModuleMetadata), TransformError> {
        let body = self.preprocess(content, is_entry);
        let metadata = ModuleMetadata::parse(path, &body)?;
        Ok((body, metadata))
    }

    /// Wraps a preprocessed body for `convention`
    pub fn transform(
        &self,
        convention: TargetConvention,
        content: &str,
        metadata: &ModuleMetadata,
    ) -> String {
        convention.wrapper().wrap(&self.wrap, metadata).apply(content)
    }
}
