//! Per-language API documentation
//!
//! Sources carry paired comment blocks, one per language. For each language
//! the tree is filtered down to that language's blocks, staged under
//! `<docs>/api-<lang>/code/` and handed to the documentation generator.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use super::tools::DocRequest;
use super::BuildContext;
use crate::storage::fsutil::{clean_dir, read_file, write_file};

/// Deletes `<docs>/api-<lang>`
pub fn clean(ctx: &BuildContext, language: &str) -> Result<()> {
    clean_dir(&ctx.project.doc_dir(language))
}

/// Writes the filtered source tree for `language`; returns the staged files
pub fn stage(ctx: &BuildContext, language: &str) -> Result<Vec<PathBuf>> {
    let rules = ctx.project.comment_rules()?;
    let staging = ctx.project.doc_staging_dir(language);

    let mut written = Vec::new();
    for file in ctx.project.source_files()? {
        let content = read_file(&file.path)?;
        let filtered = rules
            .localize(&content, language)
            .ok_or_else(|| anyhow!("Language '{}' is not configured for docs", language))?;
        let dest = staging.join(&file.rel);
        write_file(&dest, filtered)?;
        written.push(dest);
    }

    ctx.output.verbose_ctx(
        &format!("doc-{}", language),
        &format!("Staged {} files", written.len()),
    );
    Ok(written)
}

/// Runs the documentation generator over the staged tree
pub fn generate(ctx: &BuildContext, language: &str) -> Result<()> {
    let project = &ctx.project;
    let request = DocRequest {
        staging_dir: project.doc_staging_dir(language),
        output_dir: project.doc_dir(language),
        template: project.root().join(&project.config().docs.template),
        version: project.metadata().version.clone(),
        language: language.to_string(),
    };

    ctx.tools
        .docs
        .generate(&request)
        .with_context(|| format!("Failed to generate '{}' documentation", language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::fixture;
    use crate::pipeline::BuildMode;
    use std::fs;

    #[test]
    fn en_keeps_only_english_without_markers() {
        let (dir, ctx, _) = fixture(BuildMode::Release);
        clean(&ctx, "en").unwrap();
        stage(&ctx, "en").unwrap();

        let staged = fs::read_to_string(dir.path().join("docs/api-en/code/core/Hilo.js")).unwrap();
        assert!(staged.contains("/**\n * The namespace.\n * @module hilo/core/Hilo\n */\nvar Hilo"));
        assert!(!staged.contains("命名空间"));
        assert!(!staged.contains("@language"));
    }

    #[test]
    fn zh_keeps_translation() {
        let (dir, ctx, _) = fixture(BuildMode::Release);
        stage(&ctx, "zh").unwrap();

        let staged = fs::read_to_string(dir.path().join("docs/api-zh/code/core/Hilo.js")).unwrap();
        assert!(staged.contains("命名空间。"));
        assert!(!staged.contains("The namespace."));
    }

    #[test]
    fn untagged_files_are_staged_unchanged() {
        let (dir, ctx, _) = fixture(BuildMode::Release);
        stage(&ctx, "en").unwrap();

        let staged = fs::read_to_string(dir.path().join("docs/api-en/code/core/Class.js")).unwrap();
        assert_eq!(staged, crate::pipeline::testing::CLASS);
    }

    #[test]
    fn clean_removes_previous_output() {
        let (dir, ctx, _) = fixture(BuildMode::Release);
        let stale = dir.path().join("docs/api-en/index.html");
        write_file(&stale, "old").unwrap();

        clean(&ctx, "en").unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn generate_passes_version_and_language() {
        let (_dir, ctx, recorder) = fixture(BuildMode::Release);
        generate(&ctx, "zh").unwrap();
        assert_eq!(recorder.calls(), vec!["doc zh 1.1.0"]);
    }

    #[test]
    fn unknown_language_fails() {
        let (_dir, ctx, _) = fixture(BuildMode::Release);
        assert!(stage(&ctx, "fr").is_err());
    }
}
