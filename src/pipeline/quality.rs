//! Lint and UI test tasks

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use super::BuildContext;
use crate::domain::TargetConvention;
use crate::storage::fsutil::{find_files, is_minified};

/// Lints every non-minified standalone per-file output
pub fn lint(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    let dir = ctx.project.module_dir(TargetConvention::Standalone);
    let files: Vec<PathBuf> = find_files(&dir, "**/*.js")?
        .into_iter()
        .filter(|f| !is_minified(f))
        .collect();

    if files.is_empty() {
        bail!("Nothing to lint in {}", ctx.project.display_path(&dir));
    }

    ctx.tools.linter.lint(&files).context("Lint failed")?;
    Ok(files)
}

/// Runs the UI test page
pub fn test(ctx: &BuildContext) -> Result<()> {
    let page = ctx.project.root().join(&ctx.project.config().test.page);
    ctx.tools
        .test_runner
        .run(&page, ctx.visible)
        .with_context(|| format!("Tests failed: {}", ctx.project.display_path(&page)))
}
