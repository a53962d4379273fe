//! Platform adapter bundles
//!
//! An adapter is a handful of files concatenated into one self-invoking
//! function, plus prebuilt assets copied through unchanged.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::artifact::write_minified;
use super::BuildContext;
use crate::storage::fsutil::{clean_dir, copy_file, read_file, write_file};
use crate::storage::AdapterConfig;

pub fn output_dir(ctx: &BuildContext, adapter: &AdapterConfig) -> PathBuf {
    ctx.project.build_dir().join(&adapter.name)
}

pub fn clean(ctx: &BuildContext, adapter: &AdapterConfig) -> Result<()> {
    clean_dir(&output_dir(ctx, adapter))
}

/// Writes `<lib>-<adapter>.js`, its minified sibling and the assets
pub fn build(ctx: &BuildContext, adapter: &AdapterConfig) -> Result<Vec<PathBuf>> {
    let root = ctx.project.root();
    let dir = output_dir(ctx, adapter);

    let sources = adapter
        .files
        .iter()
        .map(|file| read_file(&root.join(file)))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to read sources of adapter '{}'", adapter.name))?;

    let body = format!("(function(){{\n{}}})();\n", sources.join("\n"));
    let bundle = dir.join(format!("{}-{}.js", ctx.project.lib_name(), adapter.name));
    write_file(&bundle, ctx.project.header().stamp(Some(&adapter.label), &body))?;

    let mut written = vec![bundle.clone()];
    if !ctx.mode.is_watch() {
        written.push(write_minified(ctx, &bundle, &adapter.label)?);
    }

    for asset in &adapter.assets {
        let name = asset
            .file_name()
            .with_context(|| format!("Asset path has no file name: {}", asset.display()))?;
        let dest = dir.join(name);
        copy_file(&root.join(asset), &dest)?;
        written.push(dest);
    }

    ctx.output.verbose_ctx(
        &adapter.name,
        &format!("Wrote {} files", written.len()),
    );
    Ok(written)
}
