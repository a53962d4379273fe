//! Per-convention artifact pipeline
//!
//! Stages run strictly in order for one convention:
//! clean, format (transform + concat + header), minify, archive.
//! Minify and archive are skipped in watch mode.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::BuildContext;
use crate::domain::{ModuleMetadata, ModuleSet, TargetConvention};
use crate::storage::fsutil::{clean_dir, find_files, is_minified, minified_path, read_file, write_file};
use crate::storage::SourceFile;

/// Deletes the convention's output directory
pub fn clean(ctx: &BuildContext, convention: TargetConvention) -> Result<()> {
    let dir = ctx.project.convention_dir(convention);
    ctx.output
        .verbose_ctx(convention.as_str(), &format!("Deleting {}", ctx.project.display_path(&dir)));
    clean_dir(&dir)
}

/// Transforms every source file and writes per-file outputs plus the
/// combined artifact; returns the paths written
pub fn format(ctx: &BuildContext, convention: TargetConvention) -> Result<Vec<PathBuf>> {
    let project = &ctx.project;
    let transformer = project.transformer()?;
    let files = project.source_files()?;
    let entry = project.entry_file(&files).map(|f| f.path.as_path());

    let mut modules = ModuleSet::new();
    let mut prepared: Vec<(&SourceFile, String, ModuleMetadata)> = Vec::with_capacity(files.len());
    for file in &files {
        let content = read_file(&file.path)?;
        let (body, metadata) = transformer
            .prepare(&file.rel, &content, entry == Some(file.path.as_path()))
            .with_context(|| format!("Failed to prepare {} for {}", file.rel.display(), convention))?;
        modules.insert(&file.rel, metadata.clone())?;
        prepared.push((file, body, metadata));
    }

    for (file, _, metadata) in &prepared {
        modules
            .resolve(&file.rel, metadata)
            .with_context(|| format!("Failed to resolve dependencies for {}", convention))?;
    }

    let header = project.header();
    let label = Some(convention.as_str());
    let module_dir = project.module_dir(convention);
    let mut written = Vec::with_capacity(prepared.len() + 1);
    let mut bodies = Vec::with_capacity(prepared.len());

    for (file, body, metadata) in &prepared {
        let out = transformer.transform(convention, body, metadata);
        let dest = module_dir.join(&file.rel);
        write_file(&dest, header.stamp(label, &out))?;
        written.push(dest);
        bodies.push(out);
    }

    if convention.concatenates_output() {
        let bundle = project.bundle_path(convention);
        write_file(&bundle, header.stamp(label, &bodies.join("\n")))?;
        written.push(bundle);
    }

    ctx.output.verbose_ctx(
        convention.as_str(),
        &format!("Transformed {} modules", prepared.len()),
    );
    Ok(written)
}

/// Writes a `.min.js` sibling for every non-minified output
pub fn minify(ctx: &BuildContext, convention: TargetConvention) -> Result<Vec<PathBuf>> {
    if ctx.mode.is_watch() {
        ctx.output.verbose_ctx(convention.as_str(), "Watch mode, skipping minify");
        return Ok(Vec::new());
    }

    let dir = ctx.project.convention_dir(convention);
    let mut written = Vec::new();
    for path in find_files(&dir, "**/*.js")? {
        if is_minified(&path) {
            continue;
        }
        written.push(write_minified(ctx, &path, convention.as_str())?);
    }
    Ok(written)
}

/// Archives every `.js` file under the convention directory
pub fn archive(ctx: &BuildContext, convention: TargetConvention) -> Result<Option<PathBuf>> {
    if ctx.mode.is_watch() {
        ctx.output.verbose_ctx(convention.as_str(), "Watch mode, skipping archive");
        return Ok(None);
    }

    let dir = ctx.project.convention_dir(convention);
    let dest = ctx.project.archive_path(convention);
    if dest.exists() {
        std::fs::remove_file(&dest)
            .with_context(|| format!("Failed to delete {}", dest.display()))?;
    }

    let files: Vec<PathBuf> = find_files(&dir, "**/*.js")?
        .into_iter()
        .map(|f| f.strip_prefix(&dir).map(Path::to_path_buf).unwrap_or(f))
        .collect();

    ctx.tools
        .archiver
        .archive(&dir, &files, &dest)
        .with_context(|| format!("Failed to archive {}", ctx.project.display_path(&dir)))?;
    Ok(Some(dest))
}

/// Minifies one header-stamped file into its `.min.js` sibling
///
/// The header is removed before minifying and re-prepended after.
pub(crate) fn write_minified(ctx: &BuildContext, path: &Path, variant: &str) -> Result<PathBuf> {
    let header = ctx.project.header().render(Some(variant));
    let content = read_file(path)?;
    let body = content.strip_prefix(header.as_str()).unwrap_or(&content);

    let minified = ctx
        .tools
        .minifier
        .minify(body)
        .with_context(|| format!("Failed to minify {}", ctx.project.display_path(path)))?;

    let dest = minified_path(path);
    write_file(&dest, format!("{}{}", header, minified))?;
    Ok(dest)
}
