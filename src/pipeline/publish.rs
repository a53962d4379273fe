//! Registry package staging and publishing

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use regex::Regex;

use super::BuildContext;
use crate::domain::TargetConvention;
use crate::storage::DESCRIPTOR_FILE;
use crate::storage::fsutil::{clean_dir, copy_file, copy_tree, read_file, write_file};

/// Appended to the standalone artifact so it also loads as a CommonJS module
pub fn module_footer(global_object: &str, name: &str) -> String {
    format!(
        "\nif(typeof module !== 'undefined' && module.exports){{\n    module.exports = {}.{};\n}}\n",
        global_object, name
    )
}

pub fn clean(ctx: &BuildContext) -> Result<()> {
    clean_dir(&ctx.project.publish_dir())
}

/// Assembles the package directory; returns the files written
pub fn stage(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    let project = &ctx.project;
    let config = project.config();
    let staging = project.publish_dir();
    let mut written = Vec::new();

    let bundle = project.bundle_path(TargetConvention::Standalone);
    let content = read_file(&bundle).context("Standalone artifact is missing")?;
    let footer = module_footer(&config.global_object, &project.metadata().name);
    let dest = staging.join(bundle.file_name().unwrap_or_default());
    write_file(&dest, format!("{}{}", content, footer))?;
    written.push(dest);

    let mut descriptor = None;
    for file in &config.publish.files {
        let source = project.root().join(file);
        let Some(name) = file.file_name() else {
            bail!("Publish file has no name: {}", file.display());
        };
        let is_descriptor = name == DESCRIPTOR_FILE;
        if !source.exists() {
            if is_descriptor {
                bail!("Package descriptor not found: {}", project.display_path(&source));
            }
            ctx.output
                .verbose_ctx("publish", &format!("Skipping missing {}", file.display()));
            continue;
        }
        let dest = staging.join(name);
        copy_file(&source, &dest)?;
        if is_descriptor {
            descriptor = Some(dest.clone());
        }
        written.push(dest);
    }

    let commonjs = project.convention_dir(TargetConvention::CommonJs);
    if !commonjs.exists() {
        bail!("CommonJS output is missing: {}", project.display_path(&commonjs));
    }
    written.extend(copy_tree(&commonjs, &staging)?);

    if let Some(descriptor) = descriptor {
        rename_package(&descriptor, &project.metadata().name, &config.publish.registry_name)?;
    }

    Ok(written)
}

/// Rewrites the first `"name": "<from>"` entry of a JSON descriptor
pub fn rename_package(descriptor: &std::path::Path, from: &str, to: &str) -> Result<()> {
    let content = read_file(descriptor)?;
    let pattern = Regex::new(&format!(r#""name"\s*:\s*"{}""#, regex::escape(from)))
        .context("Failed to build package name pattern")?;
    let renamed = pattern.replace(&content, format!(r#""name": "{}""#, to).as_str());
    write_file(descriptor, renamed.as_bytes())
}

/// Hands the staged directory to the registry client; returns its report
pub fn publish(ctx: &BuildContext) -> Result<String> {
    let dir = ctx.project.publish_dir();
    let report = ctx
        .tools
        .publisher
        .publish(&dir)
        .with_context(|| format!("Failed to publish {}", ctx.project.display_path(&dir)))?;
    Ok(report.trim().to_string())
}
