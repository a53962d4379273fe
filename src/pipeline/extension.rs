//! Optional extension bundles declared in the descriptor
//!
//! Each extension concatenates its files from `<sources>/extensions/<dir>/`
//! into `<build>/<name>/<name>.js`. Extensions are not cleaned first.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::artifact::write_minified;
use super::BuildContext;
use crate::storage::fsutil::{read_file, write_file};
use crate::storage::Extension;

/// Builds every declared extension, in name order
pub fn build_all(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (name, extension) in &ctx.project.metadata().extensions {
        written.extend(build(ctx, name, extension)?);
    }
    Ok(written)
}

pub fn build(ctx: &BuildContext, name: &str, extension: &Extension) -> Result<Vec<PathBuf>> {
    let source_dir = ctx.project.source_dir().join("extensions").join(&extension.dir);

    let mut sources = Vec::with_capacity(extension.files.len());
    for file in &extension.files {
        let content = read_file(&source_dir.join(file))
            .with_context(|| format!("Failed to build extension '{}'", name))?;
        sources.push(content);
    }

    let dest = ctx.project.build_dir().join(name).join(format!("{}.js", name));
    write_file(&dest, ctx.project.header().stamp(Some(name), &sources.join("\n")))?;

    let mut written = vec![dest.clone()];
    if !ctx.mode.is_watch() {
        written.push(write_minified(ctx, &dest, name)?);
    }
    ctx.output
        .verbose_ctx(name, &format!("Concatenated {} files", extension.files.len()));
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::fixture;
    use crate::pipeline::BuildMode;
    use crate::storage::{Project, ProjectMetadata};
    use std::fs;

    fn with_extensions(ctx: BuildContext) -> BuildContext {
        let root = ctx.project.root().to_path_buf();
        write_file(&root.join("src/extensions/sound/WebSound.js"), "var WebSound = 1;").unwrap();
        write_file(&root.join("src/extensions/sound/HTMLAudio.js"), "var HTMLAudio = 2;").unwrap();
        write_file(&root.join("src/extensions/tween/Tween.js"), "var Tween = 3;").unwrap();

        let mut metadata: ProjectMetadata = ctx.project.metadata().clone();
        metadata.extensions.insert(
            "sound".to_string(),
            Extension {
                dir: PathBuf::from("sound"),
                files: vec![PathBuf::from("WebSound.js"), PathBuf::from("HTMLAudio.js")],
            },
        );
        metadata.extensions.insert(
            "tween".to_string(),
            Extension {
                dir: PathBuf::from("tween"),
                files: vec![PathBuf::from("Tween.js")],
            },
        );

        let project = Project::from_parts(root, metadata, ctx.project.config().clone());
        BuildContext { project, ..ctx }
    }

    #[test]
    fn concatenates_in_declared_order() {
        let (dir, ctx, _) = fixture(BuildMode::Release);
        let ctx = with_extensions(ctx);

        let written = build_all(&ctx).unwrap();
        assert_eq!(written.len(), 4);

        let sound = fs::read_to_string(dir.path().join("build/sound/sound.js")).unwrap();
        assert!(sound.starts_with("/**\n * Hilo 1.1.0 for sound\n"));
        assert!(sound.ends_with("var WebSound = 1;\nvar HTMLAudio = 2;"));
        assert!(dir.path().join("build/tween/tween.min.js").exists());
    }

    #[test]
    fn missing_file_names_the_extension() {
        let (dir, ctx, _) = fixture(BuildMode::Watch);
        let ctx = with_extensions(ctx);
        fs::remove_file(dir.path().join("src/extensions/tween/Tween.js")).unwrap();

        let err = build_all(&ctx).unwrap_err();
        assert!(format!("{:#}", err).contains("extension 'tween'"));
    }

    #[test]
    fn no_extensions_is_a_no_op() {
        let (_dir, ctx, _) = fixture(BuildMode::Release);
        assert!(build_all(&ctx).unwrap().is_empty());
    }
}
