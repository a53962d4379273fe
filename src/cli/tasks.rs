//! Task declarations for a project
//!
//! Every target the CLI accepts is declared here against the project's
//! configuration: one chain per convention, one task per adapter, the
//! extension bundle, one chain per documentation language, the quality
//! tasks, publishing and the aggregate groups.

use anyhow::Result;

use crate::domain::{Scheduler, TargetConvention};
use crate::pipeline::{adapter, artifact, docs, extension, publish, quality, BuildContext};
use crate::storage::Project;

pub type BuildScheduler = Scheduler<BuildContext>;

const NO_DEPS: [&str; 0] = [];

/// Targets that imply fast (watch) mode for the whole invocation
pub const FAST_TARGETS: [&str; 3] = ["watch", "lint", "test"];

/// Builds the scheduler holding every task of `project`
pub fn declare_tasks(project: &Project) -> BuildScheduler {
    let mut scheduler = BuildScheduler::new();
    let config = project.config();

    for &convention in &config.conventions {
        declare_convention(&mut scheduler, convention);
    }
    scheduler.declare_group(
        "format",
        config.conventions.iter().map(|c| c.as_str().to_string()),
    );

    for bundle in &config.adapters {
        let clean_id = format!("{}-clean", bundle.name);
        let a = bundle.clone();
        scheduler.declare_task(&clean_id, NO_DEPS, move |ctx: &BuildContext| adapter::clean(ctx, &a));
        let a = bundle.clone();
        scheduler.declare_task(&bundle.name, [clean_id], move |ctx: &BuildContext| {
            adapter::build(ctx, &a).map(|_| ())
        });
    }

    scheduler.declare_task("extensions", NO_DEPS, |ctx: &BuildContext| {
        extension::build_all(ctx).map(|_| ())
    });

    for language in &config.docs.languages {
        declare_docs(&mut scheduler, language);
    }
    scheduler.declare_group(
        "doc",
        config.docs.languages.iter().map(|lang| format!("doc-{}", lang)),
    );

    let adapters = config.adapters.iter().map(|a| a.name.clone());
    let mut watch_deps: Vec<String> = Vec::new();
    if config.has_convention(TargetConvention::Standalone) {
        watch_deps.push("standalone".to_string());

        scheduler.declare_task("lint", ["standalone"], |ctx: &BuildContext| {
            quality::lint(ctx).map(|_| ())
        });
        scheduler.declare_task("test", ["lint"], quality::test);

        if config.has_convention(TargetConvention::CommonJs) {
            declare_publish(&mut scheduler);
        }
    }
    watch_deps.extend(adapters.clone());
    watch_deps.push("extensions".to_string());
    scheduler.declare_group("watch", watch_deps);

    let mut default_deps = vec!["format".to_string()];
    default_deps.extend(adapters);
    default_deps.push("extensions".to_string());
    scheduler.declare_group("default", default_deps);

    scheduler
}

fn declare_convention(scheduler: &mut BuildScheduler, convention: TargetConvention) {
    let name = convention.as_str();
    let clean = format!("{}-clean", name);
    let format = format!("{}-format", name);
    let minify = format!("{}-minify", name);
    let archive = format!("{}-archive", name);

    scheduler.declare_task(&clean, NO_DEPS, move |ctx: &BuildContext| {
        artifact::clean(ctx, convention)
    });
    scheduler.declare_task(&format, [clean], move |ctx: &BuildContext| {
        artifact::format(ctx, convention).map(|_| ())
    });
    scheduler.declare_task(&minify, [format], move |ctx: &BuildContext| {
        artifact::minify(ctx, convention).map(|_| ())
    });
    scheduler.declare_task(&archive, [minify], move |ctx: &BuildContext| {
        artifact::archive(ctx, convention).map(|_| ())
    });
    scheduler.declare_group(name, [archive]);
}

fn declare_docs(scheduler: &mut BuildScheduler, language: &str) {
    let clean = format!("doc-clean-{}", language);
    let comment = format!("doc-comment-{}", language);

    let lang = language.to_string();
    scheduler.declare_task(&clean, NO_DEPS, move |ctx: &BuildContext| docs::clean(ctx, &lang));
    let lang = language.to_string();
    scheduler.declare_task(&comment, [clean], move |ctx: &BuildContext| {
        docs::stage(ctx, &lang).map(|_| ())
    });
    let lang = language.to_string();
    scheduler.declare_task(format!("doc-{}", language), [comment], move |ctx: &BuildContext| {
        docs::generate(ctx, &lang)
    });
}

fn declare_publish(scheduler: &mut BuildScheduler) {
    scheduler.declare_task("publish-clean", NO_DEPS, publish::clean);
    scheduler.declare_task(
        "publish-stage",
        ["publish-clean", "standalone", "commonjs"],
        |ctx: &BuildContext| publish::stage(ctx).map(|_| ()),
    );
    scheduler.declare_task("publish", ["publish-stage"], |ctx: &BuildContext| -> Result<()> {
        let report = publish::publish(ctx)?;
        if !report.is_empty() {
            ctx.output.log(&report);
        }
        Ok(())
    });
}

/// Whether any requested target implies fast mode
pub fn implies_fast_mode<S: AsRef<str>>(targets: &[S]) -> bool {
    targets
        .iter()
        .any(|t| FAST_TARGETS.contains(&t.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::fixture;
    use crate::domain::SchedulingError;
    use crate::pipeline::BuildMode;
    use crate::storage::BuildConfig;

    fn deps(scheduler: &BuildScheduler, id: &str) -> Vec<String> {
        scheduler
            .task(id)
            .map(|t| t.depends_on.clone())
            .unwrap_or_else(|| panic!("task '{}' not declared", id))
    }

    #[test]
    fn default_task_set_is_valid() {
        let (_dir, ctx, _) = fixture(BuildMode::Release);
        let scheduler = declare_tasks(&ctx.project);
        assert!(scheduler.validate().is_ok());

        assert_eq!(deps(&scheduler, "amd-format"), vec!["amd-clean"]);
        assert_eq!(deps(&scheduler, "amd"), vec!["amd-archive"]);
        assert_eq!(
            deps(&scheduler, "format"),
            vec!["standalone", "amd", "commonjs", "kissy", "cmd"]
        );
        assert_eq!(deps(&scheduler, "flash"), vec!["flash-clean"]);
        assert_eq!(deps(&scheduler, "doc"), vec!["doc-en", "doc-zh"]);
        assert_eq!(deps(&scheduler, "doc-zh"), vec!["doc-comment-zh"]);
        assert_eq!(deps(&scheduler, "watch"), vec!["standalone", "flash", "extensions"]);
        assert_eq!(
            deps(&scheduler, "publish-stage"),
            vec!["publish-clean", "standalone", "commonjs"]
        );
        assert_eq!(deps(&scheduler, "default"), vec!["format", "flash", "extensions"]);
        assert!(deps(&scheduler, "extensions").is_empty());
    }

    #[test]
    fn reduced_conventions_drop_dependent_tasks() {
        let (dir, ctx, _) = fixture(BuildMode::Release);
        let config = BuildConfig {
            conventions: vec![TargetConvention::Amd],
            ..BuildConfig::default()
        };
        let project = Project::from_parts(dir.path(), ctx.project.metadata().clone(), config);

        let scheduler = declare_tasks(&project);
        assert!(scheduler.validate().is_ok());
        assert!(!scheduler.contains("lint"));
        assert!(!scheduler.contains("publish"));
        assert_eq!(deps(&scheduler, "watch"), vec!["flash", "extensions"]);
    }

    #[test]
    fn colliding_adapter_fails_validation() {
        let (dir, ctx, _) = fixture(BuildMode::Release);
        let mut config = BuildConfig::default();
        config.adapters[0].name = "extensions".to_string();
        let project = Project::from_parts(dir.path(), ctx.project.metadata().clone(), config);

        let scheduler = declare_tasks(&project);
        assert_eq!(
            scheduler.validate().unwrap_err(),
            SchedulingError::DuplicateTask("extensions".to_string())
        );
    }

    #[test]
    fn fast_mode_targets() {
        assert!(implies_fast_mode(&["standalone", "lint"]));
        assert!(implies_fast_mode(&["watch".to_string()]));
        assert!(!implies_fast_mode(&["default"]));
    }

    #[test]
    fn standalone_run_executes_its_chain_once() {
        let (dir, ctx, _) = fixture(BuildMode::Watch);
        let scheduler = declare_tasks(&ctx.project);

        let report = scheduler.run(&["standalone", "standalone-format"], &ctx).unwrap();
        assert!(report.success());
        assert_eq!(
            report.executed(),
            vec![
                "standalone-clean",
                "standalone-format",
                "standalone-minify",
                "standalone-archive",
                "standalone"
            ]
        );
        assert!(dir.path().join("build/standalone/hilo-standalone.js").exists());
    }

    #[test]
    fn failing_adapter_does_not_block_conventions() {
        let (dir, ctx, _) = fixture(BuildMode::Watch);
        let scheduler = declare_tasks(&ctx.project);

        // flash sources are absent from the fixture
        let report = scheduler.run(&["default"], &ctx).unwrap();
        assert!(!report.success());
        assert!(report.outcome("flash").map(|o| !o.is_success()).unwrap_or(false));
        assert!(report.outcome("format").unwrap().is_success());
        assert!(report.outcome("extensions").unwrap().is_success());
        assert!(dir.path().join("build/cmd/hilo-cmd.js").exists());
    }
}
