//! Bundle build pipeline.

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info, warn};

use sitekit_io_fs::{
    ReportCopy, SpecCopyError, SpecCopyOptions, copy_file_with_metadata, copy_tree,
};

use crate::conf::to_strings;
use crate::deploy::derive_deployment_config;
use crate::fallback::render_fallback_index;
use crate::layout::BundleLayout;
use crate::report::{EnumBundleStepStatus, ReportBundle, ReportBundleStep};
use crate::spec::{BundleError, SpecBuildOptions, SpecBundleConfig};

pub const STEP_PREPARE: &str = "prepare";
pub const STEP_COPY_STATIC: &str = "copy-static";
pub const STEP_COPY_COLLECTED: &str = "copy-collected";
pub const STEP_RENDER: &str = "render";
pub const STEP_FALLBACK: &str = "fallback";
pub const STEP_VERIFY: &str = "verify";
pub const STEP_BACKEND: &str = "backend";
pub const STEP_DEPLOY_CONFIG: &str = "deploy-config";

const C_INDEX_PAGE: &str = "index.html";
const TUP_BACKEND_EXCLUDE_DIRS: [&str; 2] = ["__pycache__", ".venv"];
const TUP_BACKEND_EXCLUDE_FILES: [&str; 1] = ["*.pyc"];

struct SpecBuildContext<'a> {
    spec_config: &'a SpecBundleConfig,
    spec_options: &'a SpecBuildOptions,
    layout: BundleLayout,
    report: ReportBundle,
}

impl SpecBuildContext<'_> {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.report.warnings.push(message);
    }

    fn push(&mut self, report_step: ReportBundleStep) {
        debug!(step = report_step.name, status = ?report_step.status, "step finished");
        self.report.steps.push(report_step);
    }

    fn if_dry_run(&self) -> bool {
        self.spec_options.if_dry_run
    }

    fn copy_options(&self) -> SpecCopyOptions {
        SpecCopyOptions {
            patterns_exclude_files: self.spec_config.assets.patterns_exclude.clone(),
            num_workers_max: self.spec_config.assets.num_workers_max,
            if_dry_run: self.if_dry_run(),
            ..SpecCopyOptions::default()
        }
    }
}

/// Assemble the deployment bundle for the project at `root`.
///
/// Steps run in a fixed order: prepare, copy-static, copy-collected, render,
/// fallback, verify, backend, deploy-config. Missing inputs and a failed
/// render are warnings; per-file copy errors mark their step failed and
/// the build continues. An `Err` means the bundle could not be assembled.
pub fn build_bundle(
    root: &Path,
    spec_config: &SpecBundleConfig,
    spec_options: &SpecBuildOptions,
) -> Result<ReportBundle, BundleError> {
    spec_config.validate()?;
    let layout = BundleLayout::new(root, spec_config);
    info!(
        root = %root.display(),
        dist = %layout.path_dir_dist.display(),
        dry_run = spec_options.if_dry_run,
        "building deployment bundle"
    );

    let mut spec_build_ctx = SpecBuildContext {
        spec_config,
        spec_options,
        report: ReportBundle::new(layout.path_dir_dist.clone(), spec_options.if_dry_run),
        layout,
    };

    step_prepare(&mut spec_build_ctx)?;
    let path_dir_static_src = root.join(&spec_config.assets.static_dir);
    let path_dir_static_dst = spec_build_ctx.layout.path_dir_static.clone();
    step_copy_assets(
        &mut spec_build_ctx,
        STEP_COPY_STATIC,
        &path_dir_static_src,
        &path_dir_static_dst,
    )?;
    let path_dir_collected_src = root.join(&spec_config.assets.collected_dir);
    let path_dir_collected_dst = spec_build_ctx.layout.collected_dir();
    step_copy_assets(
        &mut spec_build_ctx,
        STEP_COPY_COLLECTED,
        &path_dir_collected_src,
        &path_dir_collected_dst,
    )?;
    let b_rendered = step_render(&mut spec_build_ctx);
    step_fallback(&mut spec_build_ctx, b_rendered)?;
    step_verify(&mut spec_build_ctx);
    step_backend(&mut spec_build_ctx)?;
    step_deploy_config(&mut spec_build_ctx)?;

    info!("bundle build complete");
    Ok(spec_build_ctx.report)
}

fn step_prepare(spec_build_ctx: &mut SpecBuildContext<'_>) -> Result<(), BundleError> {
    info!("creating output directory");
    spec_build_ctx
        .layout
        .prepare(spec_build_ctx.if_dry_run())?;
    let enum_status = if spec_build_ctx.if_dry_run() {
        EnumBundleStepStatus::Skipped
    } else {
        EnumBundleStepStatus::Done
    };
    let c_dist = spec_build_ctx.layout.path_dir_dist.display().to_string();
    spec_build_ctx.push(ReportBundleStep::new(STEP_PREPARE, enum_status).with_detail(c_dist));
    Ok(())
}

fn derive_copy_status(report_copy: &ReportCopy) -> EnumBundleStepStatus {
    if report_copy.is_clean() {
        EnumBundleStepStatus::Done
    } else {
        EnumBundleStepStatus::Failed
    }
}

fn log_copy_diagnostics(spec_build_ctx: &mut SpecBuildContext<'_>, report_copy: &ReportCopy) {
    for warning in &report_copy.warnings {
        spec_build_ctx.warn(warning.clone());
    }
    for spec_error in &report_copy.errors {
        warn!(path = %spec_error.path.display(), "{}", spec_error.exception);
    }
}

fn step_copy_assets(
    spec_build_ctx: &mut SpecBuildContext<'_>,
    step: &'static str,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> Result<(), BundleError> {
    if !path_dir_src.is_dir() {
        spec_build_ctx.warn(format!("no {} directory found", path_dir_src.display()));
        spec_build_ctx.push(
            ReportBundleStep::new(step, EnumBundleStepStatus::Skipped)
                .with_detail("source missing"),
        );
        return Ok(());
    }

    info!(src = %path_dir_src.display(), dst = %path_dir_dst.display(), "copying assets");
    let report_copy = copy_tree(path_dir_src, path_dir_dst, spec_build_ctx.copy_options())
        .map_err(|source| BundleError::Copy { step, source })?;
    log_copy_diagnostics(spec_build_ctx, &report_copy);
    info!("{}", report_copy.format(&format!("[{step}]")));
    let enum_status = derive_copy_status(&report_copy);
    spec_build_ctx.push(ReportBundleStep::new(step, enum_status).with_copy(report_copy));
    Ok(())
}

/// Returns `true` when the render command ran and succeeded.
///
/// The command runs in the project root with inherited stdio.
fn step_render(spec_build_ctx: &mut SpecBuildContext<'_>) -> bool {
    if !spec_build_ctx.spec_config.render.if_enabled {
        spec_build_ctx.push(
            ReportBundleStep::new(STEP_RENDER, EnumBundleStepStatus::Skipped)
                .with_detail("disabled"),
        );
        return false;
    }
    let c_command_line = spec_build_ctx.spec_config.render_command_line();
    if spec_build_ctx.if_dry_run() {
        spec_build_ctx.push(
            ReportBundleStep::new(STEP_RENDER, EnumBundleStepStatus::Skipped)
                .with_detail(format!("dry run: {c_command_line}")),
        );
        return false;
    }

    info!(command = %c_command_line, "rendering templates");
    let res_status = Command::new(&spec_build_ctx.spec_config.render.program)
        .args(spec_build_ctx.spec_config.render_args())
        .current_dir(&spec_build_ctx.layout.path_dir_root)
        .status();

    let c_failure = match res_status {
        Ok(status) if status.success() => {
            info!("templates rendered");
            spec_build_ctx.push(
                ReportBundleStep::new(STEP_RENDER, EnumBundleStepStatus::Done)
                    .with_detail(c_command_line),
            );
            return true;
        }
        Ok(status) => format!("{c_command_line} exited with {status}"),
        Err(e) => format!("failed to start {c_command_line}: {e}"),
    };

    spec_build_ctx.warn(format!("could not render templates ({c_failure})"));
    spec_build_ctx.warn(format!("make sure to run: {c_command_line} before deploying"));
    spec_build_ctx.push(
        ReportBundleStep::new(STEP_RENDER, EnumBundleStepStatus::Failed).with_detail(c_failure),
    );
    false
}

fn step_fallback(
    spec_build_ctx: &mut SpecBuildContext<'_>,
    b_rendered: bool,
) -> Result<(), BundleError> {
    let path_file_index = spec_build_ctx.layout.path_dir_public.join(C_INDEX_PAGE);
    let skip_reason = if b_rendered {
        Some("templates rendered")
    } else if path_file_index.exists() {
        Some("index.html already present")
    } else if spec_build_ctx.if_dry_run() {
        Some("dry run")
    } else {
        None
    };
    if let Some(reason) = skip_reason {
        spec_build_ctx.push(
            ReportBundleStep::new(STEP_FALLBACK, EnumBundleStepStatus::Skipped)
                .with_detail(reason),
        );
        return Ok(());
    }

    info!(path = %path_file_index.display(), "creating fallback index.html");
    let txt_index = render_fallback_index(&spec_build_ctx.spec_config.fallback);
    fs::write(&path_file_index, txt_index).map_err(|source| BundleError::Write {
        path: path_file_index.clone(),
        source,
    })?;
    spec_build_ctx.push(
        ReportBundleStep::new(STEP_FALLBACK, EnumBundleStepStatus::Done)
            .with_detail(path_file_index.display().to_string()),
    );
    Ok(())
}

fn step_verify(spec_build_ctx: &mut SpecBuildContext<'_>) {
    if spec_build_ctx.if_dry_run() {
        spec_build_ctx.push(
            ReportBundleStep::new(STEP_VERIFY, EnumBundleStepStatus::Skipped)
                .with_detail("dry run"),
        );
        return;
    }

    info!("verifying HTML pages");
    let spec_config = spec_build_ctx.spec_config;
    let hint = spec_config
        .render
        .if_enabled
        .then(|| spec_config.render_command_line());
    let l_pages_missing: Vec<String> = spec_config
        .expected_pages
        .iter()
        .filter(|page| {
            !spec_build_ctx
                .layout
                .path_dir_public
                .join(page.as_str())
                .is_file()
        })
        .cloned()
        .collect();

    for page in &l_pages_missing {
        match &hint {
            Some(c_command_line) => spec_build_ctx.warn(format!(
                "missing {page} - make sure to run: {c_command_line}"
            )),
            None => spec_build_ctx.warn(format!("missing {page}")),
        }
    }
    let detail = format!(
        "{}/{} pages present",
        spec_config.expected_pages.len() - l_pages_missing.len(),
        spec_config.expected_pages.len()
    );
    spec_build_ctx.report.missing_pages = l_pages_missing;
    spec_build_ctx.push(
        ReportBundleStep::new(STEP_VERIFY, EnumBundleStepStatus::Done).with_detail(detail),
    );
}

fn step_backend(spec_build_ctx: &mut SpecBuildContext<'_>) -> Result<(), BundleError> {
    let spec_config = spec_build_ctx.spec_config;
    if !spec_config.backend.if_enabled {
        spec_build_ctx.push(
            ReportBundleStep::new(STEP_BACKEND, EnumBundleStepStatus::Skipped)
                .with_detail("disabled"),
        );
        return Ok(());
    }

    info!("bundling backend sources");
    let if_dry_run = spec_build_ctx.if_dry_run();
    let mut report_total = ReportCopy::default();
    let spec_cp_options = SpecCopyOptions {
        patterns_exclude_dirs: to_strings(&TUP_BACKEND_EXCLUDE_DIRS),
        patterns_exclude_files: to_strings(&TUP_BACKEND_EXCLUDE_FILES),
        ..spec_build_ctx.copy_options()
    };

    for c_source in &spec_config.backend.sources {
        let path_src = spec_build_ctx.layout.path_dir_root.join(c_source);
        let path_dst = spec_build_ctx.layout.path_dir_dist.join(c_source);
        if path_src.is_dir() {
            debug!(
                src = %path_src.display(),
                dst = %path_dst.display(),
                "copying backend directory"
            );
            let report_copy = copy_tree(&path_src, &path_dst, spec_cp_options.clone()).map_err(
                |source| BundleError::Copy {
                    step: STEP_BACKEND,
                    source,
                },
            )?;
            report_total.absorb(report_copy);
        } else if path_src.is_file() {
            debug!(
                src = %path_src.display(),
                dst = %path_dst.display(),
                "copying backend file"
            );
            report_total.cnt_scanned += 1;
            report_total.cnt_matched += 1;
            if if_dry_run {
                report_total.cnt_skipped += 1;
                continue;
            }
            match copy_file_with_metadata(&path_src, &path_dst) {
                Ok(()) => report_total.cnt_copied += 1,
                Err(e) => report_total.errors.push(SpecCopyError {
                    path: path_dst,
                    exception: e.to_string(),
                }),
            }
        } else {
            report_total
                .warnings
                .push(format!("backend source not found: {}", path_src.display()));
        }
    }

    let path_file_entry = spec_build_ctx
        .layout
        .path_dir_dist
        .join(&spec_config.backend.entrypoint);
    if !if_dry_run && !path_file_entry.is_file() {
        report_total.warnings.push(format!(
            "backend entrypoint {} is not part of the bundle",
            spec_config.backend.entrypoint
        ));
    }

    log_copy_diagnostics(spec_build_ctx, &report_total);
    info!("{}", report_total.format(&format!("[{STEP_BACKEND}]")));
    let enum_status = derive_copy_status(&report_total);
    spec_build_ctx.push(ReportBundleStep::new(STEP_BACKEND, enum_status).with_copy(report_total));
    Ok(())
}

fn step_deploy_config(spec_build_ctx: &mut SpecBuildContext<'_>) -> Result<(), BundleError> {
    let spec_deploy = derive_deployment_config(spec_build_ctx.spec_config);
    let path_file_deploy = spec_build_ctx.layout.deploy_config_path();
    if spec_build_ctx.if_dry_run() {
        // Serialize anyway so a broken config still surfaces in dry-run.
        spec_deploy.to_json_pretty()?;
        spec_build_ctx.push(
            ReportBundleStep::new(STEP_DEPLOY_CONFIG, EnumBundleStepStatus::Skipped)
                .with_detail(format!("dry run: {}", path_file_deploy.display())),
        );
        return Ok(());
    }

    info!(path = %path_file_deploy.display(), "writing deployment config");
    spec_deploy.write_to(&path_file_deploy)?;
    spec_build_ctx.push(
        ReportBundleStep::new(STEP_DEPLOY_CONFIG, EnumBundleStepStatus::Done)
            .with_detail(path_file_deploy.display().to_string()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::deploy::SpecDeploymentConfig;

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    fn seed_project(root: &Path) {
        write_text(&root.join("static/css/style.css"), "body {}");
        write_text(&root.join("static/js/programs.js"), "load();");
        write_text(&root.join("static/.DS_Store"), "");
        write_text(&root.join("staticfiles/admin/base.css"), "admin");
        write_text(&root.join("api/index.py"), "def handler(request): ...");
        write_text(&root.join("api/__pycache__/index.cpython-312.pyc"), "bytecode");
        write_text(&root.join("manage.py"), "#!/usr/bin/env python");
        write_text(&root.join("school/__init__.py"), "");
        write_text(&root.join("school_website/settings.py"), "DEBUG = False");
        write_text(&root.join("requirements.txt"), "django\n");
    }

    fn static_only() -> SpecBundleConfig {
        let mut spec_config = SpecBundleConfig::default();
        spec_config.render.if_enabled = false;
        spec_config
    }

    fn with_backend() -> SpecBundleConfig {
        let mut spec_config = static_only();
        spec_config.backend.if_enabled = true;
        spec_config
    }

    fn read_deploy_config(root: &Path) -> SpecDeploymentConfig {
        SpecDeploymentConfig::from_json(
            &fs::read_to_string(root.join("dist/vercel.json")).expect("read config"),
        )
        .expect("parse config")
    }

    #[test]
    fn static_build_copies_assets_and_writes_fallback() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        seed_project(root);

        let report =
            build_bundle(root, &static_only(), &SpecBuildOptions::default()).expect("build");

        assert!(report.is_success());
        let path_dir_public = root.join("dist/public");
        assert_eq!(
            fs::read_to_string(path_dir_public.join("static/css/style.css")).expect("read"),
            "body {}"
        );
        assert!(path_dir_public.join("static/js/programs.js").is_file());
        assert!(!path_dir_public.join("static/.DS_Store").exists());
        assert!(path_dir_public.join("staticfiles/admin/base.css").is_file());

        let txt_index =
            fs::read_to_string(path_dir_public.join("index.html")).expect("read index");
        assert!(txt_index.contains("<title>Akonsec School Website</title>"));
        assert_eq!(
            report.step(STEP_FALLBACK).expect("step").status,
            EnumBundleStepStatus::Done
        );

        assert_eq!(report.missing_pages.len(), 6);
        assert!(!report.missing_pages.contains(&"index.html".to_string()));
        assert!(!root.join("dist/api").exists());
        assert_eq!(
            read_deploy_config(root),
            derive_deployment_config(&static_only())
        );
    }

    #[test]
    fn missing_asset_dirs_are_warnings() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let report = build_bundle(tmp.path(), &static_only(), &SpecBuildOptions::default())
            .expect("build");

        assert!(report.is_success());
        assert_eq!(
            report.step(STEP_COPY_STATIC).expect("step").status,
            EnumBundleStepStatus::Skipped
        );
        assert_eq!(
            report.step(STEP_COPY_COLLECTED).expect("step").status,
            EnumBundleStepStatus::Skipped
        );
        assert!(report.warnings.iter().any(|w| w.contains("static")));
        assert!(tmp.path().join("dist/public/static").is_dir());
    }

    #[test]
    fn previous_output_is_cleared() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("dist/public/stale.html"), "old");

        build_bundle(tmp.path(), &static_only(), &SpecBuildOptions::default()).expect("build");
        assert!(!tmp.path().join("dist/public/stale.html").exists());
    }

    #[test]
    fn overlapping_asset_dir_aborts_the_build() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut spec_config = static_only();
        spec_config.assets.static_dir = "dist".to_string();

        let err = build_bundle(tmp.path(), &spec_config, &SpecBuildOptions::default())
            .expect_err("must fail");
        assert!(matches!(
            err,
            BundleError::Copy {
                step: STEP_COPY_STATIC,
                ..
            }
        ));
    }

    #[test]
    fn unstartable_render_command_falls_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        seed_project(tmp.path());
        let mut spec_config = SpecBundleConfig::default();
        spec_config.render.program = "sitekit-no-such-renderer".to_string();

        let report = build_bundle(tmp.path(), &spec_config, &SpecBuildOptions::default())
            .expect("build");

        assert!(report.is_success());
        assert_eq!(
            report.step(STEP_RENDER).expect("step").status,
            EnumBundleStepStatus::Failed
        );
        assert_eq!(
            report.step(STEP_FALLBACK).expect("step").status,
            EnumBundleStepStatus::Done
        );
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("make sure to run: sitekit-no-such-renderer"))
        );
        assert!(tmp.path().join("dist/public/index.html").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn failing_render_command_falls_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut spec_config = SpecBundleConfig::default();
        spec_config.render.program = "sh".to_string();
        spec_config.render.args = vec!["-c".to_string(), "exit 3".to_string()];

        let report = build_bundle(tmp.path(), &spec_config, &SpecBuildOptions::default())
            .expect("build");
        let report_render = report.step(STEP_RENDER).expect("step");
        assert_eq!(report_render.status, EnumBundleStepStatus::Failed);
        assert!(
            report_render
                .detail
                .as_deref()
                .unwrap_or_default()
                .contains("exit")
        );
        assert!(tmp.path().join("dist/public/index.html").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn successful_render_skips_fallback() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut spec_config = SpecBundleConfig::default();
        spec_config.render.program = "sh".to_string();
        spec_config.render.args = vec![
            "-c".to_string(),
            "for p in index about; do echo \"<h1>$p</h1>\" > {public}/$p.html; done".to_string(),
        ];
        spec_config.expected_pages = vec!["index.html".to_string(), "about.html".to_string()];

        let report = build_bundle(tmp.path(), &spec_config, &SpecBuildOptions::default())
            .expect("build");

        assert_eq!(
            report.step(STEP_RENDER).expect("step").status,
            EnumBundleStepStatus::Done
        );
        assert_eq!(
            report.step(STEP_FALLBACK).expect("step").status,
            EnumBundleStepStatus::Skipped
        );
        assert!(report.missing_pages.is_empty());
        assert_eq!(
            fs::read_to_string(tmp.path().join("dist/public/index.html")).expect("read"),
            "<h1>index</h1>\n"
        );
    }

    #[test]
    fn backend_sources_are_bundled() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        seed_project(root);
        let mut spec_config = with_backend();
        spec_config.backend.sources.push("worker.py".to_string());

        let report = build_bundle(root, &spec_config, &SpecBuildOptions::default()).expect("build");

        assert!(report.is_success());
        assert!(root.join("dist/api/index.py").is_file());
        assert!(!root.join("dist/api/__pycache__").exists());
        assert!(root.join("dist/manage.py").is_file());
        assert!(root.join("dist/school/__init__.py").is_file());
        assert!(root.join("dist/school_website/settings.py").is_file());
        assert_eq!(
            fs::read_to_string(root.join("dist/requirements.txt")).expect("read"),
            "django\n"
        );
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("backend source not found") && w.contains("worker.py"))
        );
        assert_eq!(report.warnings.iter().filter(|w| w.contains("not found")).count(), 1);
    }

    #[test]
    fn backend_deploy_config_points_at_bundled_paths() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        seed_project(root);

        let report =
            build_bundle(root, &with_backend(), &SpecBuildOptions::default()).expect("build");
        assert!(report.is_success());

        let path_dir_dist = root.join("dist");
        let spec_deploy = read_deploy_config(root);
        assert_eq!(spec_deploy.builds.len(), 2);
        for spec_build in &spec_deploy.builds {
            let c_src = spec_build.src.trim_end_matches("/**");
            assert!(path_dir_dist.join(c_src).exists(), "build src {c_src}");
        }

        let l_samples = [("/static/", "css/style.css"), ("/staticfiles/", "admin/base.css")];
        for spec_route in &spec_deploy.routes {
            let c_sample = l_samples
                .iter()
                .find(|(c_prefix, _)| spec_route.src.starts_with(c_prefix))
                .map_or("", |(_, c_file)| *c_file);
            let c_dest = spec_route.dest.replace("$1", c_sample);
            let path_file_dest = path_dir_dist.join(c_dest.trim_start_matches('/'));
            assert!(
                path_file_dest.is_file(),
                "{} -> {}",
                spec_route.src,
                path_file_dest.display()
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn backend_file_sources_keep_metadata() {
        use filetime::{FileTime, set_file_times};

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        seed_project(root);
        set_file_times(
            root.join("requirements.txt"),
            FileTime::from_unix_time(1_700_000_010, 0),
            FileTime::from_unix_time(1_700_000_020, 0),
        )
        .expect("set times");

        build_bundle(root, &with_backend(), &SpecBuildOptions::default()).expect("build");

        let meta_dst = fs::metadata(root.join("dist/requirements.txt")).expect("dst meta");
        assert_eq!(
            FileTime::from_last_modification_time(&meta_dst),
            FileTime::from_unix_time(1_700_000_020, 0)
        );
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        seed_project(root);
        let mut spec_config = SpecBundleConfig::default();
        spec_config.backend.if_enabled = true;

        let report = build_bundle(root, &spec_config, &SpecBuildOptions { if_dry_run: true })
            .expect("build");

        assert!(report.if_dry_run);
        assert!(!root.join("dist").exists());
        let report_copy = report
            .step(STEP_COPY_STATIC)
            .and_then(|s| s.report_copy.as_ref())
            .expect("copy report");
        assert_eq!(report_copy.cnt_copied, 0);
        assert!(report_copy.cnt_skipped > 0);
        assert_eq!(
            report.step(STEP_DEPLOY_CONFIG).expect("step").status,
            EnumBundleStepStatus::Skipped
        );
    }

    #[test]
    fn invalid_config_aborts_before_touching_disk() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let spec_config = SpecBundleConfig {
            dist_dir: "../escape".to_string(),
            ..static_only()
        };
        let err = build_bundle(tmp.path(), &spec_config, &SpecBuildOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, BundleError::Config(_)));
    }
}
