//! Command-line definitions.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use tracing::info;

use sitekit_bundle::{
    ReportBundle, SpecBuildOptions, SpecBundleConfig, build_bundle, derive_deployment_config,
};

/// Assemble a static deployment bundle for serverless hosting.
#[derive(Debug, Parser)]
#[command(name = "sitekit", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the bundle into the output directory
    Build(BuildArgs),
    /// Print the deployment configuration without building
    DeployConfig(ProjectArgs),
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project root
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub root: PathBuf,

    /// Configuration file (defaults to <root>/sitekit.toml when present)
    #[arg(short, long, env = "SITEKIT_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Bundle the Python backend and route requests to it
    #[arg(long)]
    pub with_backend: bool,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Output directory relative to the project root
    #[arg(long)]
    pub dist: Option<String>,

    /// Do not run the template render command
    #[arg(long)]
    pub no_render: bool,

    /// Report what would happen without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum copy workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Write the build report as JSON to this file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub report: Option<PathBuf>,
}

/// Marks configuration problems so `main` can map them to their exit code.
#[derive(Debug)]
pub struct ConfigProblem;

impl std::fmt::Display for ConfigProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("configuration error")
    }
}

impl std::error::Error for ConfigProblem {}

impl ProjectArgs {
    fn load_config(&self) -> Result<SpecBundleConfig> {
        let res_loaded = match &self.config {
            Some(path) => SpecBundleConfig::load(path),
            None => SpecBundleConfig::discover(&self.root),
        };
        let mut spec_config = res_loaded.context(ConfigProblem)?;
        if self.with_backend {
            spec_config.backend.if_enabled = true;
        }
        Ok(spec_config)
    }
}

/// Outcome of a finished command.
pub enum Outcome {
    Success,
    StepsFailed,
}

impl Cli {
    pub fn execute(self) -> Result<Outcome> {
        match self.command {
            Command::Build(args) => run_build(args),
            Command::DeployConfig(args) => run_deploy_config(args),
        }
    }
}

fn run_build(args: BuildArgs) -> Result<Outcome> {
    let mut spec_config = args.project.load_config()?;
    if let Some(dist) = args.dist {
        spec_config.dist_dir = dist;
    }
    if args.no_render {
        spec_config.render.if_enabled = false;
    }
    if args.workers.is_some() {
        spec_config.assets.num_workers_max = args.workers;
    }
    spec_config.validate().context(ConfigProblem)?;

    let spec_options = SpecBuildOptions {
        if_dry_run: args.dry_run,
    };
    let report = build_bundle(&args.project.root, &spec_config, &spec_options)?;

    for line in report.summary_lines() {
        info!("{line}");
    }
    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }

    if !report.is_success() {
        let l_names: Vec<_> = report.failed_steps().iter().map(|s| s.name).collect();
        tracing::error!("bundle incomplete, failed steps: {}", l_names.join(", "));
        return Ok(Outcome::StepsFailed);
    }
    if !report.if_dry_run {
        print_next_steps();
    }
    Ok(Outcome::Success)
}

fn run_deploy_config(args: ProjectArgs) -> Result<Outcome> {
    let spec_config = args.load_config()?;
    spec_config.validate().context(ConfigProblem)?;
    let txt = derive_deployment_config(&spec_config).to_json_pretty()?;
    print!("{txt}");
    Ok(Outcome::Success)
}

fn write_report(report: &ReportBundle, path: &Path) -> Result<()> {
    let mut txt = serde_json::to_string_pretty(report)?;
    txt.push('\n');
    fs::write(path, txt).with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), "build report written");
    Ok(())
}

fn print_next_steps() {
    println!();
    println!("Build complete! Ready for Vercel deployment.");
    println!();
    println!("Next steps:");
    println!("1. Push your changes to Git");
    println!("2. Connect your repository to Vercel");
    println!("3. Deploy from the Vercel dashboard");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_flags() {
        let cli = Cli::try_parse_from([
            "sitekit",
            "-v",
            "build",
            "--root",
            "site",
            "--no-render",
            "--with-backend",
            "--workers",
            "2",
            "--dry-run",
        ])
        .expect("parse");

        assert_eq!(cli.verbose, 1);
        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.project.root, PathBuf::from("site"));
        assert!(args.no_render && args.dry_run && args.project.with_backend);
        assert_eq!(args.workers, Some(2));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["sitekit", "-q", "-v", "build"]).is_err());
    }
}
