//! The end-to-end build pipeline.
//!
//! Lives in the library rather than the binary so the whole sequence can
//! run against a mock [`Runner`]. Control flow is strictly linear:
//! workspace → clone → BuildRequires → build.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::build::build_package;
use crate::buildreq::{resolve_and_install, ConventionalLayout};
use crate::config::Config;
use crate::process::Runner;
use crate::source::{clone_source, parse_pkg_name};
use crate::workspace::Workspace;

/// Everything the CLI collects for one run.
pub struct BuildRequest {
    pub config_file: PathBuf,
    pub input_url: String,
    pub git_branch: String,
    pub output_dir: PathBuf,
}

/// Run the full pipeline for one package.
pub fn run(request: &BuildRequest, runner: &dyn Runner) -> Result<()> {
    let config = Config::load(&request.config_file)
        .with_context(|| format!("loading config '{}'", request.config_file.display()))?;
    let policy = config.tool_policy();

    let workspace = Workspace::prepare(&config, &request.output_dir, runner)
        .context("preparing workspace")?;

    let pkg_name = parse_pkg_name(&request.input_url);
    clone_source(
        runner,
        policy,
        &request.input_url,
        &workspace.work_dir,
        &pkg_name,
        Some(&request.git_branch),
    )
    .with_context(|| format!("fetching '{}'", request.input_url))?;

    resolve_and_install(
        runner,
        policy,
        &ConventionalLayout,
        &workspace.work_dir,
        &pkg_name,
        &workspace.chroot_root,
    )
    .with_context(|| format!("installing BuildRequires of '{}'", pkg_name))?;

    build_package(
        runner,
        policy,
        &workspace.work_dir,
        &pkg_name,
        &workspace.chroot_root,
        &request.output_dir,
    )
    .with_context(|| format!("building '{}'", pkg_name))?;

    println!("Package generated at {}", request.output_dir.display());
    Ok(())
}
