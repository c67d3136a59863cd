//! Workspace preparation.
//!
//! Every run starts from a clean slate: the working directory, the output
//! directory, and the chroot root are destroyed and recreated before any
//! package is installed. Nothing from a prior run survives, including the
//! debris an interrupted run may have left behind.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Error;
use crate::process::Runner;
use crate::toolchain;

/// Directory name of the chroot root under the working directory.
pub const CHROOT_DIR: &str = "chroot";

/// Repo definition directory inside the chroot, where dnf looks for
/// repository sources when resolving into the install root.
pub const REPO_DIR: &str = "etc/yum.repos.d";

/// Paths of a prepared run.
pub struct Workspace {
    pub work_dir: PathBuf,
    pub chroot_root: PathBuf,
    pub repo_dir: PathBuf,
}

impl Workspace {
    /// Wipe and recreate the directory tree, then install the toolchain into
    /// the fresh chroot root.
    ///
    /// Destroys anything previously at the configured working directory and
    /// at `output_dir`. Callers must not pass paths holding data they want
    /// to keep.
    pub fn prepare(config: &Config, output_dir: &Path, runner: &dyn Runner) -> Result<Self> {
        let work_dir = config.working_dir()?;
        println!("Preparing workspace at {}", work_dir.display());

        let workspace = Self::create_dirs(&work_dir, output_dir)?;
        toolchain::install(config, &workspace, runner)?;
        Ok(workspace)
    }

    /// Directory layout only, no package installs. Split out so the wipe and
    /// recreate behavior is testable without a package manager.
    pub fn create_dirs(work_dir: &Path, output_dir: &Path) -> Result<Self, Error> {
        let chroot_root = work_dir.join(CHROOT_DIR);
        let repo_dir = chroot_root.join(REPO_DIR);

        recreate(work_dir)?;
        recreate(output_dir)?;
        create(&chroot_root)?;
        create(&repo_dir)?;

        Ok(Self {
            work_dir: work_dir.to_path_buf(),
            chroot_root,
            repo_dir,
        })
    }

    /// The rpmbuild staging root inside the chroot.
    pub fn rpmbuild_root(&self) -> PathBuf {
        self.chroot_root.join("root/rpmbuild")
    }
}

/// Delete a directory tree if present, then create it empty.
pub fn recreate(dir: &Path) -> Result<(), Error> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|source| Error::Filesystem {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    create(dir)
}

fn create(dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|source| Error::Filesystem {
        path: dir.to_path_buf(),
        source,
    })
}
