//! Toolchain installation into the chroot root.
//!
//! Installs the configured baseline packages with dnf's install-into-
//! alternate-root mode, then lays out the rpmbuild staging directories the
//! build step expects.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::Error;
use crate::package_list::parse_package_list;
use crate::process::{enforce, Invocation, Runner, ToolPolicy};
use crate::workspace::{self, Workspace};

/// rpmbuild's expected staging layout under /root/rpmbuild inside the chroot.
pub const RPMBUILD_DIRS: [&str; 6] = ["BUILD", "BUILDROOT", "RPMS", "SOURCES", "SPECS", "SRPMS"];

/// Copy the repo definition into the chroot, install every toolchain
/// package, and create the rpmbuild staging directories.
pub fn install(config: &Config, workspace: &Workspace, runner: &dyn Runner) -> Result<()> {
    let policy = config.tool_policy();
    let repo_file = config.toolchain_repo()?;
    copy_repo_file(&repo_file, &workspace.repo_dir)?;

    let packages = parse_package_list(&config.toolchain_packages()?)?;
    println!(
        "Installing {} toolchain packages into {} ...",
        packages.len(),
        workspace.chroot_root.display()
    );
    for pkg in &packages {
        println!("Installing: {} ...", pkg);
        install_into_root(runner, policy, &workspace.chroot_root, pkg)?;

        // Installing the base `filesystem` package lays down a fresh /etc
        // and clobbers the repo directory. Put the repo file back so later
        // installs still see a repository source. Applies to that exact
        // package name only.
        if pkg == "filesystem" {
            workspace::recreate(&workspace.repo_dir)?;
            copy_repo_file(&repo_file, &workspace.repo_dir)?;
        }
    }

    let rpmbuild_root = workspace.rpmbuild_root();
    for dir in RPMBUILD_DIRS {
        let path = rpmbuild_root.join(dir);
        fs::create_dir_all(&path).map_err(|source| Error::Filesystem {
            path: path.clone(),
            source,
        })?;
    }

    Ok(())
}

/// Install a single package into `chroot_root` via the system package
/// manager. One package per invocation; failures follow `policy`.
pub fn install_into_root(
    runner: &dyn Runner,
    policy: ToolPolicy,
    chroot_root: &Path,
    pkg: &str,
) -> Result<()> {
    let root = chroot_root.to_string_lossy();
    let inv = Invocation::new("dnf", &["install", "-y", "--installroot", &root, pkg]);
    let code = runner.run(&inv)?;
    enforce(policy, &format!("dnf install {}", pkg), code)
}

fn copy_repo_file(repo_file: &Path, repo_dir: &Path) -> Result<(), Error> {
    let file_name = repo_file.file_name().ok_or_else(|| {
        Error::Config(format!(
            "toolchain_repo '{}' has no file name",
            repo_file.display()
        ))
    })?;
    let dest = repo_dir.join(file_name);
    fs::copy(repo_file, &dest).map_err(|source| Error::Filesystem {
        path: repo_file.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use crate::workspace::Workspace;
    use std::io::Write;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        config: Config,
        workspace: Workspace,
    }

    fn fixture(packages_json: &str) -> Fixture {
        let temp = TempDir::new().unwrap();
        let repo_file = temp.path().join("build.repo");
        fs::write(&repo_file, "[build]\nbaseurl=file:///repo\n").unwrap();

        let list_file = temp.path().join("pkgs.json");
        fs::write(&list_file, packages_json).unwrap();

        let config_file = temp.path().join("config.yaml");
        let mut file = fs::File::create(&config_file).unwrap();
        writeln!(file, "working_dir: {}", temp.path().join("work").display()).unwrap();
        writeln!(file, "toolchain_repo: {}", repo_file.display()).unwrap();
        writeln!(file, "toolchain_packages: {}", list_file.display()).unwrap();

        let config = Config::load(&config_file).unwrap();
        let workspace = Workspace::create_dirs(
            &temp.path().join("work"),
            &temp.path().join("out"),
        )
        .unwrap();

        Fixture {
            _temp: temp,
            config,
            workspace,
        }
    }

    #[test]
    fn installs_each_package_separately() {
        let fx = fixture(r#"{"packages": ["bash", "coreutils"]}"#);
        let runner = RecordingRunner::new();

        install(&fx.config, &fx.workspace, &runner).unwrap();

        let root = fx.workspace.chroot_root.to_string_lossy().into_owned();
        assert_eq!(
            runner.call_log(),
            vec![
                format!("dnf install -y --installroot {} bash", root),
                format!("dnf install -y --installroot {} coreutils", root),
            ]
        );
    }

    #[test]
    fn creates_rpmbuild_staging_dirs() {
        let fx = fixture(r#"{"packages": []}"#);
        let runner = RecordingRunner::new();

        install(&fx.config, &fx.workspace, &runner).unwrap();

        for dir in RPMBUILD_DIRS {
            assert!(
                fx.workspace.rpmbuild_root().join(dir).is_dir(),
                "missing staging dir {}",
                dir
            );
        }
    }

    #[test]
    fn copies_repo_file_into_chroot() {
        let fx = fixture(r#"{"packages": []}"#);
        let runner = RecordingRunner::new();

        install(&fx.config, &fx.workspace, &runner).unwrap();

        assert!(fx.workspace.repo_dir.join("build.repo").is_file());
    }

    #[test]
    fn recopies_repo_file_after_filesystem_package() {
        let fx = fixture(r#"{"packages": ["bash", "filesystem", "coreutils"]}"#);
        let repo_dir = fx.workspace.repo_dir.clone();

        // Simulate the filesystem package clobbering the repo directory.
        let mut runner = RecordingRunner::new();
        let clobber_dir = repo_dir.clone();
        runner.side_effect = Some(Box::new(move |inv| {
            if inv.args.last().map(String::as_str) == Some("filesystem") {
                fs::remove_dir_all(&clobber_dir).unwrap();
            }
        }));

        install(&fx.config, &fx.workspace, &runner).unwrap();

        assert!(
            repo_dir.join("build.repo").is_file(),
            "repo file must be restored after the filesystem package install"
        );
        assert_eq!(runner.call_log().len(), 3, "all three installs must run");
    }
}
