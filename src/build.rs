//! Staging and the rpmbuild run itself.
//!
//! Moves the spec and sources into the chroot's rpmbuild layout, runs
//! `rpmbuild -ba` with the chroot as the process root, and collects the
//! resulting RPMs into the output directory.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::process::{enforce, Invocation, Runner, ToolPolicy};

/// Build the package and move its artifacts to `output_dir`.
///
/// Expects the staging directories to exist (created during toolchain
/// installation) and the cloned source at `work_dir/<pkg_name>/`.
pub fn build_package(
    runner: &dyn Runner,
    policy: ToolPolicy,
    work_dir: &Path,
    pkg_name: &str,
    chroot_root: &Path,
    output_dir: &Path,
) -> Result<()> {
    let rpmbuild_root = chroot_root.join("root/rpmbuild");
    let specs_dir = rpmbuild_root.join("SPECS");
    let sources_dir = rpmbuild_root.join("SOURCES");
    let rpms_dir = rpmbuild_root.join("RPMS");

    let pkg_dir = work_dir.join(pkg_name);
    let spec_name = format!("{}.spec", pkg_name);

    move_path(&pkg_dir.join(&spec_name), &specs_dir.join(&spec_name))?;
    move_dir_contents(&pkg_dir, &sources_dir)?;

    println!("Building package {} ...", pkg_name);
    let spec_in_chroot = format!("/root/rpmbuild/SPECS/{}", spec_name);
    let inv = Invocation::new("rpmbuild", &["-ba", &spec_in_chroot]);
    let code = runner.run_in_root(chroot_root, &inv)?;
    enforce(policy, &format!("rpmbuild -ba {}", spec_in_chroot), code)?;

    move_dir_contents(&rpms_dir, output_dir)?;
    Ok(())
}

/// Move a file or directory, falling back to copy-and-delete when rename
/// crosses a filesystem boundary.
fn move_path(src: &Path, dest: &Path) -> Result<(), Error> {
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }

    if src.is_dir() {
        copy_tree(src, dest)?;
        fs::remove_dir_all(src).map_err(|source| Error::Filesystem {
            path: src.to_path_buf(),
            source,
        })?;
    } else {
        fs::copy(src, dest).map_err(|source| Error::Filesystem {
            path: src.to_path_buf(),
            source,
        })?;
        fs::remove_file(src).map_err(|source| Error::Filesystem {
            path: src.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Move every entry of `src` into `dest`.
fn move_dir_contents(src: &Path, dest: &Path) -> Result<(), Error> {
    let entries = fs::read_dir(src).map_err(|source| Error::Filesystem {
        path: src.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| Error::Filesystem {
            path: src.to_path_buf(),
            source,
        })?;
        move_path(&entry.path(), &dest.join(entry.file_name()))?;
    }
    Ok(())
}

fn copy_tree(src: &Path, dest: &Path) -> Result<(), Error> {
    fs::create_dir_all(dest).map_err(|source| Error::Filesystem {
        path: dest.to_path_buf(),
        source,
    })?;
    let entries = fs::read_dir(src).map_err(|source| Error::Filesystem {
        path: src.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| Error::Filesystem {
            path: src.to_path_buf(),
            source,
        })?;
        let target = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| Error::Filesystem {
                path: entry.path(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use crate::toolchain::RPMBUILD_DIRS;
    use tempfile::TempDir;

    fn stage_fixture() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let work_dir = temp.path().join("work");
        let chroot_root = work_dir.join("chroot");
        for dir in RPMBUILD_DIRS {
            fs::create_dir_all(chroot_root.join("root/rpmbuild").join(dir)).unwrap();
        }
        (temp, work_dir, chroot_root)
    }

    #[test]
    fn stages_spec_and_sources_then_collects_rpms() {
        let (temp, work_dir, chroot_root) = stage_fixture();
        let output_dir = temp.path().join("out");
        fs::create_dir_all(&output_dir).unwrap();

        let pkg_dir = work_dir.join("pkgname");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(pkg_dir.join("pkgname.spec"), "Name: pkgname\n").unwrap();
        fs::write(pkg_dir.join("pkgname-1.0.tar.gz"), "tarball").unwrap();

        // Pre-place an artifact as if rpmbuild had produced it.
        let arch_dir = chroot_root.join("root/rpmbuild/RPMS/x86_64");
        fs::create_dir_all(&arch_dir).unwrap();
        fs::write(arch_dir.join("pkgname-1.0-1.x86_64.rpm"), "rpm").unwrap();

        let runner = RecordingRunner::new();
        build_package(
            &runner,
            ToolPolicy::Permissive,
            &work_dir,
            "pkgname",
            &chroot_root,
            &output_dir,
        )
        .unwrap();

        let rpmbuild_root = chroot_root.join("root/rpmbuild");
        assert!(rpmbuild_root.join("SPECS/pkgname.spec").is_file());
        assert!(rpmbuild_root
            .join("SOURCES/pkgname-1.0.tar.gz")
            .is_file());
        assert!(output_dir
            .join("x86_64/pkgname-1.0-1.x86_64.rpm")
            .is_file());

        assert_eq!(
            runner.call_log(),
            vec![
                format!("enter-chroot {}", chroot_root.display()),
                "rpmbuild -ba /root/rpmbuild/SPECS/pkgname.spec".to_string(),
                "exit-chroot".to_string(),
            ]
        );
    }

    #[test]
    fn move_path_moves_a_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dest = temp.path().join("b.txt");
        fs::write(&src, "contents").unwrap();

        move_path(&src, &dest).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "contents");
    }

    #[test]
    fn move_dir_contents_moves_nested_entries() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("top.txt"), "t").unwrap();
        fs::write(src.join("sub/inner.txt"), "i").unwrap();

        move_dir_contents(&src, &dest).unwrap();

        assert!(dest.join("top.txt").is_file());
        assert!(dest.join("sub/inner.txt").is_file());
        assert!(fs::read_dir(&src).unwrap().next().is_none());
    }
}
