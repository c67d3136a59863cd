//! BuildRequires discovery and installation.
//!
//! Queries the package's spec file for its declared build dependencies and
//! installs each into the chroot root before the build runs.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::process::{enforce, Invocation, Runner, ToolPolicy};
use crate::toolchain;

/// Locates a package's spec file inside the working directory.
///
/// A trait so alternate discovery strategies (searching the tree, reading a
/// manifest) can be added without touching the pipeline.
pub trait SpecLocator {
    fn locate(&self, work_dir: &Path, pkg_name: &str) -> PathBuf;
}

/// The one layout supported today: `<work_dir>/<pkg>/<pkg>.spec`.
// TODO: handle spec files whose name differs from the repository name.
pub struct ConventionalLayout;

impl SpecLocator for ConventionalLayout {
    fn locate(&self, work_dir: &Path, pkg_name: &str) -> PathBuf {
        work_dir.join(pkg_name).join(format!("{}.spec", pkg_name))
    }
}

/// Query the spec file for its BuildRequires via `rpmspec`.
pub fn query_build_requires(
    runner: &dyn Runner,
    policy: ToolPolicy,
    spec_file: &Path,
) -> Result<Vec<String>> {
    println!("Parsing BuildRequires from {} ...", spec_file.display());
    let spec = spec_file.to_string_lossy();
    let inv = Invocation::new("rpmspec", &["-q", "--buildrequires", &spec]);
    let (code, stdout) = runner.output(&inv)?;
    enforce(policy, &format!("rpmspec -q --buildrequires {}", spec), code)?;
    Ok(parse_build_requires(&stdout))
}

/// One dependency per line; keep the bare package name, drop version
/// qualifiers (`make >= 4.0` becomes `make`).
// TODO: honor version constraints instead of discarding them.
fn parse_build_requires(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Locate the spec file, query its BuildRequires, and install each one into
/// the chroot root.
pub fn resolve_and_install(
    runner: &dyn Runner,
    policy: ToolPolicy,
    locator: &dyn SpecLocator,
    work_dir: &Path,
    pkg_name: &str,
    chroot_root: &Path,
) -> Result<()> {
    let spec_file = locator.locate(work_dir, pkg_name);
    let requires = query_build_requires(runner, policy, &spec_file)?;

    println!(
        "Installing {} BuildRequires of {} ...",
        requires.len(),
        pkg_name
    );
    for pkg in &requires {
        println!("Installing: {} ...", pkg);
        toolchain::install_into_root(runner, policy, chroot_root, pkg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;

    #[test]
    fn conventional_layout_joins_pkg_and_spec() {
        let path = ConventionalLayout.locate(Path::new("/tmp/w"), "pkgname");
        assert_eq!(path, PathBuf::from("/tmp/w/pkgname/pkgname.spec"));
    }

    #[test]
    fn parser_keeps_first_token_per_line() {
        let stdout = "gcc\nmake >= 4.0\n\npkgconfig(zlib)\n";
        assert_eq!(
            parse_build_requires(stdout),
            vec!["gcc", "make", "pkgconfig(zlib)"]
        );
    }

    #[test]
    fn parser_yields_nothing_for_empty_output() {
        assert!(parse_build_requires("").is_empty());
        assert!(parse_build_requires("\n\n").is_empty());
    }

    #[test]
    fn resolve_queries_then_installs_each() {
        let runner = RecordingRunner::with_stdout("rpmspec", "gcc\nmake >= 4.0\n");

        resolve_and_install(
            &runner,
            ToolPolicy::Permissive,
            &ConventionalLayout,
            Path::new("/tmp/w"),
            "pkgname",
            Path::new("/tmp/w/chroot"),
        )
        .unwrap();

        assert_eq!(
            runner.call_log(),
            vec![
                "rpmspec -q --buildrequires /tmp/w/pkgname/pkgname.spec".to_string(),
                "dnf install -y --installroot /tmp/w/chroot gcc".to_string(),
                "dnf install -y --installroot /tmp/w/chroot make".to_string(),
            ]
        );
    }
}
