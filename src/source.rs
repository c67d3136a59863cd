//! Source checkout and package identity.

use anyhow::Result;
use std::path::Path;

use crate::process::{enforce, Invocation, Runner, ToolPolicy};

/// Derive the package name from a git URL: last `/`-separated segment, up to
/// the first dot. `https://host/org/bar.git` and `git@host:org/bar` both
/// yield `bar`.
///
/// URLs without a recognizable trailing extension pass through unchanged;
/// nothing validates that the result matches what the repository actually
/// contains.
pub fn parse_pkg_name(url: &str) -> String {
    let segment = url.rsplit('/').next().unwrap_or(url);
    segment.split('.').next().unwrap_or(segment).to_string()
}

/// Clone `url` into `dest_dir`, optionally at a named branch.
///
/// The checkout lands at `dest_dir/<repo dir>` exactly as git names it; the
/// clone runs with `dest_dir` as the child's working directory.
pub fn clone_source(
    runner: &dyn Runner,
    policy: ToolPolicy,
    url: &str,
    dest_dir: &Path,
    pkg_name: &str,
    branch: Option<&str>,
) -> Result<()> {
    println!("Fetching: {} ...", pkg_name);

    let mut args = vec!["clone".to_string()];
    if let Some(branch) = branch {
        args.push("-b".to_string());
        args.push(branch.to_string());
    }
    args.push(url.to_string());

    let inv = Invocation {
        program: "git".to_string(),
        args,
        cwd: Some(dest_dir.to_path_buf()),
    };
    let code = runner.run(&inv)?;
    enforce(policy, &format!("git clone {}", url), code)
}
