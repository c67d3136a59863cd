//! External command invocation.
//!
//! Arguments are always passed as an argv vector and never routed through a
//! shell, so package names, URLs, and paths need no quoting or escaping.
//!
//! Everything the pipeline shells out to goes through the [`Runner`] trait.
//! [`HostRunner`] spawns real processes; tests substitute a recording mock
//! so the whole build sequence can be exercised without git, dnf, or
//! rpmbuild on the host.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::chroot::ChrootGuard;

/// A single external command: program, argv, optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: None,
        }
    }

    /// Run the command with `dir` as the child's working directory. Nothing
    /// process-global changes; the scope ends when the child exits.
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Human-readable form for status lines and error context.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

/// What to do when an external tool exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPolicy {
    /// Warn and continue. Matches the historical behavior of this pipeline,
    /// where a failed install or build still let later steps run.
    Permissive,
    /// Fail fast on the first non-zero exit.
    Strict,
}

/// Seam between the pipeline and the processes it spawns.
pub trait Runner {
    /// Run to completion, inheriting stdio. Returns the exit code, or
    /// `None` if the child was killed by a signal.
    fn run(&self, inv: &Invocation) -> Result<Option<i32>>;

    /// Run to completion capturing stdout; stderr stays inherited.
    fn output(&self, inv: &Invocation) -> Result<(Option<i32>, String)>;

    /// Run with `root` as the child's filesystem root. The chroot is entered
    /// and left around this one command, on every exit path.
    fn run_in_root(&self, root: &Path, inv: &Invocation) -> Result<Option<i32>>;
}

/// Spawns real processes on the host.
pub struct HostRunner;

impl Runner for HostRunner {
    fn run(&self, inv: &Invocation) -> Result<Option<i32>> {
        let status = inv
            .command()
            .status()
            .with_context(|| format!("spawning '{}'", inv.display()))?;
        Ok(status.code())
    }

    fn output(&self, inv: &Invocation) -> Result<(Option<i32>, String)> {
        let output = inv
            .command()
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("spawning '{}'", inv.display()))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok((output.status.code(), stdout))
    }

    fn run_in_root(&self, root: &Path, inv: &Invocation) -> Result<Option<i32>> {
        let _guard = ChrootGuard::enter(root)?;
        self.run(inv)
    }
}

/// Check if a command resolves on the host PATH.
pub fn exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Apply the failure policy to a finished tool.
pub fn enforce(policy: ToolPolicy, what: &str, code: Option<i32>) -> Result<()> {
    match (code, policy) {
        (Some(0), _) => Ok(()),
        (Some(code), ToolPolicy::Strict) => bail!("{} failed with exit code {}", what, code),
        (None, ToolPolicy::Strict) => bail!("{} was terminated by a signal", what),
        (Some(code), ToolPolicy::Permissive) => {
            eprintln!("warning: {} exited with code {}; continuing", what, code);
            Ok(())
        }
        (None, ToolPolicy::Permissive) => {
            eprintln!("warning: {} was terminated by a signal; continuing", what);
            Ok(())
        }
    }
}
