//! Error kinds for failures local to this process.
//!
//! External tool failures (git, dnf, rpmspec, rpmbuild) are deliberately not
//! represented here; those go through the failure policy in [`crate::process`]
//! and surface as plain `anyhow` errors when the policy is strict.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Config file missing, unreadable, not valid YAML, or a required key
    /// absent at the point it is first needed.
    #[error("config error: {0}")]
    Config(String),

    /// An input path was empty or unset where one is required.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A structured input file could not be parsed.
    #[error("cannot parse '{}': {}", .path.display(), .reason)]
    Parse { path: PathBuf, reason: String },

    /// Directory or file manipulation denied by the OS.
    #[error("filesystem operation failed at '{}'", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
