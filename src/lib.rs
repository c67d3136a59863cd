//! Builds an RPM package from a git source repository inside a disposable
//! chroot.
//!
//! The pipeline is strictly linear:
//!
//! ```text
//! config (YAML)
//!     │
//!     ├── workspace: wipe + recreate work dir, output dir, chroot root
//!     │       └── toolchain: copy repo file, dnf --installroot per package,
//!     │                      create rpmbuild staging dirs
//!     ├── source: git clone at the requested branch
//!     ├── buildreq: rpmspec --buildrequires, dnf --installroot per result
//!     └── build: stage spec + sources, rpmbuild -ba inside the chroot,
//!                collect RPMS into the output directory
//! ```
//!
//! Every external tool (git, dnf, rpmspec, rpmbuild) is invoked through the
//! [`process::Runner`] seam, so the whole sequence can be exercised against
//! a recording mock without any of those tools on the host.
//!
//! External tool failures follow a configurable policy: permissive (warn and
//! continue, the historical behavior) or strict (`strict_tools: true` in the
//! config).

pub mod build;
pub mod buildreq;
pub mod chroot;
pub mod config;
pub mod error;
pub mod package_list;
pub mod preflight;
pub mod process;
pub mod run;
pub mod source;
pub mod toolchain;
pub mod workspace;

pub use config::Config;
pub use error::Error;
pub use process::{HostRunner, Runner, ToolPolicy};
pub use run::{run, BuildRequest};
pub use workspace::Workspace;
