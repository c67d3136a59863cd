//! Scoped chroot entry with guaranteed escape.
//!
//! [`ChrootGuard::enter`] saves descriptors for the real root and the current
//! working directory before calling `chroot(2)`. Drop walks back out through
//! the saved root descriptor, so the original root and cwd are restored on
//! every exit path, including a failed or panicking build.
//!
//! Requires CAP_SYS_CHROOT (in practice: root), like any chroot user.

use anyhow::{Context, Result};
use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

pub struct ChrootGuard {
    old_root: OwnedFd,
    old_cwd: OwnedFd,
}

impl ChrootGuard {
    /// Enter `new_root` as the process root, with the working directory set
    /// to the new `/`.
    pub fn enter(new_root: &Path) -> Result<Self> {
        let old_root = open_dir(Path::new("/"))?;
        let old_cwd = open_dir(Path::new("."))?;

        let c_root = CString::new(new_root.as_os_str().as_bytes())
            .with_context(|| format!("chroot path '{}' contains a NUL byte", new_root.display()))?;

        // SAFETY: c_root is a valid NUL-terminated path for the lifetime of
        // the calls.
        unsafe {
            if libc::chroot(c_root.as_ptr()) != 0 {
                return Err(io::Error::last_os_error())
                    .with_context(|| format!("entering chroot '{}'", new_root.display()));
            }
            if libc::chdir(b"/\0".as_ptr().cast()) != 0 {
                return Err(io::Error::last_os_error())
                    .with_context(|| format!("chdir to / inside chroot '{}'", new_root.display()));
            }
        }

        Ok(Self { old_root, old_cwd })
    }
}

impl Drop for ChrootGuard {
    fn drop(&mut self) {
        // Escape: move the cwd to the saved real root, re-root there, then
        // restore the saved working directory. Errors here are unrecoverable
        // and ignored; the process is about to either continue on the real
        // root or exit.
        unsafe {
            let _ = libc::fchdir(self.old_root.as_raw_fd());
            let _ = libc::chroot(b".\0".as_ptr().cast());
            let _ = libc::fchdir(self.old_cwd.as_raw_fd());
        }
    }
}

fn open_dir(path: &Path) -> Result<OwnedFd> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .with_context(|| format!("path '{}' contains a NUL byte", path.display()))?;
    // SAFETY: c_path is valid for the call; the returned fd is owned by us.
    let fd = unsafe {
        libc::open(
            c_path.as_ptr(),
            libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC,
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error())
            .with_context(|| format!("opening directory '{}'", path.display()));
    }
    // SAFETY: fd was just returned by open() and is not owned elsewhere.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_nonexistent_root_fails() {
        let result = ChrootGuard::enter(Path::new("/nonexistent/chroot/root"));
        assert!(result.is_err());
    }

    #[test]
    fn enter_without_privilege_fails() {
        // chroot(2) needs CAP_SYS_CHROOT; when running unprivileged the
        // guard must refuse cleanly rather than half-enter.
        let euid = unsafe { libc::geteuid() };
        if euid == 0 {
            return;
        }
        let dir = tempfile::TempDir::new().unwrap();
        assert!(ChrootGuard::enter(dir.path()).is_err());
    }
}
