use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use chroot_packager::{preflight, run, BuildRequest, HostRunner};

/// Build an RPM package from a git repository inside a disposable chroot.
#[derive(Parser)]
#[command(name = "chroot-packager", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(long, value_name = "<config_file>")]
    config_file: PathBuf,

    /// Git repository URL of the project to build
    #[arg(long, value_name = "<input_url>")]
    input_url: String,

    /// Git branch of the project to build
    #[arg(long, value_name = "<git_branch>")]
    git_branch: String,

    /// Directory for the built artifacts
    #[arg(long, value_name = "<output_dir>")]
    output_dir: PathBuf,
}

extern "C" fn on_interrupt(_sig: libc::c_int) {
    // Only async-signal-safe calls here: raw write, then _exit. Partially
    // built chroot state is left for the next run's wipe to clear.
    const MSG: &[u8] = b"\nInterrupted! Exiting.\n";
    unsafe {
        libc::write(libc::STDERR_FILENO, MSG.as_ptr().cast(), MSG.len());
        libc::_exit(1);
    }
}

fn install_interrupt_handler() {
    unsafe {
        libc::signal(
            libc::SIGINT,
            on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    }
}

fn main() -> Result<()> {
    install_interrupt_handler();
    let cli = Cli::parse();

    preflight::check_host_tools()?;

    let request = BuildRequest {
        config_file: cli.config_file,
        input_url: cli.input_url,
        git_branch: cli.git_branch,
        output_dir: cli.output_dir,
    };
    run(&request, &HostRunner)
}
