//! CLI entrypoint for the jobwire client.
//!
//! The binary delegates to [`jobwire_cli::run`], which loads configuration,
//! parses the subcommand, and talks to the configured server sockets.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    jobwire_cli::run(std::env::args_os(), io::stdin().lock(), &mut stdout, &mut stderr)
}
