use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match jobwired::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr().lock(), "jobwired: {error}");
            ExitCode::FAILURE
        }
    }
}
