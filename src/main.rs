//! polyform - build one library into several module conventions

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = polyform::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
