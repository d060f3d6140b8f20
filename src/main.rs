//! embulk-plugins - package Java plugins for Embulk

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = embulk_plugins::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
