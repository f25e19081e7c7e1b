//! cloudstore CLI entry point
//!
//! All logic is delegated to the CLI module; main only maps failure to a
//! non-zero exit code.

use cloudstore::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
