use clap::Parser;
use trendstop::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
