use clap::Parser;
use pricecast::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
