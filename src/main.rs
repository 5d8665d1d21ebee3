use clap::Parser;
use macross::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
