use std::process::ExitCode;

use clap::Parser;
use oufs_tools::{run, Environment};

/// Remove an empty directory
#[derive(Parser)]
#[command(name = "zrmdir")]
struct Cli {
    #[command(flatten)]
    env: Environment,

    /// Directory to remove
    path: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run("zrmdir", || cli.env.open()?.rmdir(&cli.env.cwd, &cli.path))
}
