use std::process::ExitCode;

use clap::Parser;
use oufs_tools::{run, Environment};

/// Create a directory
#[derive(Parser)]
#[command(name = "zmkdir")]
struct Cli {
    #[command(flatten)]
    env: Environment,

    /// Directory to create, absolute or relative to the working directory
    path: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run("zmkdir", || {
        let fs = cli.env.open()?;
        fs.mkdir(&cli.env.cwd, &cli.path)?;
        Ok(())
    })
}
