use std::process::ExitCode;

use clap::Parser;
use oufs_tools::{run, Environment};

/// List a directory, one entry per line, directories end with '/'
#[derive(Parser)]
#[command(name = "zfilez")]
struct Cli {
    #[command(flatten)]
    env: Environment,

    /// Include the . and .. entries
    #[arg(short, long)]
    all: bool,

    /// Directory or file to list, defaults to the working directory
    path: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run("zfilez", || {
        let fs = cli.env.open()?;
        let path = cli.path.as_deref();
        let names = if cli.all {
            fs.list_all(&cli.env.cwd, path)?
        } else {
            fs.list(&cli.env.cwd, path)?
        };
        for name in names {
            println!("{}", name);
        }
        Ok(())
    })
}
