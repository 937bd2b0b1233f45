use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use oufs::{FileBlockDevice, OuFileSystem};
use oufs_tools::{run, Environment};

/// Create (or wipe) the virtual disk and format it
#[derive(Parser)]
#[command(name = "zformat")]
struct Cli {
    #[command(flatten)]
    env: Environment,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run("zformat", || {
        let dev = Arc::new(FileBlockDevice::create(&cli.env.disk)?);
        OuFileSystem::format(dev)?;
        Ok(())
    })
}
