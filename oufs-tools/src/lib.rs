use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use log::debug;
use oufs::{FileBlockDevice, OuFileSystem};

// 虚拟磁盘和工作目录，来自命令行参数或者环境变量
#[derive(Args, Debug)]
pub struct Environment {
    /// Virtual disk image
    #[arg(long, env = "ZDISK", default_value = "vdisk1")]
    pub disk: PathBuf,

    /// Working directory inside the virtual disk
    #[arg(long, env = "ZPWD", default_value = "/")]
    pub cwd: String,
}

impl Environment {
    // 打开已经格式化的虚拟磁盘
    pub fn open(&self) -> oufs::Result<OuFileSystem> {
        debug!("opening {} with cwd {}", self.disk.display(), self.cwd);
        let dev = Arc::new(FileBlockDevice::open(&self.disk)?);
        OuFileSystem::open(dev)
    }
}

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

// 执行一个命令，失败时向 stderr 输出一行错误并返回非零
pub fn run<F>(tool: &str, f: F) -> ExitCode
where
    F: FnOnce() -> oufs::Result<()>,
{
    init_logger();
    match f() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", tool, e);
            ExitCode::FAILURE
        }
    }
}

// 按高位在前输出一个字节
pub fn binary(byte: u8) -> String {
    format!("{:08b}", byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        env: Environment,
    }

    #[test]
    fn test_explicit_arguments() {
        let cli = Cli::parse_from(["ztest", "--disk", "img", "--cwd", "/a"]);
        assert_eq!(cli.env.disk, PathBuf::from("img"));
        assert_eq!(cli.env.cwd, "/a");
    }

    #[test]
    fn test_binary() {
        assert_eq!(binary(0x03), "00000011");
        assert_eq!(binary(0xFF), "11111111");
    }
}
