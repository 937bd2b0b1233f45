use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use oufs::layout::{BlockRef, InodeRef};
use oufs::OuFileSystem;
use oufs_tools::{binary, run, Environment};

/// Dump raw on-disk records
#[derive(Parser)]
#[command(name = "zinspect")]
#[command(group(ArgGroup::new("what").required(true).args(["master", "inode", "dir"])))]
struct Cli {
    #[command(flatten)]
    env: Environment,

    /// Print the allocation bitmaps of the master block
    #[arg(short, long)]
    master: bool,

    /// Print one inode record
    #[arg(short, long, value_name = "REF")]
    inode: Option<InodeRef>,

    /// Print a directory block
    #[arg(short, long, value_name = "BLOCK")]
    dir: Option<BlockRef>,
}

fn print_master(fs: &OuFileSystem) -> oufs::Result<()> {
    let master = fs.master_block()?;
    println!("Inode table:");
    for byte in master.inode_allocated.iter() {
        println!("{}", binary(*byte));
    }
    println!("Block table:");
    for byte in master.block_allocated.iter() {
        println!("{}", binary(*byte));
    }
    println!(
        "{} inodes, {} blocks allocated",
        master.allocated_inodes(),
        master.allocated_blocks()
    );
    Ok(())
}

fn print_inode(fs: &OuFileSystem, inode: InodeRef) -> oufs::Result<()> {
    let disk_inode = fs.read_inode(inode)?;
    println!("Inode: {}", inode);
    println!("Type: {:?}", disk_inode.inode_type());
    println!("N references: {}", disk_inode.n_references());
    println!("Size: {}", disk_inode.size());
    let blocks: Vec<String> = disk_inode.data().iter().map(|b| b.to_string()).collect();
    println!("Blocks: {}", blocks.join(" "));
    Ok(())
}

fn print_directory(fs: &OuFileSystem, block: BlockRef) -> oufs::Result<()> {
    let dir = fs.read_directory(block)?;
    println!("Directory at block {}:", block);
    for entry in dir.entries() {
        println!("{:>14}  {}", entry.name(), entry.inode());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run("zinspect", || {
        let fs = cli.env.open()?;
        if cli.master {
            print_master(&fs)?;
        }
        if let Some(inode) = cli.inode {
            print_inode(&fs, inode)?;
        }
        if let Some(block) = cli.dir {
            print_directory(&fs, block)?;
        }
        Ok(())
    })
}
