use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ufs::Geometry;

#[derive(Parser)]
#[command(version, about = "Build and inspect ufs disk images")]
pub struct Cli {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// 镜像的几何参数，必须与制作镜像时一致
#[derive(Args)]
pub struct GeometryArgs {
    /// Block size in bytes
    #[arg(long, global = true, default_value_t = 4096)]
    pub block_size: usize,

    /// Direct block pointers per inode
    #[arg(long, global = true, default_value_t = 30)]
    pub direct_ptrs: usize,
}

impl GeometryArgs {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.block_size, self.direct_ptrs)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a fresh image holding only the root directory
    Mkfs {
        image: PathBuf,

        /// Number of inodes
        #[arg(long, default_value_t = 32)]
        inodes: u32,

        /// Number of data blocks
        #[arg(long, default_value_t = 32)]
        data_blocks: u32,
    },

    /// Print the super block and both bitmaps
    Bits { image: PathBuf },

    /// Print the blocks and contents of a regular file
    Cat { image: PathBuf, inode: u32 },

    /// List a directory, or a single file, by absolute path
    Ls { image: PathBuf, path: String },

    /// Overwrite a regular file with the contents of a host file
    Cp {
        image: PathBuf,
        src: PathBuf,
        inode: u32,
    },
}
