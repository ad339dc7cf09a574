mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use ufs_fuse::commands;

use self::cli::{Cli, Command};

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("{err:?}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ufs_fuse::Result<()> {
    let geometry = cli.geometry.geometry();
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Mkfs {
            image,
            inodes,
            data_blocks,
        } => {
            commands::create_image(&image, geometry, inodes, data_blocks)?;
        }
        Command::Bits { image } => {
            let fs = commands::open_image(&image, geometry)?;
            commands::bits(&fs, &mut out)?;
        }
        Command::Cat { image, inode } => {
            let fs = commands::open_image(&image, geometry)?;
            commands::cat(&fs, inode, &mut out)?;
        }
        Command::Ls { image, path } => {
            let fs = commands::open_image(&image, geometry)?;
            commands::ls(&fs, &path, &mut out)?;
        }
        Command::Cp { image, src, inode } => {
            let fs = commands::open_image(&image, geometry)?;
            commands::cp(&fs, &src, inode)?;
        }
    }

    out.flush()?;
    Ok(())
}
