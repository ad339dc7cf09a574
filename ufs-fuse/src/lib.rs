mod block_file;
pub mod commands;

pub use self::block_file::BlockFile;
pub use self::commands::{Result, ToolError};
