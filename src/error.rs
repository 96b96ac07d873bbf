use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A magic/signature field did not match the expected value
    #[error("bad {format} magic: found 0x{found:X}")]
    BadMagic { format: &'static str, found: u32 },

    /// More repeat markers open at once than the decoder can track
    #[error("repeat marker stack overflow (max depth {depth})")]
    RepeatStackOverflow { depth: usize },

    /// A repeat-end opcode with no open repeat marker
    #[error("repeat end with no open marker at 0x{position:X}")]
    RepeatStackUnderflow { position: u64 },

    #[error("unknown XPK opcode 0x{byte:02X} at 0x{position:X}")]
    UnknownOpcode { byte: u8, position: u64 },

    #[error("XPK container is not a 8x8 grid of 80x60 tiles")]
    NotTiled,

    #[error("tile index {index} out of range ({count} tiles)")]
    TileIndex { index: usize, count: usize },

    /// An offset would point before the start of the stream, or a tile is
    /// larger than a screen
    #[error("invalid offset or size")]
    InvalidRange,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
