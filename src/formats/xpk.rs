//! # XPK tile containers
//!
//! All fields are big-endian.
//!
//! ```text
//! [0x00]  magic (u32, 0xA57E7001)
//! [0x04]  sub-magic (u16, 0xC002)
//! [0x06]  entry count (u16)
//! [0x08]  reserved (8 bytes)
//! [0x10]  entry count x { reserved (8 bytes), x, y, width, height (u16 each) }
//!         entry count x relative offset (u32)
//! ```
//!
//! Tile offsets are relative to the start of the offset table. Each tile's
//! pixels are a byte-code stream, see [`crate::formats::xpk_decoder`].

use std::fmt;
use std::io::{Read, Seek};

use log::debug;
use serde::Serialize;

use crate::binary_utils::{read_u16_be, read_u32_be, skip};
use crate::error::{Error, Result};
use crate::formats::xpk_decoder::XpkDecoder;
use crate::graphics::canvas::IndexedCanvas;

pub const XPK_MAGIC: u32 = 0xA57E_7001;
pub const XPK_SUBMAGIC: u16 = 0xC002;
pub const XPK_RESERVED_LEN: u64 = 8;
pub const XPK_ENTRY_RESERVED_LEN: u64 = 8;

/// Full-screen images are an 8x8 grid of 80x60 tiles
pub const XPK_TILED_TILE_COUNT: usize = 64;
pub const XPK_TILED_TILE_WIDTH: u16 = 80;
pub const XPK_TILED_TILE_HEIGHT: u16 = 60;
pub const XPK_TILED_COLUMNS: u32 = 8;
pub const XPK_TILED_WIDTH: u32 = 640;
pub const XPK_TILED_HEIGHT: u32 = 480;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct XpkEntry {
    width: u16,
    height: u16,
    x: u16,
    y: u16,
    /// Absolute offset of the tile's byte code in the XPK stream
    offset: u32,
}

impl XpkEntry {
    pub fn new(width: u16, height: u16, x: u16, y: u16, offset: u32) -> Self {
        XpkEntry {
            width,
            height,
            x,
            y,
            offset,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl fmt::Display for XpkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<XPKEntry {}x{} @ {},{}>",
            self.width, self.height, self.x, self.y
        )
    }
}

/// The parsed tile table of an XPK container
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Xpk {
    entries: Vec<XpkEntry>,
}

impl Xpk {
    /// Parse the tile table. `reader` must be positioned at the magic, and
    /// tile offsets are resolved against positions in that same stream.
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let magic = read_u32_be(reader)?;
        if magic != XPK_MAGIC {
            return Err(Error::BadMagic {
                format: "XPK",
                found: magic,
            });
        }

        let submagic = read_u16_be(reader)?;
        if submagic != XPK_SUBMAGIC {
            return Err(Error::BadMagic {
                format: "XPK",
                found: u32::from(submagic),
            });
        }

        let entry_count = read_u16_be(reader)?;
        skip(reader, XPK_RESERVED_LEN)?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            skip(reader, XPK_ENTRY_RESERVED_LEN)?;

            // On disk the position comes before the size
            let x = read_u16_be(reader)?;
            let y = read_u16_be(reader)?;
            let width = read_u16_be(reader)?;
            let height = read_u16_be(reader)?;

            entries.push(XpkEntry::new(width, height, x, y, 0));
        }

        let offset_table_base = reader.stream_position()?;
        for entry in entries.iter_mut() {
            let relative = read_u32_be(reader)?;
            let absolute = offset_table_base + u64::from(relative);
            entry.offset = u32::try_from(absolute).map_err(|_| Error::InvalidRange)?;
        }

        debug!("XPK has {} entries", entry_count);
        Ok(Xpk { entries })
    }

    pub fn entry_count(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn entries(&self) -> &[XpkEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Result<&XpkEntry> {
        self.entries.get(index).ok_or(Error::TileIndex {
            index,
            count: self.entries.len(),
        })
    }

    /// True when the tiles form a full 640x480 screen
    pub fn is_tiled_mode_ok(&self) -> bool {
        self.entries.len() == XPK_TILED_TILE_COUNT
            && self.entries.iter().all(|e| {
                e.width == XPK_TILED_TILE_WIDTH && e.height == XPK_TILED_TILE_HEIGHT
            })
    }
}

/// An XPK table together with the stream its tiles are decoded from
pub struct XpkReader<R> {
    xpk: Xpk,
    stream: R,
}

impl<R: Read + Seek> XpkReader<R> {
    /// Parse the tile table at the current position of `stream`
    pub fn new(mut stream: R) -> Result<Self> {
        let xpk = Xpk::parse(&mut stream)?;
        Ok(XpkReader { xpk, stream })
    }

    pub fn xpk(&self) -> &Xpk {
        &self.xpk
    }

    pub fn decode_entry(&mut self, index: usize) -> Result<IndexedCanvas> {
        let entry = *self.xpk.entry(index)?;
        XpkDecoder::new().decode(&entry, &mut self.stream)
    }

    /// Decode all 64 tiles into one 640x480 canvas. Tiles are placed by
    /// their index in the table, row by row, not by their stored x/y.
    pub fn decode_tiled_mode(&mut self) -> Result<IndexedCanvas> {
        if !self.xpk.is_tiled_mode_ok() {
            return Err(Error::NotTiled);
        }

        let mut canvas = IndexedCanvas::new(XPK_TILED_WIDTH, XPK_TILED_HEIGHT);
        let tile_w = u32::from(XPK_TILED_TILE_WIDTH);
        let tile_h = u32::from(XPK_TILED_TILE_HEIGHT);

        for index in 0..XPK_TILED_TILE_COUNT {
            let tile = self.decode_entry(index)?;
            let column = index as u32 % XPK_TILED_COLUMNS;
            let row = index as u32 / XPK_TILED_COLUMNS;
            canvas.blit(&tile, column * tile_w, row * tile_h);
        }

        Ok(canvas)
    }
}
