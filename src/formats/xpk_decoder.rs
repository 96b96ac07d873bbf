//! Byte-code interpreter that paints one XPK tile.
//!
//! Each byte is, depending on the decoder state, a literal pixel (direct
//! mode), a colour to repeat (run-length mode) or an instruction. An
//! instruction's high nibble is the opcode and its low nibble a small
//! argument; for some opcodes a zero argument means a big-endian `u16`
//! follows. Opcodes named `Big*` add 16 to the argument.
//!
//! Loops are expressed with repeat markers: a push records the position
//! just after the instruction, and each close either jumps back there or
//! pops the marker once its count runs out.

use std::io::{Read, Seek};

use log::{debug, trace, warn};

use crate::binary_utils::{read_u16_be, read_u8, seek_to};
use crate::error::{Error, Result};
use crate::formats::xpk::{XpkEntry, XPK_TILED_HEIGHT, XPK_TILED_WIDTH};
use crate::graphics::canvas::IndexedCanvas;

pub const MAX_REPEAT_MARKERS: usize = 4;
/// Ends the tile, but only once every repeat marker is closed
pub const EOF_SENTINEL: u8 = 0x41;

const RLE_NEXT: u8 = 0x00;
const REPEAT_END: u8 = 0x01;
const LINE_REPEAT_END: u8 = 0x81;
const BIG_ARGUMENT_BASE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Repeat = 0x0,
    BigRepeat = 0x1,
    XSkip = 0x2,
    BigXSkip = 0x3,
    Rle = 0x4,
    BigRle = 0x5,
    Direct = 0x6,
    BigDirect = 0x7,
    LineRepeat = 0x8,
    BigLineRepeat = 0x9,
    SetXNewLine = 0xA,
    BigSetXNewLine = 0xB,
    RleNewLine = 0xC,
    BigRleNewLine = 0xD,
    DirectNewLine = 0xE,
    BigDirectNewLine = 0xF,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    /// Takes the high nibble of an instruction byte
    fn try_from(nibble: u8) -> std::result::Result<Self, u8> {
        Ok(match nibble {
            0x0 => Opcode::Repeat,
            0x1 => Opcode::BigRepeat,
            0x2 => Opcode::XSkip,
            0x3 => Opcode::BigXSkip,
            0x4 => Opcode::Rle,
            0x5 => Opcode::BigRle,
            0x6 => Opcode::Direct,
            0x7 => Opcode::BigDirect,
            0x8 => Opcode::LineRepeat,
            0x9 => Opcode::BigLineRepeat,
            0xA => Opcode::SetXNewLine,
            0xB => Opcode::BigSetXNewLine,
            0xC => Opcode::RleNewLine,
            0xD => Opcode::BigRleNewLine,
            0xE => Opcode::DirectNewLine,
            0xF => Opcode::BigDirectNewLine,
            other => return Err(other),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatMarker {
    pub is_line_repeat: bool,
    pub remaining_reps: u32,
    /// Stream position to jump back to
    pub return_position: u64,
}

/// Stack of open repeat markers, never deeper than [`MAX_REPEAT_MARKERS`]
#[derive(Debug, Default)]
pub struct RepeatStack {
    markers: Vec<RepeatMarker>,
}

impl RepeatStack {
    pub fn push(&mut self, marker: RepeatMarker) -> Result<()> {
        if self.markers.len() >= MAX_REPEAT_MARKERS {
            return Err(Error::RepeatStackOverflow {
                depth: MAX_REPEAT_MARKERS,
            });
        }
        self.markers.push(marker);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<RepeatMarker> {
        self.markers.pop()
    }

    pub fn top_mut(&mut self) -> Option<&mut RepeatMarker> {
        self.markers.last_mut()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Decodes a single tile. State is reset at the start of every
/// [`XpkDecoder::decode`] call.
#[derive(Debug, Default)]
pub struct XpkDecoder {
    n_reps: u32,
    direct_counter: u32,
    cur_x: u32,
    cur_y: u32,
    markers: RepeatStack,
    clipped_writes: u64,
}

impl XpkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `entry` from `reader`, which must be the whole XPK stream:
    /// the entry's offset is absolute within it.
    ///
    /// Pixels landing outside the tile are dropped and counted. Tiles larger
    /// than a 640x480 screen are rejected before anything is allocated.
    pub fn decode<R: Read + Seek>(
        &mut self,
        entry: &XpkEntry,
        reader: &mut R,
    ) -> Result<IndexedCanvas> {
        *self = Self::default();

        let (width, height) = (u32::from(entry.width()), u32::from(entry.height()));
        if width > XPK_TILED_WIDTH || height > XPK_TILED_HEIGHT {
            return Err(Error::InvalidRange);
        }

        let mut canvas = IndexedCanvas::new(width, height);
        seek_to(reader, u64::from(entry.offset()))?;

        loop {
            let byte = read_u8(reader)?;

            if self.direct_counter > 0 {
                self.put_pixel(&mut canvas, byte);
                self.direct_counter -= 1;
            } else if self.n_reps > 0 {
                for _ in 0..self.n_reps {
                    self.put_pixel(&mut canvas, byte);
                }
                self.n_reps = 0;
            } else if byte == EOF_SENTINEL && self.markers.is_empty() {
                break;
            } else {
                self.execute(byte, reader)?;
            }
        }

        if self.clipped_writes > 0 {
            warn!(
                "{}: {} pixel writes fell outside the tile and were dropped",
                entry, self.clipped_writes
            );
        }

        Ok(canvas)
    }

    pub fn cursor(&self) -> (u32, u32) {
        (self.cur_x, self.cur_y)
    }

    /// Pixel writes dropped during the last decode
    pub fn clipped_writes(&self) -> u64 {
        self.clipped_writes
    }

    fn execute<R: Read + Seek>(&mut self, byte: u8, reader: &mut R) -> Result<()> {
        // Loop markers return to just after their instruction byte
        let position = reader.stream_position()?;
        let argument = u32::from(byte & 0x0F);
        let opcode = Opcode::try_from(byte >> 4).map_err(|_| Error::UnknownOpcode {
            byte,
            position: position.saturating_sub(1),
        })?;
        trace!("0x{:02X} {:?} at 0x{:X}", byte, opcode, position - 1);

        match opcode {
            Opcode::Repeat => match byte {
                RLE_NEXT => self.n_reps = u32::from(read_u8(reader)?),
                REPEAT_END => self.close_repeat(reader, false)?,
                _ => self.push_repeat(false, argument, position)?,
            },
            Opcode::BigRepeat => {
                self.push_repeat(false, BIG_ARGUMENT_BASE + argument, position)?
            }
            Opcode::XSkip => {
                let skip = argument_or_u16(argument, reader)?;
                self.cur_x = self.cur_x.saturating_add(skip);
            }
            Opcode::BigXSkip => {
                self.cur_x = self.cur_x.saturating_add(BIG_ARGUMENT_BASE + argument)
            }
            Opcode::Rle => self.n_reps = argument,
            Opcode::BigRle => self.n_reps = BIG_ARGUMENT_BASE + argument,
            Opcode::Direct => self.direct_counter = argument_or_u16(argument, reader)?,
            Opcode::BigDirect => self.direct_counter = BIG_ARGUMENT_BASE + argument,
            Opcode::LineRepeat => {
                if byte == LINE_REPEAT_END {
                    self.close_repeat(reader, true)?;
                } else {
                    self.push_repeat(true, argument, position)?;
                }
                self.new_line();
            }
            Opcode::BigLineRepeat => {
                self.push_repeat(true, BIG_ARGUMENT_BASE + argument, position)?;
                self.new_line();
            }
            // X is set, not reset, by the line change
            Opcode::SetXNewLine => {
                self.cur_x = argument_or_u16(argument, reader)?;
                self.cur_y += 1;
            }
            Opcode::BigSetXNewLine => {
                self.cur_x = BIG_ARGUMENT_BASE + argument;
                self.cur_y += 1;
            }
            Opcode::RleNewLine => {
                self.n_reps = argument;
                self.new_line();
            }
            Opcode::BigRleNewLine => {
                self.n_reps = BIG_ARGUMENT_BASE + argument;
                self.new_line();
            }
            Opcode::DirectNewLine => {
                self.direct_counter = argument_or_u16(argument, reader)?;
                self.new_line();
            }
            Opcode::BigDirectNewLine => {
                self.direct_counter = BIG_ARGUMENT_BASE + argument;
                self.new_line();
            }
        }

        Ok(())
    }

    fn push_repeat(&mut self, is_line_repeat: bool, reps: u32, position: u64) -> Result<()> {
        self.markers.push(RepeatMarker {
            is_line_repeat,
            remaining_reps: reps,
            return_position: position,
        })
    }

    /// Count down the innermost marker, jumping back while it has reps left
    fn close_repeat<R: Read + Seek>(&mut self, reader: &mut R, is_line_repeat: bool) -> Result<()> {
        let position = reader.stream_position()?;
        let Some(marker) = self.markers.top_mut() else {
            return Err(Error::RepeatStackUnderflow { position });
        };

        if marker.is_line_repeat != is_line_repeat {
            debug!(
                "Repeat end at 0x{:X} closes a marker of the other kind",
                position
            );
        }

        marker.remaining_reps = marker.remaining_reps.saturating_sub(1);
        if marker.remaining_reps > 0 {
            let target = marker.return_position;
            seek_to(reader, target)?;
        } else {
            self.markers.pop();
        }

        Ok(())
    }

    fn put_pixel(&mut self, canvas: &mut IndexedCanvas, colour: u8) {
        if !canvas.set_pixel(self.cur_x, self.cur_y, colour) {
            self.clipped_writes += 1;
        }
        self.cur_x = self.cur_x.saturating_add(1);
    }

    fn new_line(&mut self) {
        self.cur_x = 0;
        self.cur_y += 1;
    }
}

fn argument_or_u16<R: Read>(argument: u32, reader: &mut R) -> Result<u32> {
    if argument != 0 {
        Ok(argument)
    } else {
        Ok(u32::from(read_u16_be(reader)?))
    }
}
