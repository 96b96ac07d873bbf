//! # Colour Look-Up table
//!
//! A 256-entry palette. After two big-endian magic words every entry is an
//! 8-byte record of four big-endian 16-bit fields (index, red, green, blue),
//! of which only the high byte of each channel is kept.

use std::io::Read;

use log::debug;
use serde::Serialize;

use crate::binary_utils::{read_bytes, read_u32_be};
use crate::error::{Error, Result};

pub const CLU_MAGIC_SEED: u32 = 0x0000_0000;
pub const CLU_MAGIC_FLAGS: u32 = 0x8000_00FF;
pub const CLU_COLOUR_COUNT: usize = 256;
pub const CLU_RECORD_LEN: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clu {
    colours: [Rgb; CLU_COLOUR_COUNT],
}

impl Clu {
    /// Parse a palette from a stream already positioned at its first magic word
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        for expected in [CLU_MAGIC_SEED, CLU_MAGIC_FLAGS] {
            let found = read_u32_be(reader)?;
            if found != expected {
                return Err(Error::BadMagic {
                    format: "CLU",
                    found,
                });
            }
        }

        let mut colours = [Rgb::default(); CLU_COLOUR_COUNT];
        for colour in colours.iter_mut() {
            let record = read_bytes(reader, CLU_RECORD_LEN)?;
            *colour = Rgb {
                r: record[2],
                g: record[4],
                b: record[6],
            };
        }

        Ok(Clu { colours })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(&mut &data[..])
    }

    /// Fallback palette mapping index `i` to grey level `i`
    pub fn grayscale() -> Self {
        let mut colours = [Rgb::default(); CLU_COLOUR_COUNT];
        for (i, colour) in colours.iter_mut().enumerate() {
            *colour = Rgb::new(i as u8, i as u8, i as u8);
        }
        Clu { colours }
    }

    pub fn colour_at(&self, index: u8) -> Rgb {
        self.colours[index as usize]
    }

    pub fn colours(&self) -> &[Rgb; CLU_COLOUR_COUNT] {
        &self.colours
    }

    pub fn dump(&self) {
        for (i, c) in self.colours.iter().enumerate() {
            debug!("CLU[{}] = <{},{},{}>", i, c.r, c.g, c.b);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(8 + CLU_COLOUR_COUNT * CLU_RECORD_LEN);
        output.extend_from_slice(&CLU_MAGIC_SEED.to_be_bytes());
        output.extend_from_slice(&CLU_MAGIC_FLAGS.to_be_bytes());

        for (i, c) in self.colours.iter().enumerate() {
            output.extend_from_slice(&(i as u16).to_be_bytes());
            // 8-bit channels widened the way 16-bit CLUTs store them
            output.extend_from_slice(&[c.r, c.r, c.g, c.g, c.b, c.b]);
        }

        output
    }
}

impl From<[Rgb; CLU_COLOUR_COUNT]> for Clu {
    fn from(colours: [Rgb; CLU_COLOUR_COUNT]) -> Self {
        Clu { colours }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Clu {
        let mut colours = [Rgb::default(); CLU_COLOUR_COUNT];
        for (i, colour) in colours.iter_mut().enumerate() {
            *colour = Rgb::new(i as u8, 255 - i as u8, (i as u8).wrapping_mul(3));
        }
        Clu::from(colours)
    }

    #[test]
    fn parses_interleaved_channels() {
        let mut data = Vec::new();
        data.extend_from_slice(&CLU_MAGIC_SEED.to_be_bytes());
        data.extend_from_slice(&CLU_MAGIC_FLAGS.to_be_bytes());
        for i in 0..CLU_COLOUR_COUNT {
            data.extend_from_slice(&[0x00, i as u8, 0x11, 0xFF, 0x22, 0xEE, 0x33, 0xDD]);
        }

        let clu = Clu::from_bytes(&data).unwrap();
        assert_eq!(clu.colour_at(0), Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(clu.colour_at(255), Rgb::new(0x11, 0x22, 0x33));
    }

    #[test]
    fn written_palette_reads_back() {
        let clu = ramp();
        let parsed = Clu::from_bytes(&clu.to_bytes()).unwrap();
        assert_eq!(parsed, clu);
        assert_eq!(parsed.colour_at(10), Rgb::new(10, 245, 30));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = ramp().to_bytes();
        data[7] = 0xFE;
        match Clu::from_bytes(&data) {
            Err(Error::BadMagic { format, found }) => {
                assert_eq!(format, "CLU");
                assert_eq!(found, 0x8000_00FE);
            }
            other => panic!("expected bad magic, got {:?}", other),
        }
    }

    #[test]
    fn truncated_palette_is_an_error() {
        let data = ramp().to_bytes();
        assert!(matches!(Clu::from_bytes(&data[..100]), Err(Error::Io(_))));
    }
}
