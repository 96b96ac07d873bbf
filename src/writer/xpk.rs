use crate::formats::xpk::{XPK_ENTRY_RESERVED_LEN, XPK_MAGIC, XPK_RESERVED_LEN, XPK_SUBMAGIC};
use crate::formats::xpk_decoder::EOF_SENTINEL;
use crate::graphics::canvas::IndexedCanvas;

const RLE_NEXT: u8 = 0x00;
const DIRECT_U16: u8 = 0x60;
const SET_X_NEW_LINE_U16: u8 = 0xA0;
const MIN_RUN: usize = 3;

/// One tile and its already encoded byte code
#[derive(Clone, Debug)]
pub struct TileSource {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl TileSource {
    pub fn new(x: u16, y: u16, width: u16, height: u16, data: Vec<u8>) -> Self {
        TileSource {
            x,
            y,
            width,
            height,
            data,
        }
    }

    pub fn from_canvas(x: u16, y: u16, canvas: &IndexedCanvas) -> Self {
        Self::new(
            x,
            y,
            canvas.width() as u16,
            canvas.height() as u16,
            encode_tile(canvas),
        )
    }
}

pub struct XpkWriter {
    tiles: Vec<TileSource>,
}

impl XpkWriter {
    pub fn new(tiles: Vec<TileSource>) -> Self {
        XpkWriter { tiles }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let count = self.tiles.len() as u16;

        let mut output = Vec::new();
        output.extend_from_slice(&XPK_MAGIC.to_be_bytes());
        output.extend_from_slice(&XPK_SUBMAGIC.to_be_bytes());
        output.extend_from_slice(&count.to_be_bytes());
        output.extend(std::iter::repeat(0u8).take(XPK_RESERVED_LEN as usize));

        for tile in &self.tiles {
            output.extend(std::iter::repeat(0u8).take(XPK_ENTRY_RESERVED_LEN as usize));
            for field in [tile.x, tile.y, tile.width, tile.height] {
                output.extend_from_slice(&field.to_be_bytes());
            }
        }

        // Offsets count from the start of this table, payloads follow it
        let mut relative = self.tiles.len() as u32 * 4;
        for tile in &self.tiles {
            output.extend_from_slice(&relative.to_be_bytes());
            relative += tile.data.len() as u32;
        }

        for tile in &self.tiles {
            output.extend_from_slice(&tile.data);
        }

        output
    }
}

/// Encode a canvas as byte code: runs of at least three pixels use
/// run-length, everything else direct copies, one row at a time.
pub fn encode_tile(canvas: &IndexedCanvas) -> Vec<u8> {
    let mut output = Vec::new();
    let width = canvas.width() as usize;

    for (row_index, row) in canvas.pixels().chunks(width.max(1)).enumerate() {
        if row_index > 0 {
            output.extend_from_slice(&[SET_X_NEW_LINE_U16, 0x00, 0x00]);
        }

        let mut literals: Vec<u8> = Vec::new();
        let mut i = 0;
        while i < row.len() {
            let colour = row[i];
            let run = row[i..]
                .iter()
                .take(u8::MAX as usize)
                .take_while(|&&p| p == colour)
                .count();

            if run >= MIN_RUN {
                flush_literals(&mut output, &mut literals);
                output.extend_from_slice(&[RLE_NEXT, run as u8, colour]);
                i += run;
            } else {
                literals.push(colour);
                i += 1;
            }
        }
        flush_literals(&mut output, &mut literals);
    }

    output.push(EOF_SENTINEL);
    output
}

fn flush_literals(output: &mut Vec<u8>, literals: &mut Vec<u8>) {
    for chunk in literals.chunks(u16::MAX as usize) {
        output.push(DIRECT_U16);
        output.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
        output.extend_from_slice(chunk);
    }
    literals.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::xpk::XpkEntry;
    use crate::formats::xpk_decoder::XpkDecoder;
    use std::io::Cursor;

    #[test]
    fn encodes_runs_and_literals() {
        let mut canvas = IndexedCanvas::new(5, 1);
        for (x, colour) in [4, 4, 4, 1, 2].into_iter().enumerate() {
            canvas.set_pixel(x as u32, 0, colour);
        }

        assert_eq!(
            encode_tile(&canvas),
            vec![0x00, 3, 4, 0x60, 0x00, 0x02, 1, 2, 0x41]
        );
    }

    #[test]
    fn encoded_tile_decodes_to_same_pixels() {
        let mut canvas = IndexedCanvas::new(7, 3);
        for y in 0..3 {
            for x in 0..7 {
                let colour = if x < 4 { 0x41 } else { (x * y) as u8 };
                canvas.set_pixel(x, y, colour);
            }
        }

        let entry = XpkEntry::new(7, 3, 0, 0, 0);
        let decoded = XpkDecoder::new()
            .decode(&entry, &mut Cursor::new(encode_tile(&canvas)))
            .unwrap();
        assert_eq!(decoded, canvas);
    }
}
