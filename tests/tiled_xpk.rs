use std::io::Cursor;

use presage_scraper::formats::xpk::{Xpk, XpkReader, XPK_TILED_TILE_COUNT};
use presage_scraper::graphics::canvas::IndexedCanvas;
use presage_scraper::writer::xpk::{TileSource, XpkWriter};

fn solid(width: u32, height: u32, colour: u8) -> IndexedCanvas {
    let mut canvas = IndexedCanvas::new(width, height);
    for y in 0..height {
        for x in 0..width {
            canvas.set_pixel(x, y, colour);
        }
    }
    canvas
}

fn full_screen() -> Vec<u8> {
    let tiles = (0..XPK_TILED_TILE_COUNT)
        .map(|i| {
            let (column, row) = ((i % 8) as u16, (i / 8) as u16);
            TileSource::from_canvas(column * 80, row * 60, &solid(80, 60, i as u8 + 1))
        })
        .collect();
    XpkWriter::new(tiles).to_bytes()
}

#[test]
fn tiled_mode_fills_640x480() {
    let mut reader = XpkReader::new(Cursor::new(full_screen())).expect("parse xpk");
    assert!(reader.xpk().is_tiled_mode_ok());

    let canvas = reader.decode_tiled_mode().expect("decode tiled");
    assert_eq!((canvas.width(), canvas.height()), (640, 480));

    for i in 0..XPK_TILED_TILE_COUNT as u32 {
        let (left, top) = ((i % 8) * 80, (i / 8) * 60);
        let expected = Some(i as u8 + 1);
        assert_eq!(canvas.pixel(left, top), expected);
        assert_eq!(canvas.pixel(left + 79, top + 59), expected);
    }
}

#[test]
fn one_odd_tile_breaks_tiled_mode() {
    let mut tiles: Vec<TileSource> = (0..XPK_TILED_TILE_COUNT)
        .map(|_| TileSource::from_canvas(0, 0, &solid(80, 60, 1)))
        .collect();
    tiles[63] = TileSource::from_canvas(0, 0, &solid(80, 59, 1));

    let bytes = XpkWriter::new(tiles).to_bytes();
    let xpk = Xpk::parse(&mut Cursor::new(bytes)).expect("parse xpk");
    assert_eq!(xpk.entry_count(), 64);
    assert!(!xpk.is_tiled_mode_ok());
}

#[test]
fn xpk_inside_offset_stream() {
    // Tile offsets resolve against the stream the table was read from
    let mut bytes = vec![0xEE; 32];
    bytes.extend(XpkWriter::new(vec![TileSource::from_canvas(0, 0, &solid(2, 2, 5))]).to_bytes());

    let mut cursor = Cursor::new(bytes);
    cursor.set_position(32);
    let mut reader = XpkReader::new(cursor).expect("parse xpk");
    assert_eq!(reader.decode_entry(0).expect("decode").pixels(), &[5, 5, 5, 5]);
}
