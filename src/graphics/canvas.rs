use image::{Rgba, RgbaImage};

use crate::formats::clu::Clu;

/// Palette-indexed pixel buffer, one byte per pixel, row-major
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl IndexedCanvas {
    /// A canvas filled with palette index 0
    pub fn new(width: u32, height: u32) -> Self {
        IndexedCanvas {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        self.index_of(x, y).map(|i| self.pixels[i])
    }

    /// Returns false when (x, y) falls outside the canvas and nothing was written
    pub fn set_pixel(&mut self, x: u32, y: u32, colour: u8) -> bool {
        match self.index_of(x, y) {
            Some(i) => {
                self.pixels[i] = colour;
                true
            }
            None => false,
        }
    }

    /// Copy `source` with its top-left corner at (x, y), clipping at the edges
    pub fn blit(&mut self, source: &IndexedCanvas, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }

        let copy_w = source.width.min(self.width - x) as usize;
        let copy_h = source.height.min(self.height - y);

        for row in 0..copy_h {
            let src_start = (row * source.width) as usize;
            let dst_start = ((y + row) * self.width + x) as usize;
            self.pixels[dst_start..dst_start + copy_w]
                .copy_from_slice(&source.pixels[src_start..src_start + copy_w]);
        }
    }

    /// Apply a palette. Every pixel is opaque, index 0 included.
    pub fn to_rgba_image(&self, palette: &Clu) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let colour = palette.colour_at(self.pixels[(y * self.width + x) as usize]);
            Rgba([colour.r, colour.g, colour.b, 255])
        })
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }
}
