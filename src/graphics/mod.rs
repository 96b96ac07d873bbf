//! Pixel buffers produced by the decoders

pub mod canvas;

pub use canvas::IndexedCanvas;
