//! Readers for the Presage engine's resource files: PRX and PRD/PRS
//! archives, CLU palettes and XPK tiled images, plus an extractor that
//! turns an archive into plain files and PNGs.

pub mod archive_extractor;
pub mod binary_utils;
pub mod config;
pub mod containers;
pub mod error;
pub mod formats;
pub mod graphics;
pub mod progress;
pub mod resources;
pub mod titles;
pub mod writer;

pub use error::{Error, Result};
