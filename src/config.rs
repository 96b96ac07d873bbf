use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for [`crate::archive_extractor::ArchiveExtractor`]. Missing
/// fields in a JSON file take their default values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// CLU member to render images with, e.g. `"!Title.CLU"`
    pub palette: Option<String>,
    pub render_images: bool,
    pub optimise_png: bool,
    /// oxipng preset, 0 (fast) to 6
    pub png_preset: u8,
    pub write_manifest: bool,
    pub progress_file: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            palette: None,
            render_images: true,
            optimise_png: true,
            png_preset: 2,
            write_manifest: true,
            progress_file: None,
        }
    }
}

impl ExtractConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
