use std::fs;
use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::containers::presage::PresageKind;
use crate::error::Result;

/// A known Presage title, identified by one file in its install directory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GameTitle {
    pub id: &'static str,
    pub name: &'static str,
    pub detect_file: &'static str,
    pub detect_size: u64,
    /// Archive layout the title uses
    pub kind: PresageKind,
}

pub static TITLES: [GameTitle; 4] = [
    GameTitle {
        id: "rockett_newschool",
        name: "Rockett's New School",
        detect_file: "TITLE.PRD",
        detect_size: 552,
        kind: PresageKind::PrdPrs,
    },
    GameTitle {
        id: "rockett_tricky",
        name: "Rockett's Tricky Decision",
        detect_file: "Title.PRX",
        detect_size: 1_320_704,
        kind: PresageKind::Prx,
    },
    GameTitle {
        id: "rockett_secret",
        name: "Rockett's Secret Invitation",
        detect_file: "TITLE.PRX",
        detect_size: 1_549_765,
        kind: PresageKind::Prx,
    },
    GameTitle {
        id: "rockett_dance",
        name: "Rockett's First Dance",
        detect_file: "TITLE.PRX",
        detect_size: 2_524_847,
        kind: PresageKind::Prx,
    },
];

pub fn find_title(id: &str) -> Option<&'static GameTitle> {
    TITLES.iter().find(|t| t.id == id)
}

/// Identify the title installed in `dir` by the name (any case) and exact
/// size of its detection file
pub fn detect_title(dir: &Path) -> Result<Option<&'static GameTitle>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            files.push((entry.file_name().to_string_lossy().to_string(), metadata.len()));
        }
    }

    let found = TITLES.iter().find(|title| {
        files.iter().any(|(name, size)| {
            name.eq_ignore_ascii_case(title.detect_file) && *size == title.detect_size
        })
    });

    match found {
        Some(title) => debug!("Detected {} in {}", title.id, dir.display()),
        None => debug!("No known title in {}", dir.display()),
    }
    Ok(found)
}
