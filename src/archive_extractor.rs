use std::fs::{self, File};
use std::hash::Hasher;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::{debug, info, warn};
use serde::Serialize;
use twox_hash::XxHash64;

use crate::{
    config::ExtractConfig,
    containers::{ArchiveMember, PresageArchive, PresageKind, ResourceArchive},
    error::Result,
    formats::{clu::Clu, xpk::XpkReader},
    progress::write_progress,
};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
const GRAYSCALE_PALETTE: &str = "grayscale";

/// What happened to one member during extraction
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub file_type: String,
    pub internal_id: u16,
    pub resource_id: u32,
    pub offset: u32,
    pub absolute_offset: u64,
    pub size: u32,
    pub xxh64: String,
    /// Files written for this member, relative to the archive's folder
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub archive: String,
    pub kind: PresageKind,
    pub entry_count: u16,
    /// CLU member images were rendered with, or `grayscale`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
    pub members: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn failed(&self) -> usize {
        self.members.iter().filter(|m| m.error.is_some()).count()
    }
}

/// Dumps an archive's members and renders its XPK images
pub struct ArchiveExtractor {
    config: ExtractConfig,
}

impl ArchiveExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        ArchiveExtractor { config }
    }

    /// Extract everything in `archive` (already read) into
    /// `output_dir/<label>/`. Failing to render one image is recorded in
    /// the manifest and does not stop the extraction.
    pub fn extract<R: Read + Seek>(
        &self,
        archive: &mut PresageArchive<R>,
        label: &str,
        output_dir: &Path,
    ) -> Result<Manifest> {
        let archive_dir = output_dir.join(label);
        fs::create_dir_all(&archive_dir)?;

        let palette = if self.config.render_images {
            Some(self.choose_palette(archive)?)
        } else {
            None
        };

        let members: Vec<ArchiveMember> = archive.list_members().to_vec();
        let total = members.len();
        info!("Extracting {} members of {} to {}", total, label, archive_dir.display());

        let mut manifest = Manifest {
            archive: label.to_string(),
            kind: archive.kind(),
            entry_count: archive.entry_count(),
            palette: palette.as_ref().map(|(name, _)| name.clone()),
            members: Vec::with_capacity(total),
        };

        for (index, member) in members.iter().enumerate() {
            let data = match member.open_in(archive)? {
                Some(mut stream) => {
                    let mut data = Vec::with_capacity(stream.len() as usize);
                    stream.read_to_end(&mut data)?;
                    data
                }
                None => Vec::new(),
            };

            let raw_name = safe_file_name(&member.file_name());
            fs::write(archive_dir.join(&raw_name), &data)?;

            let mut entry = ManifestEntry {
                name: member.name.clone(),
                file_type: member.file_type.clone(),
                internal_id: member.internal_id,
                resource_id: member.resource_id,
                offset: member.offset,
                absolute_offset: archive.absolute_offset(member),
                size: member.size,
                xxh64: format!("{:016x}", content_hash(&data)),
                outputs: vec![raw_name],
                error: None,
            };

            if let Some((_, clu)) = palette.as_ref() {
                if member.is_type("XPK") {
                    match self.render_xpk(data, member, clu, &archive_dir) {
                        Ok(files) => entry.outputs.extend(files),
                        Err(e) => {
                            warn!("Could not render {}: {}", member.file_name(), e);
                            entry.error = Some(e.to_string());
                        }
                    }
                }
            }

            manifest.members.push(entry);

            if let Some(progress_path) = &self.config.progress_file {
                write_progress(progress_path, index + 1, total, label, "running");
            }
        }

        if self.config.write_manifest {
            let file = File::create(archive_dir.join(MANIFEST_FILE_NAME))?;
            serde_json::to_writer_pretty(file, &manifest)?;
        }

        if let Some(progress_path) = &self.config.progress_file {
            write_progress(progress_path, total, total, label, "done");
        }

        info!(
            "Finished {}: {} members, {} failed",
            label,
            total,
            manifest.failed()
        );
        Ok(manifest)
    }

    /// The configured CLU, else the first CLU member, else grayscale
    fn choose_palette<R: Read + Seek>(
        &self,
        archive: &mut PresageArchive<R>,
    ) -> Result<(String, Clu)> {
        if let Some(name) = &self.config.palette {
            match archive.read_member(name)?.map(|bytes| Clu::from_bytes(&bytes)) {
                Some(Ok(clu)) => return Ok((name.clone(), clu)),
                Some(Err(e)) => warn!("Palette {} is unreadable: {}", name, e),
                None => warn!("Palette {} is not in this archive", name),
            }
        }

        let first_clu = archive
            .list_members()
            .iter()
            .find(|m| m.is_type("CLU"))
            .map(|m| m.file_name());

        if let Some(name) = first_clu {
            if let Some(bytes) = archive.read_member(&name)? {
                match Clu::from_bytes(&bytes) {
                    Ok(clu) => {
                        debug!("Rendering with palette {}", name);
                        return Ok((name, clu));
                    }
                    Err(e) => warn!("Palette {} is unreadable: {}", name, e),
                }
            }
        }

        debug!("No palette found, rendering in grayscale");
        Ok((GRAYSCALE_PALETTE.to_string(), Clu::grayscale()))
    }

    /// Full screens become one PNG, anything else one PNG per tile
    fn render_xpk(
        &self,
        data: Vec<u8>,
        member: &ArchiveMember,
        palette: &Clu,
        archive_dir: &Path,
    ) -> Result<Vec<String>> {
        let mut reader = XpkReader::new(Cursor::new(data))?;
        let stem = safe_file_name(&member.name);

        if reader.xpk().is_tiled_mode_ok() {
            let canvas = reader.decode_tiled_mode()?;
            let file_name = format!("{}.png", stem);
            self.save_png(&canvas.to_rgba_image(palette), &archive_dir.join(&file_name))?;
            return Ok(vec![file_name]);
        }

        let mut files = Vec::with_capacity(reader.xpk().entries().len());
        for index in 0..reader.xpk().entries().len() {
            let canvas = reader.decode_entry(index)?;
            if canvas.width() == 0 || canvas.height() == 0 {
                debug!("Skipping empty tile {} of {}", index, member.file_name());
                continue;
            }

            let file_name = format!("{}_{}.png", stem, index);
            self.save_png(&canvas.to_rgba_image(palette), &archive_dir.join(&file_name))?;
            files.push(file_name);
        }

        Ok(files)
    }

    fn save_png(&self, image: &RgbaImage, path: &Path) -> Result<()> {
        if !self.config.optimise_png {
            image.save(path)?;
            return Ok(());
        }

        let temp_path: PathBuf = path.with_extension("temp.png");
        image.save(&temp_path)?;

        let mut options = oxipng::Options::from_preset(self.config.png_preset);
        options.bit_depth_reduction = true;
        options.interlace = None;

        match oxipng::optimize(
            &oxipng::InFile::Path(temp_path.clone()),
            &oxipng::OutFile::Path(Some(path.to_path_buf())),
            &options,
        ) {
            Ok(_) => {
                let _ = fs::remove_file(temp_path);
            }
            Err(e) => {
                fs::rename(&temp_path, path)?;
                warn!(
                    "oxipng optimisation failed for {}: {}. File saved unoptimised.",
                    path.display(),
                    e
                );
            }
        }

        Ok(())
    }
}

pub fn content_hash(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

/// Member names may contain characters that are not valid in file names
fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(safe_file_name("!Title.CLU"), "!Title.CLU");
        assert_eq!(safe_file_name("a/b:c?.XPK"), "a_b_c_.XPK");
    }

    #[test]
    fn hash_depends_on_content() {
        assert_eq!(content_hash(b"FORM"), content_hash(b"FORM"));
        assert_ne!(content_hash(b"FORM"), content_hash(b"FORN"));
    }
}
