use std::fs;
use std::io::Cursor;

use presage_scraper::archive_extractor::{content_hash, ArchiveExtractor, MANIFEST_FILE_NAME};
use presage_scraper::config::ExtractConfig;
use presage_scraper::containers::PresageArchive;
use presage_scraper::formats::clu::{Clu, Rgb};
use presage_scraper::graphics::canvas::IndexedCanvas;
use presage_scraper::writer::presage::{MemberSource, PresageWriter};
use presage_scraper::writer::xpk::{TileSource, XpkWriter};
use tempfile::tempdir;

fn palette() -> Clu {
    let mut colours = [Rgb::default(); 256];
    colours[3] = Rgb::new(200, 10, 20);
    colours[4] = Rgb::new(0, 0, 255);
    Clu::from(colours)
}

fn sprite() -> Vec<u8> {
    let mut first = IndexedCanvas::new(4, 2);
    let mut second = IndexedCanvas::new(3, 3);
    for y in 0..3 {
        for x in 0..4 {
            first.set_pixel(x, y, 3);
            second.set_pixel(x, y, 4);
        }
    }
    XpkWriter::new(vec![
        TileSource::from_canvas(0, 0, &first),
        TileSource::from_canvas(4, 0, &second),
    ])
    .to_bytes()
}

fn archive_bytes() -> Vec<u8> {
    PresageWriter::new(vec![
        MemberSource::new("!Title", "CLU", 600, palette().to_bytes()),
        MemberSource::new("Rockett", "XPK", 601, sprite()),
        MemberSource::new("Broken", "XPK", 602, vec![0xDE, 0xAD, 0xBE, 0xEF]),
        MemberSource::new("Click", "Aif", 603, b"FORM".to_vec()),
    ])
    .with_trailing_dummies(2)
    .to_prx()
}

fn config(progress: std::path::PathBuf) -> ExtractConfig {
    ExtractConfig {
        optimise_png: false,
        progress_file: Some(progress),
        ..ExtractConfig::default()
    }
}

#[test]
fn extracts_members_images_and_manifest() {
    let out = tempdir().expect("temp dir");
    let progress = out.path().join("progress.json");

    let mut archive = PresageArchive::prx(Cursor::new(archive_bytes()));
    archive.read().expect("read archive");

    let manifest = ArchiveExtractor::new(config(progress.clone()))
        .extract(&mut archive, "TITLE", out.path())
        .expect("extract");

    let title_dir = out.path().join("TITLE");
    assert_eq!(manifest.members.len(), 4);
    assert_eq!(manifest.palette.as_deref(), Some("!Title.CLU"));
    assert_eq!(manifest.failed(), 1);

    assert_eq!(fs::read(title_dir.join("Click.Aif")).expect("raw member"), b"FORM");
    let click = &manifest.members[3];
    assert_eq!(click.xxh64, format!("{:016x}", content_hash(b"FORM")));

    let rockett = &manifest.members[1];
    assert_eq!(rockett.outputs, ["Rockett.XPK", "Rockett_0.png", "Rockett_1.png"]);
    assert!(rockett.error.is_none());

    let tile = image::open(title_dir.join("Rockett_1.png")).expect("open png").to_rgba8();
    assert_eq!(tile.dimensions(), (3, 3));
    assert_eq!(tile.get_pixel(2, 2).0, [0, 0, 255, 255]);

    let broken = &manifest.members[2];
    assert!(broken.error.as_deref().unwrap_or_default().contains("XPK"));
    assert_eq!(broken.outputs, ["Broken.XPK"]);

    let written: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(title_dir.join(MANIFEST_FILE_NAME)).expect("manifest"),
    )
    .expect("manifest json");
    assert_eq!(written["members"][1]["resource_id"], 601);
    assert_eq!(written["kind"], "Prx");

    let progress: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(progress).expect("progress")).expect("json");
    assert_eq!(progress["status"], "done");
    assert_eq!(progress["current"], 4);
}

#[test]
fn no_images_only_dumps_members() {
    let out = tempdir().expect("temp dir");
    let mut archive = PresageArchive::prx(Cursor::new(archive_bytes()));
    archive.read().expect("read archive");

    let config = ExtractConfig {
        render_images: false,
        write_manifest: false,
        ..ExtractConfig::default()
    };
    let manifest = ArchiveExtractor::new(config)
        .extract(&mut archive, "TITLE", out.path())
        .expect("extract");

    assert_eq!(manifest.palette, None);
    assert_eq!(manifest.failed(), 0);
    assert!(manifest.members.iter().all(|m| m.outputs.len() == 1));
    assert!(!out.path().join("TITLE").join(MANIFEST_FILE_NAME).exists());
}

#[test]
fn missing_configured_palette_falls_back() {
    let out = tempdir().expect("temp dir");
    let mut archive = PresageArchive::prx(Cursor::new(archive_bytes()));
    archive.read().expect("read archive");

    let config = ExtractConfig {
        palette: Some("Nope.CLU".to_string()),
        optimise_png: false,
        ..ExtractConfig::default()
    };
    let manifest = ArchiveExtractor::new(config)
        .extract(&mut archive, "TITLE", out.path())
        .expect("extract");
    assert_eq!(manifest.palette.as_deref(), Some("!Title.CLU"));
}

#[test]
fn unreadable_configured_palette_falls_back() {
    let out = tempdir().expect("temp dir");
    let mut archive = PresageArchive::prx(Cursor::new(archive_bytes()));
    archive.read().expect("read archive");

    let config = ExtractConfig {
        palette: Some("Broken.XPK".to_string()),
        optimise_png: false,
        ..ExtractConfig::default()
    };
    let manifest = ArchiveExtractor::new(config)
        .extract(&mut archive, "TITLE", out.path())
        .expect("extract");
    assert_eq!(manifest.palette.as_deref(), Some("!Title.CLU"));
    assert_eq!(manifest.failed(), 1);
}
