use std::fs;
use std::io::{Read, Seek, SeekFrom};

use presage_scraper::containers::{PresageArchive, PresageKind, ResourceArchive};
use presage_scraper::formats::clu::Clu;
use presage_scraper::writer::presage::{MemberSource, PresageWriter};
use tempfile::tempdir;

fn members() -> Vec<MemberSource> {
    vec![
        MemberSource::new("!Title", "CLU", 600, Clu::grayscale().to_bytes()),
        MemberSource::new("Title", "XPK", 601, (0u8..=255).collect()),
        MemberSource::new("Click", "Aif", 602, b"FORM....AIFF".to_vec()),
    ]
}

#[test]
fn prx_on_disk() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("TITLE.PRX");
    fs::write(&path, PresageWriter::new(members()).with_trailing_dummies(3).to_prx())
        .expect("write prx");

    let mut archive = PresageArchive::open_prx(&path).expect("open prx");
    assert!(archive.list_members().is_empty(), "nothing is parsed before read()");

    archive.read().expect("read prx");
    assert_eq!(archive.kind(), PresageKind::Prx);
    assert_eq!(archive.entry_count(), 3);

    for member in archive.list_members() {
        assert!(!member.name.is_empty());
        assert!(archive.has_file(&member.file_name()));
        assert_eq!(archive.get_member(&member.file_name()), Some(member));
        assert_eq!(
            archive.absolute_offset(member) - u64::from(archive.data_offset_start()),
            u64::from(member.offset)
        );
    }

    let clu = archive.read_member("!Title.CLU").expect("read clu").expect("clu present");
    assert_eq!(Clu::from_bytes(&clu).expect("parse clu"), Clu::grayscale());
}

#[test]
fn prd_prs_pair_on_disk() {
    let dir = tempdir().expect("temp dir");
    let prd_path = dir.path().join("ARRO.PRD");
    let prs_path = dir.path().join("ARRO.PRS");
    let (prd, prs) = PresageWriter::new(members()).with_trailing_dummies(1).to_prd_prs();
    fs::write(&prd_path, prd).expect("write prd");
    fs::write(&prs_path, prs).expect("write prs");

    let mut archive = PresageArchive::open_pair(&prd_path, &prs_path).expect("open pair");
    archive.read().expect("read pair");

    assert_eq!(archive.kind(), PresageKind::PrdPrs);
    let names: Vec<String> = archive.list_members().iter().map(|m| m.file_name()).collect();
    assert_eq!(names, ["!Title.CLU", "Title.XPK", "Click.Aif"]);
    for member in archive.list_members() {
        assert_eq!(archive.absolute_offset(member), u64::from(member.offset));
    }
}

#[test]
fn member_stream_seeks_within_member() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("TITLE.PRX");
    fs::write(&path, PresageWriter::new(members()).to_prx()).expect("write prx");

    let mut archive = PresageArchive::open_prx(&path).expect("open prx");
    archive.read().expect("read prx");

    let mut stream = archive
        .open_member("Title.XPK")
        .expect("open member")
        .expect("member present");

    stream.seek(SeekFrom::Start(250)).expect("seek");
    let mut tail = Vec::new();
    stream.read_to_end(&mut tail).expect("read tail");
    assert_eq!(tail, vec![250, 251, 252, 253, 254, 255]);

    assert_eq!(stream.seek(SeekFrom::End(0)).expect("seek end"), 256);
}
