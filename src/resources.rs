//! Fetch resources out of a title's archives by name.
//!
//! Archive paths are written the way the games refer to them
//! (`"IDL/Whit.PRX"`, `"TITLE.PRD"`) and resolved one component at a time,
//! ignoring case.

use std::fs::{self, File};
use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};

use log::debug;

use crate::containers::{PresageArchive, ResourceArchive};
use crate::error::Result;
use crate::formats::clu::Clu;
use crate::formats::xpk::XpkReader;

pub type FileArchive = PresageArchive<BufReader<File>>;

pub struct ResourceLoader {
    game_dir: PathBuf,
}

impl ResourceLoader {
    pub fn new<P: Into<PathBuf>>(game_dir: P) -> Self {
        ResourceLoader {
            game_dir: game_dir.into(),
        }
    }

    /// Find `relative` under the game directory, matching every component
    /// case-insensitively. An exact match wins over a case-folded one.
    pub fn resolve(&self, relative: &str) -> Result<Option<PathBuf>> {
        let mut current = self.game_dir.clone();

        for component in relative.split(['/', '\\']).filter(|c| !c.is_empty()) {
            let exact = current.join(component);
            if exact.exists() {
                current = exact;
                continue;
            }

            let mut matched = None;
            for entry in fs::read_dir(&current)? {
                let entry = entry?;
                if entry.file_name().to_string_lossy().eq_ignore_ascii_case(component) {
                    matched = Some(entry.path());
                    break;
                }
            }

            match matched {
                Some(path) => current = path,
                None => return Ok(None),
            }
        }

        Ok(Some(current))
    }

    /// Open and parse an archive.
    ///
    /// With `data` given, `header` and `data` are a PRD/PRS pair. Otherwise
    /// a `.PRD` header is paired with its `.PRS` sibling, a `.PRX` is opened
    /// on its own, and a name without extension tries `.PRX` then `.PRD`.
    pub fn open_archive(&self, header: &str, data: Option<&str>) -> Result<FileArchive> {
        let (header_path, data_path) = match data {
            Some(data) => (self.require(header)?, self.require(data)?),
            None => self.locate(header)?,
        };

        debug!(
            "Opening {} / {}",
            header_path.display(),
            data_path.display()
        );
        let mut archive = PresageArchive::open(&header_path, &data_path)?;
        archive.read()?;
        Ok(archive)
    }

    pub fn request_bytes(
        &self,
        archive: &str,
        data: Option<&str>,
        member: &str,
    ) -> Result<Option<Vec<u8>>> {
        let mut archive = self.open_archive(archive, data)?;
        archive.read_member(member)
    }

    pub fn request_clu(
        &self,
        archive: &str,
        data: Option<&str>,
        member: &str,
    ) -> Result<Option<Clu>> {
        match self.request_bytes(archive, data, member)? {
            Some(bytes) => Ok(Some(Clu::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn request_xpk(
        &self,
        archive: &str,
        data: Option<&str>,
        member: &str,
    ) -> Result<Option<XpkReader<Cursor<Vec<u8>>>>> {
        match self.request_bytes(archive, data, member)? {
            Some(bytes) => Ok(Some(XpkReader::new(Cursor::new(bytes))?)),
            None => Ok(None),
        }
    }

    fn require(&self, relative: &str) -> Result<PathBuf> {
        self.resolve(relative)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found in {}", relative, self.game_dir.display()),
            )
            .into()
        })
    }

    fn locate(&self, name: &str) -> Result<(PathBuf, PathBuf)> {
        let extension = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_uppercase());

        match extension.as_deref() {
            Some("PRD") => {
                let header = self.require(name)?;
                let data = self.require(&with_extension(name, "PRS"))?;
                Ok((header, data))
            }
            Some(_) => {
                let path = self.require(name)?;
                Ok((path.clone(), path))
            }
            None => {
                if let Some(path) = self.resolve(&with_extension(name, "PRX"))? {
                    return Ok((path.clone(), path));
                }
                let header = self.require(&with_extension(name, "PRD"))?;
                let data = self.require(&with_extension(name, "PRS"))?;
                Ok((header, data))
            }
        }
    }
}

fn with_extension(name: &str, extension: &str) -> String {
    match name.rfind('.') {
        Some(dot) if !name[dot..].contains(['/', '\\']) => {
            format!("{}.{}", &name[..dot], extension)
        }
        _ => format!("{}.{}", name, extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::writer::presage::{MemberSource, PresageWriter};

    fn members() -> Vec<MemberSource> {
        vec![
            MemberSource::new("!Title", "CLU", 600, Clu::grayscale().to_bytes()),
            MemberSource::new("Title", "TXT", 601, b"hello".to_vec()),
        ]
    }

    fn game_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let idl = dir.path().join("IDL");
        fs::create_dir(&idl).unwrap();

        fs::write(idl.join("Whit.PRX"), PresageWriter::new(members()).to_prx()).unwrap();

        let (prd, prs) = PresageWriter::new(members()).to_prd_prs();
        fs::write(idl.join("ARRO.PRD"), prd).unwrap();
        fs::write(idl.join("ARRO.PRS"), prs).unwrap();
        dir
    }

    #[test]
    fn resolves_ignoring_case() {
        let dir = game_dir();
        let loader = ResourceLoader::new(dir.path());

        let path = loader.resolve("idl/whit.prx").unwrap().unwrap();
        assert!(path.ends_with("IDL/Whit.PRX"));
        assert_eq!(loader.resolve("IDL/Nope.PRX").unwrap(), None);
    }

    #[test]
    fn opens_prx_and_pairs() {
        let dir = game_dir();
        let loader = ResourceLoader::new(dir.path());

        let prx = loader.open_archive("IDL/Whit.PRX", None).unwrap();
        assert_eq!(prx.entry_count(), 2);

        let explicit = loader.open_archive("IDL/Arro.PRD", Some("IDL/Arro.PRS")).unwrap();
        let sibling = loader.open_archive("IDL/Arro.PRD", None).unwrap();
        let stem = loader.open_archive("IDL/Arro", None).unwrap();
        assert_eq!(sibling.list_members(), explicit.list_members());
        assert_eq!(stem.list_members(), explicit.list_members());

        let names: Vec<String> = explicit.list_members().iter().map(|m| m.file_name()).collect();
        assert_eq!(names, ["!Title.CLU", "Title.TXT"]);
    }

    #[test]
    fn requests_typed_members() {
        let dir = game_dir();
        let loader = ResourceLoader::new(dir.path());

        let clu = loader.request_clu("IDL/Whit", None, "!Title.CLU").unwrap();
        assert_eq!(clu, Some(Clu::grayscale()));

        let text = loader.request_bytes("IDL/Arro", None, "Title.TXT").unwrap();
        assert_eq!(text.as_deref(), Some(&b"hello"[..]));

        assert!(loader.request_xpk("IDL/Whit", None, "Title.XPK").unwrap().is_none());
    }

    #[test]
    fn missing_archive_is_not_found() {
        let dir = game_dir();
        let loader = ResourceLoader::new(dir.path());

        match loader.open_archive("IDL/Gone.PRX", None) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            Err(other) => panic!("expected not found, got {}", other),
            Ok(_) => panic!("expected not found"),
        }
    }

    #[test]
    fn replaces_extension_only_in_last_component() {
        assert_eq!(with_extension("IDL/Arro.PRD", "PRS"), "IDL/Arro.PRS");
        assert_eq!(with_extension("v1.0/Arro", "PRX"), "v1.0/Arro.PRX");
    }
}
