pub mod member;
pub mod presage;

use std::io::{Read, Seek};

use crate::error::Result;

pub use member::ArchiveMember;
pub use presage::{PresageArchive, PresageKind};

/// Anything that can list, check and open named members.
///
/// Member names are matched exactly against [`ArchiveMember::file_name`]
/// (`name + "." + file_type`).
pub trait ResourceArchive {
    type Member<'a>: Read + Seek
    where
        Self: 'a;

    /// All members, in on-disk order
    fn list_members(&self) -> &[ArchiveMember];

    /// Open a stream over exactly the bytes of the named member
    fn open_member(&mut self, name: &str) -> Result<Option<Self::Member<'_>>>;

    fn get_member(&self, name: &str) -> Option<&ArchiveMember> {
        self.list_members().iter().find(|m| m.file_name() == name)
    }

    fn has_file(&self, name: &str) -> bool {
        self.get_member(name).is_some()
    }

    /// Read a whole member into memory
    fn read_member(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.open_member(name)? {
            Some(mut stream) => {
                let mut data = Vec::new();
                stream.read_to_end(&mut data)?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }
}
