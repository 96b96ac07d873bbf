use std::fmt;

use serde::Serialize;

use super::ResourceArchive;
use crate::error::Result;

/// Width of the file type field in a table-of-contents record
pub const MEMBER_FILE_TYPE_LEN: usize = 4;
/// Width of the name field stored just before each member's payload
pub const MEMBER_NAME_LEN: usize = 16;

/// Metadata for one resource inside a Presage archive.
///
/// A member does not point back at its archive; pass the archive to
/// [`ArchiveMember::open_in`] to read it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveMember {
    pub internal_id: u16,
    /// Offset as stored in the table of contents. For PRX archives this is
    /// relative to the end of the table, see [`super::PresageArchive::absolute_offset`].
    pub offset: u32,
    pub file_type: String,
    pub resource_id: u32,
    pub size: u32,
    pub name: String,
}

impl ArchiveMember {
    /// The name members are looked up by, e.g. `!Title.CLU`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.file_type)
    }

    pub fn is_type(&self, file_type: &str) -> bool {
        self.file_type.eq_ignore_ascii_case(file_type)
    }

    pub fn open_in<'a, A: ResourceArchive>(
        &self,
        archive: &'a mut A,
    ) -> Result<Option<A::Member<'a>>> {
        archive.open_member(&self.file_name())
    }
}

impl fmt::Display for ArchiveMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id {}, rid {}, {} bytes)",
            self.file_name(),
            self.internal_id,
            self.resource_id,
            self.size
        )
    }
}
