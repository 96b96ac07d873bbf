//! # Presage archives
//!
//! Presage titles pack their resources either into one `.PRX` file, or into a
//! `.PRD` header file plus a `.PRS` data file. Both share the same table of
//! contents layout (all little-endian):
//!
//! ```text
//! [0x00]  magic (u8, always 1)
//! [0x01]  reserved (137 bytes)
//! [0x8A]  actual entry count, dummies included (u16)
//! [0x8C]  real entry count (u16)
//! [0x8E]  reserved (u16)
//! [0x90]  dummy leading record (24 bytes)
//! [0xA8]  real entry count x 24-byte records
//!         trailing dummy records
//! ```
//!
//! Member names are not in the table: each payload is preceded by its
//! 16-byte name field, followed by a few separator bytes (6 in PRX, 5 in
//! PRD/PRS) before the payload itself.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, trace, warn};
use serde::Serialize;

use super::member::{ArchiveMember, MEMBER_FILE_TYPE_LEN, MEMBER_NAME_LEN};
use super::ResourceArchive;
use crate::binary_utils::{
    read_fixed_string, read_u16_le, read_u32_le, read_u8, seek_to, skip, SubReader,
};
use crate::error::{Error, Result};

pub const PRESAGE_MAGIC: u8 = 1;
pub const HEADER_RESERVED_LEN: u64 = 137;
pub const TOC_RECORD_LEN: u64 = 24;
/// Bytes between the end of a member's name field and its payload
pub const PRX_NAME_GAP: u64 = 6;
pub const PRDPRS_NAME_GAP: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PresageKind {
    /// Header and data in one file
    Prx,
    /// Header in a `.PRD`, data in a `.PRS`
    PrdPrs,
}

impl PresageKind {
    /// How far before a payload its name field starts
    pub fn name_rewind(self) -> u64 {
        MEMBER_NAME_LEN as u64
            + match self {
                PresageKind::Prx => PRX_NAME_GAP,
                PresageKind::PrdPrs => PRDPRS_NAME_GAP,
            }
    }
}

impl fmt::Display for PresageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresageKind::Prx => write!(f, "PRX"),
            PresageKind::PrdPrs => write!(f, "PRD/PRS"),
        }
    }
}

/// A Presage archive over one (PRX) or two (PRD/PRS) streams.
///
/// Construction only records the streams; call [`PresageArchive::read`]
/// before querying members.
pub struct PresageArchive<R> {
    kind: PresageKind,
    header: R,
    /// Separate data stream, PRD/PRS only. PRX reads data from `header`.
    data: Option<R>,
    entry_count: u16,
    data_offset_start: u32,
    members: Vec<ArchiveMember>,
}

impl PresageArchive<BufReader<File>> {
    /// Open an archive from its header and data paths. Passing the same path
    /// twice opens a PRX, distinct paths a PRD/PRS pair.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(header_path: P, data_path: Q) -> Result<Self> {
        let header_path = header_path.as_ref();
        let data_path = data_path.as_ref();

        let header = BufReader::new(File::open(header_path)?);
        if header_path == data_path {
            return Ok(Self::prx(header));
        }

        let data = BufReader::new(File::open(data_path)?);
        Ok(Self::prd_prs(header, data))
    }

    pub fn open_prx<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(&path, &path)
    }

    pub fn open_pair<P: AsRef<Path>, Q: AsRef<Path>>(prd_path: P, prs_path: Q) -> Result<Self> {
        Self::open(prd_path, prs_path)
    }
}

impl<R: Read + Seek> PresageArchive<R> {
    pub fn prx(reader: R) -> Self {
        PresageArchive {
            kind: PresageKind::Prx,
            header: reader,
            data: None,
            entry_count: 0,
            data_offset_start: 0,
            members: Vec::new(),
        }
    }

    pub fn prd_prs(header: R, data: R) -> Self {
        PresageArchive {
            kind: PresageKind::PrdPrs,
            header,
            data: Some(data),
            entry_count: 0,
            data_offset_start: 0,
            members: Vec::new(),
        }
    }

    /// Parse the table of contents and recover every member's name.
    ///
    /// On failure the archive is left empty.
    pub fn read(&mut self) -> Result<()> {
        self.members.clear();
        self.entry_count = 0;
        self.data_offset_start = 0;

        let header = &mut self.header;
        seek_to(header, 0)?;

        let magic = read_u8(header)?;
        if magic != PRESAGE_MAGIC {
            return Err(Error::BadMagic {
                format: "Presage",
                found: u32::from(magic),
            });
        }

        skip(header, HEADER_RESERVED_LEN)?;

        // Includes the dummy records at either end of the table
        let actual_entry_count = read_u16_le(header)?;
        let entry_count = read_u16_le(header)?;
        skip(header, 2)?;

        // The leading record (internal id 1) never describes a real member
        skip(header, TOC_RECORD_LEN)?;

        let mut members = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            members.push(read_toc_record(header, entry_count)?);
        }

        if actual_entry_count < entry_count {
            warn!(
                "{} table claims {} records but {} real entries",
                self.kind, actual_entry_count, entry_count
            );
        }
        let trailing = actual_entry_count.saturating_sub(entry_count);
        skip(header, TOC_RECORD_LEN * u64::from(trailing))?;

        // PRX offsets count from the end of the table
        let data_offset_start = match self.kind {
            PresageKind::Prx => {
                u32::try_from(header.stream_position()?).map_err(|_| Error::InvalidRange)?
            }
            PresageKind::PrdPrs => 0,
        };

        let kind = self.kind;
        let data = self.data.as_mut().unwrap_or(&mut self.header);
        for member in members.iter_mut() {
            let offset = absolute_offset(kind, data_offset_start, member);
            let name_start = offset
                .checked_sub(kind.name_rewind())
                .ok_or(Error::InvalidRange)?;

            seek_to(data, name_start)?;
            member.name = read_fixed_string(data, MEMBER_NAME_LEN)?;
            trace!("{} member {} at 0x{:X}", kind, member, offset);
        }

        debug!("{} archive has {} members", kind, entry_count);

        self.entry_count = entry_count;
        self.data_offset_start = data_offset_start;
        self.members = members;
        Ok(())
    }

    pub fn kind(&self) -> PresageKind {
        self.kind
    }

    pub fn entry_count(&self) -> u16 {
        self.entry_count
    }

    /// Where PRX member offsets count from. Zero for PRD/PRS.
    pub fn data_offset_start(&self) -> u32 {
        self.data_offset_start
    }

    /// Offset of `member`'s payload from the start of the data stream
    pub fn absolute_offset(&self, member: &ArchiveMember) -> u64 {
        absolute_offset(self.kind, self.data_offset_start, member)
    }

    fn data_stream(&mut self) -> &mut R {
        match self.data.as_mut() {
            Some(data) => data,
            None => &mut self.header,
        }
    }
}

impl<R: Read + Seek> ResourceArchive for PresageArchive<R> {
    type Member<'a> = SubReader<&'a mut R> where Self: 'a;

    fn list_members(&self) -> &[ArchiveMember] {
        &self.members
    }

    fn open_member(&mut self, name: &str) -> Result<Option<Self::Member<'_>>> {
        let Some(member) = self.get_member(name) else {
            return Ok(None);
        };

        let start = self.absolute_offset(member);
        let size = u64::from(member.size);
        let stream = SubReader::new(self.data_stream(), start, size)?;
        Ok(Some(stream))
    }
}

fn absolute_offset(kind: PresageKind, data_offset_start: u32, member: &ArchiveMember) -> u64 {
    match kind {
        PresageKind::Prx => u64::from(data_offset_start) + u64::from(member.offset),
        PresageKind::PrdPrs => u64::from(member.offset),
    }
}

fn read_toc_record<R: Read + Seek>(header: &mut R, entry_count: u16) -> Result<ArchiveMember> {
    // The last record stores 0 instead of its id
    let internal_id = match read_u16_le(header)? {
        0 => entry_count.wrapping_add(1),
        id => id,
    };
    skip(header, 6)?;

    let offset = read_u32_le(header)?;
    let file_type = read_fixed_string(header, MEMBER_FILE_TYPE_LEN)?;
    let resource_id = read_u32_le(header)?;
    let size = read_u32_le(header)?;

    Ok(ArchiveMember {
        internal_id,
        offset,
        file_type,
        resource_id,
        size,
        name: String::new(),
    })
}
