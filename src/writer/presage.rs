use crate::containers::member::{MEMBER_FILE_TYPE_LEN, MEMBER_NAME_LEN};
use crate::containers::presage::{
    PresageKind, HEADER_RESERVED_LEN, PRESAGE_MAGIC, TOC_RECORD_LEN,
};

/// One member to be written into an archive
#[derive(Clone, Debug)]
pub struct MemberSource {
    pub name: String,
    pub file_type: String,
    pub resource_id: u32,
    pub data: Vec<u8>,
}

impl MemberSource {
    pub fn new(name: &str, file_type: &str, resource_id: u32, data: Vec<u8>) -> Self {
        MemberSource {
            name: name.to_string(),
            file_type: file_type.to_string(),
            resource_id,
            data,
        }
    }
}

pub struct PresageWriter {
    members: Vec<MemberSource>,
    trailing_dummies: u16,
}

impl PresageWriter {
    pub fn new(members: Vec<MemberSource>) -> Self {
        PresageWriter {
            members,
            trailing_dummies: 0,
        }
    }

    /// Pad the table of contents with unused records after the real ones
    pub fn with_trailing_dummies(mut self, count: u16) -> Self {
        self.trailing_dummies = count;
        self
    }

    /// Serialise as a single PRX file
    pub fn to_prx(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let offsets = self.write_data(&mut data, PresageKind::Prx);

        let mut output = self.write_header(&offsets);
        output.extend_from_slice(&data);
        output
    }

    /// Serialise as a `(PRD, PRS)` pair
    pub fn to_prd_prs(&self) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::new();
        let offsets = self.write_data(&mut data, PresageKind::PrdPrs);
        (self.write_header(&offsets), data)
    }

    /// Lay out name field, separator and payload for each member. Returns
    /// each payload's offset from the start of `output`.
    fn write_data(&self, output: &mut Vec<u8>, kind: PresageKind) -> Vec<u32> {
        let gap = (kind.name_rewind() as usize) - MEMBER_NAME_LEN;

        self.members
            .iter()
            .map(|member| {
                output.extend_from_slice(&fixed_field(&member.name, MEMBER_NAME_LEN));
                output.extend(std::iter::repeat(0u8).take(gap));
                let offset = output.len() as u32;
                output.extend_from_slice(&member.data);
                offset
            })
            .collect()
    }

    fn write_header(&self, offsets: &[u32]) -> Vec<u8> {
        let entry_count = self.members.len() as u16;
        let actual_count = entry_count.saturating_add(self.trailing_dummies);

        let mut output = vec![PRESAGE_MAGIC];
        output.extend(std::iter::repeat(0u8).take(HEADER_RESERVED_LEN as usize));
        output.extend_from_slice(&actual_count.to_le_bytes());
        output.extend_from_slice(&entry_count.to_le_bytes());
        output.extend_from_slice(&0u16.to_le_bytes());

        let mut leading = vec![0u8; TOC_RECORD_LEN as usize];
        leading[0] = 1;
        output.extend_from_slice(&leading);

        for (i, (member, offset)) in self.members.iter().zip(offsets).enumerate() {
            // Ids follow the leading record; the last one is stored as 0
            let internal_id = if i + 1 == self.members.len() {
                0
            } else {
                (i + 2) as u16
            };

            output.extend_from_slice(&internal_id.to_le_bytes());
            output.extend_from_slice(&[0u8; 6]);
            output.extend_from_slice(&offset.to_le_bytes());
            output.extend_from_slice(&fixed_field(&member.file_type, MEMBER_FILE_TYPE_LEN));
            output.extend_from_slice(&member.resource_id.to_le_bytes());
            output.extend_from_slice(&(member.data.len() as u32).to_le_bytes());
        }

        let trailing = TOC_RECORD_LEN as usize * self.trailing_dummies as usize;
        output.extend(std::iter::repeat(0u8).take(trailing));
        output
    }
}

/// NUL-padded (and truncated) fixed-width text field
fn fixed_field(text: &str, width: usize) -> Vec<u8> {
    let mut field: Vec<u8> = text.bytes().take(width).collect();
    field.resize(width, 0);
    field
}
