//! Single-pass track serialization.

use crate::codec::{append_crc16, write_varint_u64};
use crate::error::Result;
use crate::section::Section;
use crate::track::{
    CREATOR_VERSION, FILE_VERSION, HEADER_SIZE, MAGIC, METADATA_KIND_CREATED_AT,
    METADATA_KIND_TRACK_TYPE,
};
use crate::types::{MetadataEntry, SectionEncoding};
use tracing::trace;

impl SectionEncoding {
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Self::Standard => 0x00,
            Self::Encrypted => 0x01,
        }
    }
}

#[rustfmt::skip]
fn write_header(out: &mut Vec<u8>, metadata_offset: u16, data_offset: u16) {
    let start = out.len();
    out.extend_from_slice(&MAGIC);                              // 8 bytes - magic
    out.extend_from_slice(&FILE_VERSION.to_le_bytes());         // 2 bytes - file version
    out.extend_from_slice(&[0x00, 0x00]);                       // 2 bytes - fv reserve
    out.extend_from_slice(&CREATOR_VERSION.to_le_bytes());      // 2 bytes - creator version
    out.extend_from_slice(&[0x00, 0x00]);                       // 2 bytes - cv reserve
    out.extend_from_slice(&metadata_offset.to_le_bytes());      // 2 bytes - metadata table offset
    out.extend_from_slice(&data_offset.to_le_bytes());          // 2 bytes - data offset
    out.extend_from_slice(&[0x00, 0x00]);                       // 2 bytes - e reserve
    append_crc16(out, start);                                   // 2 bytes - header crc
}

fn write_metadata(out: &mut Vec<u8>, entries: &[MetadataEntry]) -> Result<()> {
    let start = out.len();
    write_varint_u64(out, entries.len() as u64);

    for entry in entries {
        match entry {
            MetadataEntry::TrackType(track_type) => {
                out.push(METADATA_KIND_TRACK_TYPE);
                out.extend_from_slice(&5u16.to_le_bytes());
                out.push(track_type.tag());
                out.extend_from_slice(&track_type.id().to_le_bytes());
            }
            MetadataEntry::CreatedAt(seconds) => {
                out.push(METADATA_KIND_CREATED_AT);
                out.extend_from_slice(&8u16.to_le_bytes());
                out.extend_from_slice(&seconds.to_le_bytes());
            }
        }
    }

    append_crc16(out, start);
    Ok(())
}

fn write_data_table(out: &mut Vec<u8>, sections: &[Section]) -> Result<()> {
    let start = out.len();
    write_varint_u64(out, sections.len() as u64);

    for section in sections {
        out.push(section.encoding().tag());
        write_varint_u64(out, section.rows() as u64);
        write_varint_u64(out, section.data_size() as u64);
        section.write_schema(out);
    }

    append_crc16(out, start);
    Ok(())
}

/// Serializes a complete track file.
///
/// # Errors
///
/// Returns `RwtfError::OutOfRange` when the header + metadata region does
/// not fit the format's 16-bit offsets, and `RwtfError::DecryptFail` when
/// an encrypted section's key was rejected by the cipher.
pub fn write_track(metadata: &[MetadataEntry], sections: &[Section]) -> Result<Vec<u8>> {
    // The metadata table is built first so the header can point past it.
    let mut metadata_buf = Vec::new();
    write_metadata(&mut metadata_buf, metadata)?;

    let metadata_offset = u16::try_from(HEADER_SIZE)?;
    let data_offset = u16::try_from(HEADER_SIZE + metadata_buf.len())?;

    let mut out = Vec::with_capacity(
        HEADER_SIZE
            + metadata_buf.len()
            + sections.iter().map(Section::data_size).sum::<usize>(),
    );
    write_header(&mut out, metadata_offset, data_offset);
    out.extend_from_slice(&metadata_buf);
    write_data_table(&mut out, sections)?;
    for section in sections {
        section.write_body(&mut out)?;
    }

    trace!(
        bytes = out.len(),
        sections = sections.len(),
        "serialized track"
    );
    Ok(out)
}
