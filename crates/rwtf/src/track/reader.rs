//! Lazy, CRC-checked track parsing.
//!
//! [`TrackReader::new`] eagerly parses and verifies everything reachable
//! without decoding a column: the header, the metadata table, and the data
//! table with every section's schema block. Section bodies stay as raw
//! byte ranges until asked for.

use crate::codec::{
    crc16, read_i64, read_u16, read_u32, read_u8, read_varint_len, take,
};
use crate::crypto;
use crate::error::{CrcRegion, Result, RwtfError};
use crate::schema::{DataType, FieldDefinition, Schema, MAX_F64_SCALE};
use crate::section::reader::{decode_column, decode_rows};
use crate::section::SCHEMA_VERSION;
use crate::track::{
    FILE_VERSION, HEADER_SIZE, MAGIC, METADATA_KIND_CREATED_AT, METADATA_KIND_TRACK_TYPE,
};
use crate::types::{MetadataEntry, Row, SectionEncoding, TrackType, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Header {
    file_version: u16,
    creator_version: u16,
    metadata_offset: u16,
    data_offset: u16,
}

fn parse_header(data: &[u8]) -> Result<Header> {
    let mut input = data;
    let magic = take(&mut input, 8)?;
    if magic != MAGIC {
        let mut found = [0u8; 8];
        found.copy_from_slice(magic);
        return Err(RwtfError::BadMagic(found));
    }

    let file_version = read_u16(&mut input)?;
    take(&mut input, 2)?; // fv reserve
    let creator_version = read_u16(&mut input)?;
    take(&mut input, 2)?; // cv reserve
    let metadata_offset = read_u16(&mut input)?;
    let data_offset = read_u16(&mut input)?;
    take(&mut input, 2)?; // e reserve

    let expected = u32::from(read_u16(&mut input)?);
    let computed = u32::from(crc16(&data[..HEADER_SIZE - 2]));
    if expected != computed {
        return Err(RwtfError::CrcMismatch {
            region: CrcRegion::Header,
            expected,
            computed,
        });
    }

    if file_version != FILE_VERSION {
        return Err(RwtfError::BadVersion(file_version));
    }

    Ok(Header {
        file_version,
        creator_version,
        metadata_offset,
        data_offset,
    })
}

/// Parses the metadata table, returning the entries and the table's total
/// size in bytes (CRC included).
fn parse_metadata(input: &[u8]) -> Result<(Vec<MetadataEntry>, usize)> {
    let mut cursor = input;
    let count = read_varint_len(&mut cursor)?;
    let mut entries = Vec::with_capacity(count.min(64));

    for _ in 0..count {
        let kind = read_u8(&mut cursor)?;
        let size = usize::from(read_u16(&mut cursor)?);
        let mut body = take(&mut cursor, size)?;

        match kind {
            METADATA_KIND_TRACK_TYPE => {
                if size != 5 {
                    return Err(RwtfError::BadMetadata(format!(
                        "track_type entry has size {}, expected 5",
                        size
                    )));
                }
                let tag = read_u8(&mut body)?;
                let id = read_u32(&mut body)?;
                let track_type = match tag {
                    0x00 => TrackType::Trip(id),
                    0x01 => TrackType::Route(id),
                    0x02 => TrackType::Segment(id),
                    other => {
                        return Err(RwtfError::BadMetadata(format!(
                            "unknown track type tag {:#04x}",
                            other
                        )))
                    }
                };
                entries.push(MetadataEntry::TrackType(track_type));
            }
            METADATA_KIND_CREATED_AT => {
                if size != 8 {
                    return Err(RwtfError::BadMetadata(format!(
                        "created_at entry has size {}, expected 8",
                        size
                    )));
                }
                entries.push(MetadataEntry::CreatedAt(read_i64(&mut body)?));
            }
            other => {
                return Err(RwtfError::BadMetadata(format!(
                    "unknown entry kind {:#04x}",
                    other
                )))
            }
        }
    }

    let body_len = input.len() - cursor.len();
    let expected = u32::from(read_u16(&mut cursor)?);
    let computed = u32::from(crc16(&input[..body_len]));
    if expected != computed {
        return Err(RwtfError::CrcMismatch {
            region: CrcRegion::Metadata,
            expected,
            computed,
        });
    }

    Ok((entries, body_len + 2))
}

/// One section's index entry: everything from the data table plus the
/// body's offset past the end of the table.
#[derive(Debug)]
struct SectionEntry {
    encoding: SectionEncoding,
    rows: usize,
    data_size: usize,
    schema: Schema,
    column_sizes: Vec<usize>,
    offset: usize,
}

fn parse_schema_block(cursor: &mut &[u8]) -> Result<(Schema, Vec<usize>)> {
    let version = read_u8(cursor)?;
    if version != SCHEMA_VERSION {
        return Err(RwtfError::BadSchema(format!(
            "unknown schema version {}",
            version
        )));
    }

    let field_count = read_varint_len(cursor)?;
    let mut fields = Vec::with_capacity(field_count.min(256));
    let mut column_sizes = Vec::with_capacity(field_count.min(256));

    for _ in 0..field_count {
        let data_type = match read_u8(cursor)? {
            0x00 => DataType::I64,
            0x01 => {
                let scale = read_u8(cursor)?;
                if scale > MAX_F64_SCALE {
                    return Err(RwtfError::BadSchema(format!(
                        "F64 scale {} exceeds maximum {}",
                        scale, MAX_F64_SCALE
                    )));
                }
                DataType::F64 { scale }
            }
            0x02 => DataType::U64,
            0x10 => DataType::Bool,
            0x20 => DataType::String,
            0x21 => DataType::BoolArray,
            0x22 => DataType::U64Array,
            0x23 => DataType::ByteArray,
            other => {
                return Err(RwtfError::BadSchema(format!(
                    "unknown field type tag {:#04x}",
                    other
                )))
            }
        };

        let name_len = read_varint_len(cursor)?;
        let name_bytes = take(cursor, name_len)?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();
        let column_size = read_varint_len(cursor)?;

        fields.push(FieldDefinition::new(name, data_type));
        column_sizes.push(column_size);
    }

    Ok((Schema::with_fields(fields), column_sizes))
}

/// Parses the data table, returning the section index and the table's
/// total size in bytes (CRC included).
fn parse_data_table(input: &[u8]) -> Result<(Vec<SectionEntry>, usize)> {
    let mut cursor = input;
    let count = read_varint_len(&mut cursor)?;
    let mut entries = Vec::with_capacity(count.min(64));
    let mut offset = 0usize;

    for _ in 0..count {
        let encoding = match read_u8(&mut cursor)? {
            0x00 => SectionEncoding::Standard,
            0x01 => SectionEncoding::Encrypted,
            other => {
                return Err(RwtfError::BadSchema(format!(
                    "unknown section encoding {:#04x}",
                    other
                )))
            }
        };
        let rows = read_varint_len(&mut cursor)?;
        let data_size = read_varint_len(&mut cursor)?;
        let (schema, column_sizes) = parse_schema_block(&mut cursor)?;

        entries.push(SectionEntry {
            encoding,
            rows,
            data_size,
            schema,
            column_sizes,
            offset,
        });
        offset = offset
            .checked_add(data_size)
            .ok_or(RwtfError::OutOfRange)?;
    }

    let body_len = input.len() - cursor.len();
    let expected = u32::from(read_u16(&mut cursor)?);
    let computed = u32::from(crc16(&input[..body_len]));
    if expected != computed {
        return Err(RwtfError::CrcMismatch {
            region: CrcRegion::DataTable,
            expected,
            computed,
        });
    }

    Ok((entries, body_len + 2))
}

/// A parsed view over a serialized track.
///
/// The reader borrows its input and decodes section bodies on demand.
/// Decoded rows of standard sections are cached behind an interior lock,
/// so repeated reads are idempotent and a reader can be shared across
/// threads. Encrypted sections are re-opened on every call: the key check
/// must never be answered from a cache.
#[derive(Debug)]
pub struct TrackReader<'a> {
    header: Header,
    metadata_entries: Vec<MetadataEntry>,
    sections: Vec<SectionEntry>,
    data_start: &'a [u8],
    cache: Mutex<HashMap<usize, Arc<Vec<Row>>>>,
}

impl<'a> TrackReader<'a> {
    /// Parses a track's header, metadata table, and data table, verifying
    /// every CRC reachable without decoding a column.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = parse_header(data)?;

        if usize::from(header.metadata_offset) != HEADER_SIZE {
            return Err(RwtfError::BadMetadata(format!(
                "metadata table offset {} disagrees with the header size {}",
                header.metadata_offset, HEADER_SIZE
            )));
        }
        let (metadata_entries, metadata_len) = parse_metadata(&data[HEADER_SIZE..])?;

        let data_offset = usize::from(header.data_offset);
        if data_offset != HEADER_SIZE + metadata_len {
            return Err(RwtfError::BadMetadata(format!(
                "data offset {} disagrees with the metadata region end {}",
                data_offset,
                HEADER_SIZE + metadata_len
            )));
        }
        let (sections, table_len) = parse_data_table(&data[data_offset..])?;
        let data_start = &data[data_offset + table_len..];

        Ok(Self {
            header,
            metadata_entries,
            sections,
            data_start,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// The file format version.
    pub fn file_version(&self) -> u16 {
        self.header.file_version
    }

    /// The version of the library that wrote the file.
    pub fn creator_version(&self) -> u16 {
        self.header.creator_version
    }

    /// Metadata entries in file order.
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata_entries
    }

    /// Number of sections in the data table.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn entry(&self, index: usize) -> Result<&SectionEntry> {
        self.sections.get(index).ok_or(RwtfError::SectionIndex {
            index,
            count: self.sections.len(),
        })
    }

    fn section_body(&self, entry: &SectionEntry) -> Result<&'a [u8]> {
        self.data_start
            .get(entry.offset..entry.offset + entry.data_size)
            .ok_or(RwtfError::TruncatedInput)
    }

    /// How section `index`'s body is encoded.
    pub fn section_encoding(&self, index: usize) -> Result<SectionEncoding> {
        Ok(self.entry(index)?.encoding)
    }

    /// Section `index`'s persisted (trimmed) schema.
    pub fn section_schema(&self, index: usize) -> Result<&Schema> {
        Ok(&self.entry(index)?.schema)
    }

    /// Number of rows in section `index`.
    pub fn section_rows(&self, index: usize) -> Result<usize> {
        Ok(self.entry(index)?.rows)
    }

    /// Decodes section `index` into rows.
    ///
    /// `key` is required for encrypted sections and ignored for standard
    /// ones. With a `projection` schema only columns matching in both name
    /// and type are decoded; a name match with a different type yields no
    /// values for that field.
    pub fn section_data(
        &self,
        index: usize,
        key: Option<&[u8]>,
        projection: Option<&Schema>,
    ) -> Result<Vec<Row>> {
        let entry = self.entry(index)?;
        let body = self.section_body(entry)?;

        match entry.encoding {
            SectionEncoding::Standard => {
                if projection.is_some() {
                    return decode_rows(
                        &entry.schema,
                        &entry.column_sizes,
                        entry.rows,
                        body,
                        projection,
                    );
                }

                let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(rows) = cache.get(&index) {
                    return Ok(rows.as_ref().clone());
                }
                let rows =
                    decode_rows(&entry.schema, &entry.column_sizes, entry.rows, body, None)?;
                cache.insert(index, Arc::new(rows.clone()));
                Ok(rows)
            }
            SectionEncoding::Encrypted => {
                let key = key.ok_or(RwtfError::DecryptFail)?;
                let plain = crypto::open(key, body)?;
                decode_rows(
                    &entry.schema,
                    &entry.column_sizes,
                    entry.rows,
                    &plain,
                    projection,
                )
            }
        }
    }

    /// Decodes one named column of section `index` as one optional value
    /// per row.
    ///
    /// Returns `Ok(None)` when the persisted schema has no field named
    /// `name`. `key` is required for encrypted sections and ignored for
    /// standard ones.
    pub fn section_column(
        &self,
        index: usize,
        name: &str,
        key: Option<&[u8]>,
    ) -> Result<Option<Vec<Option<Value>>>> {
        let entry = self.entry(index)?;
        let Some(field_index) = entry
            .schema
            .fields()
            .iter()
            .position(|field| field.name() == name)
        else {
            return Ok(None);
        };

        let body = self.section_body(entry)?;
        let cells = match entry.encoding {
            SectionEncoding::Standard => decode_column(
                &entry.schema,
                &entry.column_sizes,
                entry.rows,
                body,
                field_index,
            )?,
            SectionEncoding::Encrypted => {
                let key = key.ok_or(RwtfError::DecryptFail)?;
                let plain = crypto::open(key, body)?;
                decode_column(
                    &entry.schema,
                    &entry.column_sizes,
                    entry.rows,
                    &plain,
                    field_index,
                )?
            }
        };
        Ok(Some(cells))
    }
}
