//! Row-to-column projection and section serialization.
//!
//! A [`Section`] is built from row maps up front: every value is coerced
//! into its field's declared type, type-specific encoders fill one buffer
//! per column, and fields that never receive a storable value are trimmed
//! from the persisted schema. Values a column cannot store are dropped
//! silently (the row keeps its other fields); drops are reported through
//! `tracing` rather than errors.

use crate::codec::append_crc32;
use crate::codec::encoders::{
    BoolArrayEncoder, BoolEncoder, BytesEncoder, Encoder, F64Encoder, I64Encoder, U64ArrayEncoder,
    U64Encoder,
};
use crate::codec::write_varint_u64;
use crate::crypto;
use crate::error::Result;
use crate::schema::{DataType, FieldDefinition, Schema};
use crate::section::SCHEMA_VERSION;
use crate::types::{Row, SectionEncoding, Value};
use tracing::{debug, trace};

const CRC_BYTES: usize = 4;

fn in_i64_range(v: f64) -> bool {
    v >= i64::MIN as f64 && v < i64::MAX as f64
}

fn in_u64_range(v: f64) -> bool {
    v >= 0.0 && v < u64::MAX as f64
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::I64(v) => Some(*v),
        Value::U64(v) => i64::try_from(*v).ok(),
        Value::F64(v) if v.is_finite() && in_i64_range(*v) => Some(*v as i64),
        _ => None,
    }
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::U64(v) => Some(*v),
        Value::I64(v) => u64::try_from(*v).ok(),
        Value::F64(v) if v.is_finite() && in_u64_range(*v) => Some(*v as u64),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::F64(v) if v.is_finite() => Some(*v),
        Value::I64(v) => Some(*v as f64),
        Value::U64(v) => Some(*v as f64),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(v) => Some(*v),
        _ => None,
    }
}

fn coerce_bytes(value: &Value) -> Option<&[u8]> {
    match value {
        Value::String(v) => Some(v.as_bytes()),
        Value::Bytes(v) => Some(v.as_slice()),
        _ => None,
    }
}

fn coerce_bool_array(value: &Value) -> Option<&[bool]> {
    match value {
        Value::BoolArray(v) => Some(v.as_slice()),
        _ => None,
    }
}

fn coerce_u64_array(value: &Value) -> Option<&[u64]> {
    match value {
        Value::U64Array(v) => Some(v.as_slice()),
        _ => None,
    }
}

#[derive(Debug)]
struct BufferImpl<E: Encoder> {
    buf: Vec<u8>,
    presence: Vec<bool>,
    encoder: E,
}

impl<E: Encoder> BufferImpl<E> {
    fn new(encoder: E) -> Self {
        Self {
            encoder,
            presence: Vec::new(),
            buf: Vec::new(),
        }
    }

    fn encode(&mut self, value: Option<&E::T>) {
        self.encoder.encode(value, &mut self.buf, &mut self.presence);
    }
}

/// One column's buffered bytes and presence bits, typed by the schema.
#[derive(Debug)]
enum ColumnBuffer {
    I64(BufferImpl<I64Encoder>),
    U64(BufferImpl<U64Encoder>),
    F64(BufferImpl<F64Encoder>),
    Bool(BufferImpl<BoolEncoder>),
    String(BufferImpl<BytesEncoder>),
    BoolArray(BufferImpl<BoolArrayEncoder>),
    U64Array(BufferImpl<U64ArrayEncoder>),
    ByteArray(BufferImpl<BytesEncoder>),
}

impl ColumnBuffer {
    fn new(data_type: &DataType) -> Self {
        match data_type {
            DataType::I64 => Self::I64(BufferImpl::new(I64Encoder::default())),
            DataType::U64 => Self::U64(BufferImpl::new(U64Encoder::default())),
            DataType::F64 { scale } => Self::F64(BufferImpl::new(F64Encoder::new(*scale))),
            DataType::Bool => Self::Bool(BufferImpl::new(BoolEncoder)),
            DataType::String => Self::String(BufferImpl::new(BytesEncoder)),
            DataType::BoolArray => Self::BoolArray(BufferImpl::new(BoolArrayEncoder)),
            DataType::U64Array => Self::U64Array(BufferImpl::new(U64ArrayEncoder)),
            DataType::ByteArray => Self::ByteArray(BufferImpl::new(BytesEncoder)),
        }
    }

    /// Coerces and appends one cell for this column.
    fn encode(&mut self, field: &FieldDefinition, value: Option<&Value>) {
        let had_value = value.is_some();
        match self {
            Self::I64(b) => {
                let coerced = value.and_then(coerce_i64);
                b.encode(coerced.as_ref());
            }
            Self::U64(b) => {
                let coerced = value.and_then(coerce_u64);
                b.encode(coerced.as_ref());
            }
            Self::F64(b) => {
                let coerced = value.and_then(coerce_f64);
                b.encode(coerced.as_ref());
            }
            Self::Bool(b) => {
                let coerced = value.and_then(coerce_bool);
                b.encode(coerced.as_ref());
            }
            Self::String(b) => b.encode(value.and_then(coerce_bytes)),
            Self::BoolArray(b) => b.encode(value.and_then(coerce_bool_array)),
            Self::U64Array(b) => b.encode(value.and_then(coerce_u64_array)),
            Self::ByteArray(b) => b.encode(value.and_then(coerce_bytes)),
        }
        if had_value && self.is_present(self.cells() - 1) != Some(true) {
            debug!(
                field = field.name(),
                "dropped a value the declared column type cannot store"
            );
        }
    }

    fn cells(&self) -> usize {
        match self {
            Self::I64(b) => b.presence.len(),
            Self::U64(b) => b.presence.len(),
            Self::F64(b) => b.presence.len(),
            Self::Bool(b) => b.presence.len(),
            Self::String(b) => b.presence.len(),
            Self::BoolArray(b) => b.presence.len(),
            Self::U64Array(b) => b.presence.len(),
            Self::ByteArray(b) => b.presence.len(),
        }
    }

    fn is_present(&self, row: usize) -> Option<bool> {
        match self {
            Self::I64(b) => b.presence.get(row).copied(),
            Self::U64(b) => b.presence.get(row).copied(),
            Self::F64(b) => b.presence.get(row).copied(),
            Self::Bool(b) => b.presence.get(row).copied(),
            Self::String(b) => b.presence.get(row).copied(),
            Self::BoolArray(b) => b.presence.get(row).copied(),
            Self::U64Array(b) => b.presence.get(row).copied(),
            Self::ByteArray(b) => b.presence.get(row).copied(),
        }
    }

    fn has_any_value(&self) -> bool {
        match self {
            Self::I64(b) => b.presence.iter().any(|&p| p),
            Self::U64(b) => b.presence.iter().any(|&p| p),
            Self::F64(b) => b.presence.iter().any(|&p| p),
            Self::Bool(b) => b.presence.iter().any(|&p| p),
            Self::String(b) => b.presence.iter().any(|&p| p),
            Self::BoolArray(b) => b.presence.iter().any(|&p| p),
            Self::U64Array(b) => b.presence.iter().any(|&p| p),
            Self::ByteArray(b) => b.presence.iter().any(|&p| p),
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Self::I64(b) => &b.buf,
            Self::U64(b) => &b.buf,
            Self::F64(b) => &b.buf,
            Self::Bool(b) => &b.buf,
            Self::String(b) => &b.buf,
            Self::BoolArray(b) => &b.buf,
            Self::U64Array(b) => &b.buf,
            Self::ByteArray(b) => &b.buf,
        }
    }

    /// Bytes this column occupies on the wire, CRC included.
    fn data_size(&self) -> usize {
        self.bytes().len() + CRC_BYTES
    }
}

#[derive(Debug)]
enum SectionKind {
    Standard,
    Encrypted { key: Vec<u8> },
}

/// A buffered, schema-typed block of rows ready to be written to a track.
///
/// The persisted schema is already trimmed: it holds exactly the fields
/// that received at least one storable value.
#[derive(Debug)]
pub struct Section {
    kind: SectionKind,
    rows_written: usize,
    schema: Schema,
    column_data: Vec<ColumnBuffer>,
}

impl Section {
    /// Builds a standard (in-the-clear) section from rows.
    ///
    /// Values that cannot coerce into their field's declared type are
    /// dropped from that field only; the row's other fields are kept.
    pub fn standard(schema: Schema, rows: &[Row]) -> Self {
        Self::build(SectionKind::Standard, schema, rows)
    }

    /// Builds an encrypted section from rows.
    ///
    /// # Errors
    ///
    /// Returns `RwtfError::DecryptFail` unless `key_material` is exactly
    /// 32 bytes.
    pub fn encrypted(schema: Schema, rows: &[Row], key_material: &[u8]) -> Result<Self> {
        crypto::check_key(key_material)?;
        Ok(Self::build(
            SectionKind::Encrypted {
                key: key_material.to_vec(),
            },
            schema,
            rows,
        ))
    }

    fn build(kind: SectionKind, schema: Schema, rows: &[Row]) -> Self {
        let mut column_data: Vec<ColumnBuffer> = schema
            .fields()
            .iter()
            .map(|field| ColumnBuffer::new(field.data_type()))
            .collect();

        for row in rows {
            for (field, buffer) in schema.fields().iter().zip(column_data.iter_mut()) {
                buffer.encode(field, row.get(field.name()));
            }
        }

        // Trim fields no row populated: they contribute neither a schema
        // entry nor a presence bit on the wire.
        let (kept_fields, kept_columns): (Vec<_>, Vec<_>) = schema
            .fields()
            .iter()
            .cloned()
            .zip(column_data)
            .filter(|(_, buffer)| buffer.has_any_value())
            .unzip();

        trace!(
            rows = rows.len(),
            fields = kept_fields.len(),
            "buffered section columns"
        );

        Self {
            kind,
            rows_written: rows.len(),
            schema: Schema::with_fields(kept_fields),
            column_data: kept_columns,
        }
    }

    /// The trimmed schema this section will persist.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// How this section's body is encoded on disk.
    pub fn encoding(&self) -> SectionEncoding {
        match self.kind {
            SectionKind::Standard => SectionEncoding::Standard,
            SectionKind::Encrypted { .. } => SectionEncoding::Encrypted,
        }
    }

    /// Number of rows, populated or not.
    pub fn rows(&self) -> usize {
        self.rows_written
    }

    fn presence_stride(&self) -> usize {
        self.column_data.len().div_ceil(8)
    }

    fn plain_size(&self) -> usize {
        let presence = self.presence_stride() * self.rows_written + CRC_BYTES;
        let columns: usize = self.column_data.iter().map(ColumnBuffer::data_size).sum();
        presence + columns
    }

    /// On-disk body size, including encryption overhead when sealed.
    pub(crate) fn data_size(&self) -> usize {
        match self.kind {
            SectionKind::Standard => self.plain_size(),
            SectionKind::Encrypted { .. } => {
                self.plain_size() + crypto::NONCE_SIZE + crypto::TAG_SIZE
            }
        }
    }

    /// Appends this section's schema block to a data table buffer.
    pub(crate) fn write_schema(&self, out: &mut Vec<u8>) {
        out.push(SCHEMA_VERSION);
        write_varint_u64(out, self.schema.fields().len() as u64);

        for (field, buffer) in self.schema.fields().iter().zip(self.column_data.iter()) {
            match field.data_type() {
                DataType::F64 { scale } => {
                    out.push(field.data_type().tag());
                    out.push(*scale);
                }
                data_type => out.push(data_type.tag()),
            }
            write_varint_u64(out, field.name().len() as u64);
            out.extend_from_slice(field.name().as_bytes());
            write_varint_u64(out, buffer.data_size() as u64);
        }
    }

    fn write_presence(&self, out: &mut Vec<u8>) {
        let start = out.len();
        let stride = self.presence_stride();

        for row in 0..self.rows_written {
            let mut row_bytes = vec![0u8; stride];
            for (f, buffer) in self.column_data.iter().enumerate() {
                if buffer.is_present(row) == Some(true) {
                    row_bytes[f / 8] |= 1 << (f % 8);
                }
            }
            out.extend_from_slice(&row_bytes);
        }
        append_crc32(out, start);
    }

    fn write_columns(&self, out: &mut Vec<u8>) {
        self.write_presence(out);
        for buffer in &self.column_data {
            let start = out.len();
            out.extend_from_slice(buffer.bytes());
            append_crc32(out, start);
        }
    }

    /// Appends the on-disk section body, sealing it first when encrypted.
    pub(crate) fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        match &self.kind {
            SectionKind::Standard => {
                self.write_columns(out);
                Ok(())
            }
            SectionKind::Encrypted { key } => {
                let mut plain = Vec::with_capacity(self.plain_size());
                self.write_columns(&mut plain);
                let sealed = crypto::seal(key, &plain)?;
                out.extend_from_slice(&sealed);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RwtfError;
    use assert_matches::assert_matches;
    use std::collections::BTreeMap;

    fn row(cells: &[(&str, Value)]) -> Row {
        cells
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn test_i64_column_bytes() {
        let schema = Schema::with_fields(vec![FieldDefinition::new("a", DataType::I64)]);
        let rows = vec![
            row(&[("a", Value::I64(0))]),
            row(&[]),
            row(&[("a", Value::I64(40))]),
            row(&[("a", Value::I64(-40))]),
        ];
        let section = Section::standard(schema, &rows);

        let mut buf = Vec::new();
        section.write_body(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf, [
            // Presence bitmap
            0b00000001,
            0b00000000,
            0b00000001,
            0b00000001,
            0x58, // crc
            0x64,
            0x4E,
            0x32,

            // Data column
            0x00, // 0
            0x28, // +40
            0xB0, // -80
            0x7F,
            0xAB, // crc
            0x03,
            0xAE,
            0x67,
        ]);
    }

    #[test]
    fn test_bool_column_bytes() {
        let schema = Schema::with_fields(vec![FieldDefinition::new("a", DataType::Bool)]);
        let rows = vec![
            row(&[("a", Value::Bool(true))]),
            row(&[]),
            row(&[("a", Value::Bool(false))]),
        ];
        let section = Section::standard(schema, &rows);

        let mut buf = Vec::new();
        section.write_body(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf, [
            // Presence bitmap
            0x01,
            0x00,
            0x01,
            0xCF, // crc
            0x33,
            0x82,
            0x4D,

            // Data column
            0x01, // true
            0x00, // false
            0x5E, // crc
            0x5A,
            0x51,
            0x2D,
        ]);
    }

    #[test]
    fn test_string_column_bytes() {
        let schema = Schema::with_fields(vec![FieldDefinition::new("a", DataType::String)]);
        let rows = vec![
            row(&[("a", Value::String("RWGPS".to_string()))]),
            row(&[]),
            row(&[(
                "a",
                Value::String("Supercalifragilisticexpialidocious".to_string()),
            )]),
        ];
        let section = Section::standard(schema, &rows);

        let mut buf = Vec::new();
        section.write_body(&mut buf).unwrap();

        let mut expected = vec![
            // Presence bitmap
            0x01, 0x00, 0x01, 0xCF, 0x33, 0x82, 0x4D,
            // Data column
            0x05,
        ];
        expected.extend_from_slice(b"RWGPS");
        expected.push(0x22);
        expected.extend_from_slice(b"Supercalifragilisticexpialidocious");
        expected.extend_from_slice(&[0xC2, 0x88, 0x97, 0xF3]); // crc
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_f64_column_bytes() {
        let schema = Schema::with_fields(vec![FieldDefinition::new(
            "a",
            DataType::F64 { scale: 7 },
        )]);
        let rows = vec![
            row(&[("a", Value::F64(0.0003))]),
            row(&[]),
            row(&[("a", Value::F64(-27.2))]),
        ];
        let section = Section::standard(schema, &rows);

        let mut buf = Vec::new();
        section.write_body(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf, [
            // Presence bitmap
            0x01,
            0x00,
            0x01,
            0xCF, // crc
            0x33,
            0x82,
            0x4D,

            // Data column: 2999, then down to -272000000
            0xB7,
            0x17,
            0xC9,
            0xA0,
            0xA6,
            0xFE,
            0x7E,
            0xAF, // crc
            0x4E,
            0x38,
            0xBE,
        ]);
    }

    #[test]
    fn test_presence_bitmap_patterns() {
        let schema = Schema::with_fields(vec![
            FieldDefinition::new("a", DataType::I64),
            FieldDefinition::new("b", DataType::Bool),
            FieldDefinition::new("c", DataType::String),
        ]);
        let rows = vec![
            row(&[("a", Value::I64(42)), ("b", Value::Bool(true))]),
            row(&[("a", Value::I64(0)), ("c", Value::String("hi".into()))]),
            row(&[("b", Value::Bool(false)), ("c", Value::String("rwtf".into()))]),
            row(&[
                ("a", Value::I64(-20)),
                ("b", Value::Bool(false)),
                ("c", Value::String("!".into())),
            ]),
        ];
        let section = Section::standard(schema, &rows);

        let mut buf = Vec::new();
        section.write_presence(&mut buf);
        #[rustfmt::skip]
        assert_eq!(buf, [0b00000011,
                         0b00000101,
                         0b00000110,
                         0b00000111,
                         0xD2, // crc
                         0x61,
                         0xA7,
                         0xA5]);
    }

    #[test]
    fn test_schema_block_bytes() {
        let schema = Schema::with_fields(vec![
            FieldDefinition::new("m", DataType::I64),
            FieldDefinition::new("k", DataType::Bool),
            FieldDefinition::new("long name!", DataType::String),
            FieldDefinition::new("f", DataType::F64 { scale: 7 }),
            FieldDefinition::new("ab", DataType::BoolArray),
            FieldDefinition::new("u", DataType::U64),
            FieldDefinition::new("au", DataType::U64Array),
            FieldDefinition::new("abyte", DataType::ByteArray),
        ]);
        let rows = vec![row(&[
            ("m", Value::I64(500)),
            ("k", Value::Bool(false)),
            ("long name!", Value::String("Hello!".to_string())),
            ("f", Value::F64(0.0042)),
            ("ab", Value::BoolArray(vec![true, false, true])),
            ("u", Value::U64(2112)),
            ("au", Value::U64Array(vec![1, 30, 12])),
            ("abyte", Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF])),
        ])];
        let section = Section::standard(schema, &rows);

        let mut buf = Vec::new();
        section.write_schema(&mut buf);
        #[rustfmt::skip]
        assert_eq!(buf,
                   [0x00, // schema version
                    0x08, // entry count
                    0x00, // I64
                    0x01, // name len
                    b'm',
                    0x06, // data size
                    0x10, // Bool
                    0x01,
                    b'k',
                    0x05,
                    0x20, // String
                    0x0A,
                    b'l', b'o', b'n', b'g', b' ', b'n', b'a', b'm', b'e', b'!',
                    0x0B,
                    0x01, // F64
                    0x07, // scale
                    0x01,
                    b'f',
                    0x07,
                    0x21, // BoolArray
                    0x02,
                    b'a', b'b',
                    0x08,
                    0x02, // U64
                    0x01,
                    b'u',
                    0x06,
                    0x22, // U64Array
                    0x02,
                    b'a', b'u',
                    0x08,
                    0x23, // ByteArray
                    0x05,
                    b'a', b'b', b'y', b't', b'e',
                    0x09]);
    }

    #[test]
    fn test_full_body_bytes() {
        let schema = Schema::with_fields(vec![
            FieldDefinition::new("a", DataType::I64),
            FieldDefinition::new("b", DataType::Bool),
            FieldDefinition::new("c", DataType::String),
            FieldDefinition::new("d", DataType::F64 { scale: 7 }),
            FieldDefinition::new("e", DataType::BoolArray),
            FieldDefinition::new("f", DataType::U64),
            FieldDefinition::new("g", DataType::U64Array),
            FieldDefinition::new("h", DataType::ByteArray),
        ]);
        let rows = vec![
            row(&[
                ("a", Value::I64(1)),
                ("b", Value::Bool(false)),
                ("c", Value::String("Ride".to_string())),
                ("d", Value::F64(0.0)),
                ("g", Value::U64Array(vec![50, 49])),
            ]),
            row(&[
                ("a", Value::I64(2)),
                ("c", Value::String("with".to_string())),
                ("e", Value::BoolArray(vec![true, false])),
                ("f", Value::U64(20)),
            ]),
            row(&[
                ("a", Value::I64(4)),
                ("b", Value::Bool(true)),
                ("c", Value::String("GPS".to_string())),
                ("d", Value::F64(2112.90125)),
                ("f", Value::U64(18)),
                ("g", Value::U64Array(vec![1, 2, 3])),
                ("h", Value::Bytes(vec![0, 1])),
            ]),
        ];
        let section = Section::standard(schema, &rows);

        let mut buf = Vec::new();
        section.write_body(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf, [
            // Presence bitmap
            0b01001111,
            0b00110101,
            0b11101111,
            0x16, // crc
            0x56,
            0x57,
            0x6F,

            // Column 1 = I64
            0x01, // 1
            0x01, // 2
            0x02, // 4
            0xCA, // crc
            0xD4,
            0xD8,
            0x92,

            // Column 2 = Bool
            0x00, // false
            0x01, // true
            0x35, // crc
            0x86,
            0x89,
            0xFB,

            // Column 3 = String
            0x04,
            b'R', b'i', b'd', b'e',
            0x04,
            b'w', b'i', b't', b'h',
            0x03,
            b'G', b'P', b'S',
            0xA3, // crc
            0x02,
            0xEC,
            0x48,

            // Column 4 = F64
            0x00, // 0.0
            0x94, // 2112.90125
            0xCA,
            0x8C,
            0xDB,
            0xCE,
            0x00,
            0xF0, // crc
            0xA4,
            0x8A,
            0xDD,

            // Column 5 = BoolArray
            0x02,
            0x01,
            0x00,
            0x2D, // crc
            0x1A,
            0x33,
            0x99,

            // Column 6 = U64
            0x14, // 20
            0x7E, // -2
            0xD5, // crc
            0x9C,
            0x07,
            0x76,

            // Column 7 = U64Array
            0x02,
            0x32, // 50
            0x7F, // -1
            0x03,
            0x01, // 1
            0x01, // +1
            0x01, // +1
            0xE8, // crc
            0x5D,
            0x06,
            0x83,

            // Column 8 = ByteArray
            0x02,
            0x00,
            0x01,
            0x46, // crc
            0xC6,
            0xEB,
            0x4F,
        ]);
    }

    #[test]
    fn test_schema_trimming() {
        let schema = Schema::with_fields(vec![
            FieldDefinition::new("present", DataType::I64),
            FieldDefinition::new("never", DataType::Bool),
            FieldDefinition::new("mismatched", DataType::Bool),
        ]);
        let rows = vec![
            row(&[("present", Value::I64(1))]),
            // A value of the wrong variant never survives coercion, so the
            // field trims away just like a never-written one.
            row(&[("present", Value::I64(2)), ("mismatched", Value::I64(9))]),
        ];
        let section = Section::standard(schema, &rows);

        assert_eq!(section.schema().fields().len(), 1);
        assert_eq!(section.schema().fields()[0].name(), "present");
        assert_eq!(section.rows(), 2);
    }

    #[test]
    fn test_coercion_matrix() {
        assert_eq!(coerce_i64(&Value::F64(2.9)), Some(2));
        assert_eq!(coerce_i64(&Value::F64(-2.9)), Some(-2));
        assert_eq!(coerce_i64(&Value::F64(1e19)), None);
        assert_eq!(coerce_i64(&Value::U64(u64::MAX)), None);
        assert_eq!(coerce_i64(&Value::U64(7)), Some(7));
        assert_eq!(coerce_i64(&Value::Bool(true)), None);

        assert_eq!(coerce_u64(&Value::I64(-1)), None);
        assert_eq!(coerce_u64(&Value::I64(1)), Some(1));
        assert_eq!(coerce_u64(&Value::F64(-0.5)), None);
        assert_eq!(coerce_u64(&Value::F64(3.7)), Some(3));
        assert_eq!(coerce_u64(&Value::F64(2e19)), None);

        assert_eq!(coerce_f64(&Value::I64(-3)), Some(-3.0));
        assert_eq!(coerce_f64(&Value::U64(3)), Some(3.0));
        assert_eq!(coerce_f64(&Value::F64(f64::NAN)), None);
        assert_eq!(coerce_f64(&Value::F64(f64::INFINITY)), None);

        assert_eq!(coerce_bool(&Value::I64(1)), None);
        assert_eq!(coerce_bool(&Value::Bool(false)), Some(false));

        assert_eq!(
            coerce_bytes(&Value::Bytes(vec![1, 2])),
            Some([1u8, 2].as_slice())
        );
        assert_eq!(
            coerce_bytes(&Value::String("hi".to_string())),
            Some(b"hi".as_slice())
        );
        assert_eq!(coerce_bytes(&Value::I64(0)), None);
    }

    #[test]
    fn test_encrypted_requires_32_byte_key() {
        let schema = Schema::with_fields(vec![FieldDefinition::new("a", DataType::I64)]);
        assert_matches!(
            Section::encrypted(schema.clone(), &[], b"too short"),
            Err(RwtfError::DecryptFail)
        );
        assert!(Section::encrypted(schema, &[], b"01234567890123456789012345678901").is_ok());
    }

    #[test]
    fn test_encrypted_data_size_includes_seal_overhead() {
        let schema = Schema::with_fields(vec![FieldDefinition::new("a", DataType::I64)]);
        let rows = vec![row(&[("a", Value::I64(1))])];
        let standard = Section::standard(schema.clone(), &rows);
        let encrypted =
            Section::encrypted(schema, &rows, b"01234567890123456789012345678901").unwrap();

        assert_eq!(encrypted.data_size(), standard.data_size() + 24 + 16);

        let mut buf = Vec::new();
        encrypted.write_body(&mut buf).unwrap();
        assert_eq!(buf.len(), encrypted.data_size());
    }

    #[test]
    fn test_empty_section() {
        let section = Section::standard(Schema::default(), &[]);
        let mut buf = Vec::new();
        section.write_body(&mut buf).unwrap();
        // Just the empty presence bitmap's CRC.
        assert_eq!(buf, [0x00, 0x00, 0x00, 0x00]);
        assert_eq!(section.data_size(), 4);
    }
}
