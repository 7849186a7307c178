//! Column-to-row rebuild for parsed section bodies.
//!
//! The body layout is documented in the parent module. Every read
//! validates the presence bitmap first, then walks columns in schema
//! order using the per-column sizes recorded in the data table, so a
//! single column can be decoded without touching its neighbors.

use crate::codec::decoders::ColumnDecoder;
use crate::codec::{crc32, read_u32, take};
use crate::error::{CrcRegion, Result, RwtfError};
use crate::schema::Schema;
use crate::types::{Row, Value};

const CRC_BYTES: usize = 4;

/// A validated presence bitmap.
struct PresenceView<'a> {
    data: &'a [u8],
    stride: usize,
}

impl PresenceView<'_> {
    fn get(&self, row: usize, field: usize) -> bool {
        self.data[row * self.stride + field / 8] & (1 << (field % 8)) != 0
    }
}

/// Splits off and CRC-checks the presence bitmap, leaving the cursor at
/// the first column.
fn validate_presence<'a>(
    input: &mut &'a [u8],
    fields: usize,
    rows: usize,
) -> Result<PresenceView<'a>> {
    let stride = fields.div_ceil(8);
    let data = take(input, stride * rows)?;
    let expected = read_u32(input)?;
    let computed = crc32(data);
    if expected != computed {
        return Err(RwtfError::CrcMismatch {
            region: CrcRegion::Presence,
            expected,
            computed,
        });
    }
    Ok(PresenceView { data, stride })
}

/// Splits off column `index`'s data bytes and validates its CRC.
fn validate_column<'a>(input: &mut &'a [u8], size: usize, index: usize) -> Result<&'a [u8]> {
    if size < CRC_BYTES {
        return Err(RwtfError::TruncatedInput);
    }
    let mut column = take(input, size)?;
    let data = take(&mut column, size - CRC_BYTES)?;
    let expected = read_u32(&mut column)?;
    let computed = crc32(data);
    if expected != computed {
        return Err(RwtfError::CrcMismatch {
            region: CrcRegion::Column(index),
            expected,
            computed,
        });
    }
    Ok(data)
}

fn decode_cells(
    presence: &PresenceView<'_>,
    field_index: usize,
    rows: usize,
    mut decoder: ColumnDecoder<'_>,
) -> Result<Vec<Option<Value>>> {
    let mut cells = Vec::with_capacity(rows);
    for row in 0..rows {
        if presence.get(row, field_index) {
            cells.push(Some(decoder.decode()?));
        } else {
            cells.push(None);
        }
    }
    Ok(cells)
}

/// Decodes a section body into rows.
///
/// With a projection schema only matching columns (same name, exactly the
/// same type) are decoded; everything else is skipped over by size. Absent
/// presence bits produce no key, so null and absent collapse to the same
/// output.
pub(crate) fn decode_rows(
    schema: &Schema,
    column_sizes: &[usize],
    rows: usize,
    body: &[u8],
    projection: Option<&Schema>,
) -> Result<Vec<Row>> {
    let mut input = body;
    let presence = validate_presence(&mut input, schema.fields().len(), rows)?;

    let mut columns: Vec<(&str, Vec<Option<Value>>)> = Vec::new();
    for (index, (field, &size)) in schema.fields().iter().zip(column_sizes).enumerate() {
        let wanted = projection.map_or(true, |p| p.contains(field));
        if !wanted {
            take(&mut input, size)?;
            continue;
        }
        let data = validate_column(&mut input, size, index)?;
        let decoder = ColumnDecoder::new(field.data_type(), data);
        columns.push((field.name(), decode_cells(&presence, index, rows, decoder)?));
    }

    let mut out: Vec<Row> = (0..rows).map(|_| Row::new()).collect();
    for (name, cells) in columns {
        for (row, cell) in cells.into_iter().enumerate() {
            if let Some(value) = cell {
                out[row].insert(name.to_string(), value);
            }
        }
    }
    Ok(out)
}

/// Decodes a single column as one optional value per row.
pub(crate) fn decode_column(
    schema: &Schema,
    column_sizes: &[usize],
    rows: usize,
    body: &[u8],
    field_index: usize,
) -> Result<Vec<Option<Value>>> {
    let mut input = body;
    let presence = validate_presence(&mut input, schema.fields().len(), rows)?;

    for &size in &column_sizes[..field_index] {
        take(&mut input, size)?;
    }
    let size = column_sizes
        .get(field_index)
        .copied()
        .ok_or(RwtfError::TruncatedInput)?;
    let data = validate_column(&mut input, size, field_index)?;

    let field = &schema.fields()[field_index];
    let decoder = ColumnDecoder::new(field.data_type(), data);
    decode_cells(&presence, field_index, rows, decoder)
}
