//! Per-type column decoders.
//!
//! A decoder owns one column's validated byte stream (CRC already checked
//! and stripped) and yields one [`Value`] per call. The caller drives it
//! with the presence bitmap: `decode` is called exactly once per set bit,
//! in row order, because absent cells occupy no bytes.

use crate::codec::{read_u8, read_varint_i64, read_varint_len, take};
use crate::error::{Result, RwtfError};
use crate::schema::DataType;
use crate::types::Value;

fn read_bool_byte(input: &mut &[u8]) -> Result<bool> {
    match read_u8(input)? {
        0x00 => Ok(false),
        0x01 => Ok(true),
        other => Err(RwtfError::BadValue(format!(
            "expected a bool byte, found {:#04x}",
            other
        ))),
    }
}

fn read_length_prefixed<'a>(input: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read_varint_len(input)?;
    take(input, len)
}

/// Decodes one column's cells in presence order.
#[derive(Debug)]
pub(crate) enum ColumnDecoder<'a> {
    I64 { data: &'a [u8], prev: i64 },
    U64 { data: &'a [u8], prev: u64 },
    F64 { data: &'a [u8], prev: i64, factor: f64 },
    Bool { data: &'a [u8] },
    String { data: &'a [u8] },
    BoolArray { data: &'a [u8] },
    U64Array { data: &'a [u8] },
    ByteArray { data: &'a [u8] },
}

impl<'a> ColumnDecoder<'a> {
    /// Wraps a validated column byte stream for the given declared type.
    pub(crate) fn new(data_type: &DataType, data: &'a [u8]) -> Self {
        match data_type {
            DataType::I64 => Self::I64 { data, prev: 0 },
            DataType::U64 => Self::U64 { data, prev: 0 },
            DataType::F64 { scale } => Self::F64 {
                data,
                prev: 0,
                factor: 10_f64.powi(i32::from(*scale)),
            },
            DataType::Bool => Self::Bool { data },
            DataType::String => Self::String { data },
            DataType::BoolArray => Self::BoolArray { data },
            DataType::U64Array => Self::U64Array { data },
            DataType::ByteArray => Self::ByteArray { data },
        }
    }

    /// Decodes the next present cell.
    pub(crate) fn decode(&mut self) -> Result<Value> {
        match self {
            Self::I64 { data, prev } => {
                let delta = read_varint_i64(data)?;
                *prev = prev.wrapping_add(delta);
                Ok(Value::I64(*prev))
            }
            Self::U64 { data, prev } => {
                let delta = read_varint_i64(data)?;
                *prev = prev.wrapping_add(delta as u64);
                Ok(Value::U64(*prev))
            }
            Self::F64 { data, prev, factor } => {
                let delta = read_varint_i64(data)?;
                *prev = prev.wrapping_add(delta);
                Ok(Value::F64(*prev as f64 / *factor))
            }
            Self::Bool { data } => Ok(Value::Bool(read_bool_byte(data)?)),
            Self::String { data } => {
                let bytes = read_length_prefixed(data)?;
                Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
            }
            Self::BoolArray { data } => {
                let len = read_varint_len(data)?;
                let bytes = take(data, len)?;
                let mut array = Vec::with_capacity(len);
                for &byte in bytes {
                    match byte {
                        0x00 => array.push(false),
                        0x01 => array.push(true),
                        other => {
                            return Err(RwtfError::BadValue(format!(
                                "expected a bool byte, found {:#04x}",
                                other
                            )))
                        }
                    }
                }
                Ok(Value::BoolArray(array))
            }
            Self::U64Array { data } => {
                let len = read_varint_len(data)?;
                let mut array = Vec::with_capacity(len.min(4096));
                let mut prev: u64 = 0;
                for _ in 0..len {
                    let delta = read_varint_i64(data)?;
                    prev = prev.wrapping_add(delta as u64);
                    array.push(prev);
                }
                Ok(Value::U64Array(array))
            }
            Self::ByteArray { data } => {
                let bytes = read_length_prefixed(data)?;
                Ok(Value::Bytes(bytes.to_vec()))
            }
        }
    }
}
