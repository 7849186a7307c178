//! Wire primitives shared by every layer of the format.
//!
//! Three building blocks appear throughout a track file:
//!
//! - **LEB128 varints** for lengths, counts, and delta-coded integers.
//!   Unsigned values use plain little-endian base-128; signed values use the
//!   sign-extended variant. Decoders accept any encoding that fits the
//!   64-bit target and reject the rest.
//! - **CRC-16/USB** (poly 0x8005, reflected, init and xorout 0xFFFF) over
//!   the file header, the metadata table, and the data table, stored
//!   little-endian after the bytes it covers.
//! - **CRC-32/BZIP2** (poly 0x04C11DB7, unreflected, init and xorout
//!   0xFFFFFFFF) over the presence bitmap and each data column, also
//!   stored little-endian.

pub(crate) mod decoders;
pub(crate) mod encoders;

use crate::error::{Result, RwtfError};
use crc::Crc;

const CRC16: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_USB);
const CRC32: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_BZIP2);

/// Checksums a finished 16-bit-framed region.
pub(crate) fn crc16(bytes: &[u8]) -> u16 {
    CRC16.checksum(bytes)
}

/// Checksums a finished 32-bit-framed region.
pub(crate) fn crc32(bytes: &[u8]) -> u32 {
    CRC32.checksum(bytes)
}

/// Appends `buf[start..]`'s CRC-16 to `buf`.
pub(crate) fn append_crc16(buf: &mut Vec<u8>, start: usize) {
    let crc = crc16(&buf[start..]);
    buf.extend_from_slice(&crc.to_le_bytes());
}

/// Appends `buf[start..]`'s CRC-32 to `buf`.
pub(crate) fn append_crc32(buf: &mut Vec<u8>, start: usize) {
    let crc = crc32(&buf[start..]);
    buf.extend_from_slice(&crc.to_le_bytes());
}

/// Takes `n` bytes off the front of `input`.
pub(crate) fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if input.len() < n {
        return Err(RwtfError::TruncatedInput);
    }
    let (head, rest) = input.split_at(n);
    *input = rest;
    Ok(head)
}

/// Reads one byte off the front of `input`.
pub(crate) fn read_u8(input: &mut &[u8]) -> Result<u8> {
    Ok(take(input, 1)?[0])
}

/// Reads a little-endian u16 off the front of `input`.
pub(crate) fn read_u16(input: &mut &[u8]) -> Result<u16> {
    let bytes = take(input, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Reads a little-endian u32 off the front of `input`.
pub(crate) fn read_u32(input: &mut &[u8]) -> Result<u32> {
    let bytes = take(input, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Reads a little-endian i64 off the front of `input`.
pub(crate) fn read_i64(input: &mut &[u8]) -> Result<i64> {
    let bytes = take(input, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(i64::from_le_bytes(raw))
}

fn map_leb_error(e: leb128::read::Error) -> RwtfError {
    match e {
        leb128::read::Error::IoError(_) => RwtfError::TruncatedInput,
        leb128::read::Error::Overflow => RwtfError::OutOfRange,
    }
}

/// Reads an unsigned LEB128 varint off the front of `input`.
pub(crate) fn read_varint_u64(input: &mut &[u8]) -> Result<u64> {
    leb128::read::unsigned(input).map_err(map_leb_error)
}

/// Reads a signed LEB128 varint off the front of `input`.
pub(crate) fn read_varint_i64(input: &mut &[u8]) -> Result<i64> {
    leb128::read::signed(input).map_err(map_leb_error)
}

/// Reads an unsigned varint and narrows it to a usize length.
pub(crate) fn read_varint_len(input: &mut &[u8]) -> Result<usize> {
    Ok(usize::try_from(read_varint_u64(input)?)?)
}

/// Appends an unsigned LEB128 varint to `buf`.
pub(crate) fn write_varint_u64(buf: &mut Vec<u8>, value: u64) {
    // Writes into a Vec cannot fail.
    let _ = leb128::write::unsigned(buf, value);
}

/// Appends a signed LEB128 varint to `buf`.
pub(crate) fn write_varint_i64(buf: &mut Vec<u8>, value: i64) {
    let _ = leb128::write::signed(buf, value);
}
