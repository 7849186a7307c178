//! Error and Result types for RWTF codec operations.

use std::fmt;
use thiserror::Error;

/// A convenience `Result` type for RWTF operations.
pub type Result<T> = std::result::Result<T, RwtfError>;

/// Identifies which checksummed region of a track failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcRegion {
    /// The 24-byte file header.
    Header,
    /// The metadata table body.
    Metadata,
    /// The data table body (section headers and schemas).
    DataTable,
    /// A section's presence bitmap.
    Presence,
    /// A section's data column, by position in the persisted schema.
    Column(usize),
}

impl fmt::Display for CrcRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::Metadata => write!(f, "metadata table"),
            Self::DataTable => write!(f, "data table"),
            Self::Presence => write!(f, "presence bitmap"),
            Self::Column(i) => write!(f, "column {}", i),
        }
    }
}

/// The error type for RWTF encode and decode operations.
#[derive(Debug, Error)]
pub enum RwtfError {
    /// The input does not begin with the RWTF magic bytes.
    #[error("Invalid magic bytes: {0:02X?}")]
    BadMagic([u8; 8]),

    /// Unsupported file format version.
    #[error("Unsupported file version: {0}")]
    BadVersion(u16),

    /// A CRC check failed.
    #[error("Checksum mismatch in {region}: expected {expected:#x}, computed {computed:#x}")]
    CrcMismatch {
        /// The region whose checksum failed.
        region: CrcRegion,
        /// Checksum stored in the file.
        expected: u32,
        /// Checksum computed over the region's bytes.
        computed: u32,
    },

    /// A schema block is malformed: unknown type tag, bad scale, or a
    /// section header that cannot be parsed.
    #[error("Malformed schema: {0}")]
    BadSchema(String),

    /// The input ended before a required field.
    #[error("Unexpected end of input")]
    TruncatedInput,

    /// An encrypted section could not be opened: missing key, wrong key,
    /// wrong key length, or a tampered ciphertext. The format cannot
    /// distinguish these cases.
    #[error("Section decryption failed")]
    DecryptFail,

    /// An encoded integer does not fit its target width.
    #[error("Numeric value out of range")]
    OutOfRange,

    /// The metadata table is malformed: unknown entry kind, wrong body
    /// size, or a region offset that disagrees with the table's extent.
    #[error("Malformed metadata table: {0}")]
    BadMetadata(String),

    /// A section index past the end of the data table.
    #[error("Section index {index} out of range: track has {count} sections")]
    SectionIndex {
        /// The requested index.
        index: usize,
        /// Number of sections in the track.
        count: usize,
    },

    /// A decoded byte is not a legal value for its column type.
    #[error("Invalid value: {0}")]
    BadValue(String),
}

impl From<std::num::TryFromIntError> for RwtfError {
    fn from(_: std::num::TryFromIntError) -> Self {
        RwtfError::OutOfRange
    }
}
