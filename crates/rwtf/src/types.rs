//! Core value and metadata types shared by the writer and the reader.

use std::collections::BTreeMap;

/// The kind of track a file carries, together with its numeric identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    /// A recorded trip.
    Trip(u32),
    /// A planned route.
    Route(u32),
    /// A segment of road or trail.
    Segment(u32),
}

impl TrackType {
    /// The on-wire tag for this track type.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Self::Trip(_) => 0x00,
            Self::Route(_) => 0x01,
            Self::Segment(_) => 0x02,
        }
    }

    /// The identifier carried by this track type.
    pub fn id(&self) -> u32 {
        match self {
            Self::Trip(id) | Self::Route(id) | Self::Segment(id) => *id,
        }
    }
}

/// One entry of a track's metadata table.
///
/// Duplicate kinds are permitted and round-trip verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataEntry {
    /// What kind of track this file describes.
    TrackType(TrackType),
    /// When the track was created, as seconds since the Unix epoch (UTC).
    CreatedAt(i64),
}

/// How a section's body is encoded on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEncoding {
    /// Presence bitmap and columns in the clear, each CRC-32 framed.
    Standard,
    /// A standard body sealed with XChaCha20-Poly1305.
    Encrypted,
}

/// A single field value supplied to, or produced by, the codec.
///
/// There is no null variant: a row expresses null by omitting the key,
/// which is exactly what the wire format can represent.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Double-precision float; quantized by the field's scale when stored.
    F64(f64),
    /// Boolean.
    Bool(bool),
    /// Text. The codec does not enforce UTF-8 on the wire.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Sequence of booleans.
    BoolArray(Vec<bool>),
    /// Sequence of unsigned 64-bit integers, delta-coded within the array.
    U64Array(Vec<u64>),
}

/// A row of track data: field name to value, with absent keys meaning null.
pub type Row = BTreeMap<String, Value>;
