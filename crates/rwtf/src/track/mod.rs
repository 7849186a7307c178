//! Track file assembly and parsing.
//!
//! A track file is laid out as:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  File Header (24 bytes)                                     │
//! │  - Magic: 0x89 "RWTF" 0x0A 0x1A 0x0A (8 bytes)              │
//! │  - File version: u16 = 1, + u16 reserved                    │
//! │  - Creator version: u16, + u16 reserved                     │
//! │  - Metadata table offset: u16 = 24                          │
//! │  - Data offset: u16 = 24 + metadata region size             │
//! │  - Reserved: u16                                            │
//! │  - CRC-16 over the preceding 22 bytes                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Metadata Table                                             │
//! │  - Entry count (LEB128), entries (kind, u16 size, body)     │
//! │  - CRC-16                                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Data Table                                                 │
//! │  - Section count (LEB128)                                   │
//! │  - Per section: encoding, rows, data size, schema block     │
//! │  - CRC-16                                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Section bodies, concatenated in data table order           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The 16-bit offsets bound the header + metadata region to 64 KiB; a
//! track whose metadata does not fit is unrepresentable in this format.

pub(crate) mod reader;
pub(crate) mod writer;

pub use reader::TrackReader;
pub use writer::write_track;

/// Magic bytes opening every track file.
#[rustfmt::skip]
pub(crate) const MAGIC: [u8; 8] = [0x89,  // non-ascii
                                   0x52,  // R
                                   0x57,  // W
                                   0x54,  // T
                                   0x46,  // F
                                   0x0A,  // newline
                                   0x1A,  // ctrl-z
                                   0x0A]; // newline

/// The file format version this crate reads and writes.
pub(crate) const FILE_VERSION: u16 = 1;

/// Version of the writing library, preserved across a round-trip.
pub(crate) const CREATOR_VERSION: u16 = 0;

/// Total header size, CRC included.
pub(crate) const HEADER_SIZE: usize = 24;

/// Metadata entry kind tags.
pub(crate) const METADATA_KIND_TRACK_TYPE: u8 = 0x00;
pub(crate) const METADATA_KIND_CREATED_AT: u8 = 0x01;
