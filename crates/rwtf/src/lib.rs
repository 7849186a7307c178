//! RWTF - columnar container format for track data.
//!
//! This crate is a pure codec for the RWTF container format: bytes in,
//! structured rows out, and back again. It performs no I/O and keeps no
//! global state.
//!
//! # Components
//!
//! - [`Section`]: row-oriented input projected into typed, delta-coded
//!   columns, in the clear or sealed with XChaCha20-Poly1305
//! - [`write_track`]: assembles metadata and sections into a track file
//! - [`TrackReader`]: CRC-verified index over a serialized track with
//!   on-demand section decoding
//!
//! # Example
//!
//! ```rust,ignore
//! use rwtf::{
//!     write_track, FieldDefinition, DataType, MetadataEntry, Row, Schema,
//!     Section, TrackReader, TrackType, Value,
//! };
//!
//! let schema = Schema::with_fields(vec![
//!     FieldDefinition::new("lat", DataType::F64 { scale: 7 }),
//!     FieldDefinition::new("lng", DataType::F64 { scale: 7 }),
//!     FieldDefinition::new("elevation", DataType::I64),
//! ]);
//!
//! let mut row = Row::new();
//! row.insert("lat".to_string(), Value::F64(45.5152));
//! row.insert("lng".to_string(), Value::F64(-122.6784));
//! row.insert("elevation".to_string(), Value::I64(15));
//!
//! let section = Section::standard(schema, &[row]);
//! let bytes = write_track(
//!     &[MetadataEntry::TrackType(TrackType::Trip(42))],
//!     &[section],
//! )?;
//!
//! let reader = TrackReader::new(&bytes)?;
//! let rows = reader.section_data(0, None, None)?;
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod schema;
pub mod section;
pub mod track;
pub mod types;

mod codec;
mod crypto;

pub use crypto::random_key_material;
pub use error::{CrcRegion, Result, RwtfError};
pub use schema::{DataType, FieldDefinition, Schema, MAX_F64_SCALE};
pub use section::Section;
pub use track::{write_track, TrackReader};
pub use types::{MetadataEntry, Row, SectionEncoding, TrackType, Value};
