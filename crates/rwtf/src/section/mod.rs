//! The section engine: schema-typed columnar blocks of row data.
//!
//! A section body is framed as:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Presence bitmap: rows × ceil(fields / 8) bytes             │
//! │  - bit (f % 8) of byte (f / 8) set iff field f has a value  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CRC-32 over the bitmap (4 bytes LE)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Column 0 bytes │ CRC-32                                    │
//! │  Column 1 bytes │ CRC-32                                    │
//! │  ...            │ ...        (schema order)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! An encrypted section seals exactly this body with XChaCha20-Poly1305;
//! its on-disk form is `nonce || ciphertext || tag` and the Poly1305 tag
//! supersedes the per-column CRCs as the integrity check.

pub(crate) mod reader;
pub(crate) mod writer;

pub use writer::Section;

/// Version byte leading every persisted schema block.
pub(crate) const SCHEMA_VERSION: u8 = 0;
