//! Per-type column encoders.
//!
//! Each encoder appends one cell per call to a growing column buffer and
//! records the cell's presence bit. Absent cells (`None`) occupy no bytes
//! in the column. Numeric columns are delta-coded: the first present value
//! is written as the signed LEB128 of its two's-complement 64-bit view,
//! and every later value as the signed LEB128 of its wrapping difference
//! from the previous present value.

use crate::codec::{write_varint_i64, write_varint_u64};

/// A stateful encoder for one column of a single type.
pub(crate) trait Encoder: Default {
    /// The borrowed input type one cell accepts.
    type T: ?Sized;

    /// Appends one cell. Pushes exactly one presence bit; writes bytes
    /// only when the cell is present and in range for the column.
    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>);
}

#[derive(Debug, Default)]
pub(crate) struct I64Encoder {
    prev: i64,
}

impl Encoder for I64Encoder {
    type T = i64;

    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>) {
        presence.push(value.is_some());
        if let Some(&v) = value {
            write_varint_i64(buf, v.wrapping_sub(self.prev));
            self.prev = v;
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct U64Encoder {
    prev: u64,
}

impl Encoder for U64Encoder {
    type T = u64;

    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>) {
        presence.push(value.is_some());
        if let Some(&v) = value {
            // The delta's two's-complement view always fits a signed varint.
            write_varint_i64(buf, v.wrapping_sub(self.prev) as i64);
            self.prev = v;
        }
    }
}

#[derive(Debug)]
pub(crate) struct F64Encoder {
    prev: i64,
    factor: f64,
}

impl F64Encoder {
    pub(crate) fn new(scale: u8) -> Self {
        Self {
            prev: 0,
            factor: 10_f64.powi(i32::from(scale)),
        }
    }
}

impl Default for F64Encoder {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Encoder for F64Encoder {
    type T = f64;

    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>) {
        // A scaled value outside the i64 range cannot be stored; its cell
        // is recorded as absent rather than failing the write.
        let quantized = value.and_then(|v| {
            let scaled = v * self.factor;
            if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
                Some(scaled as i64)
            } else {
                None
            }
        });

        presence.push(quantized.is_some());
        if let Some(q) = quantized {
            write_varint_i64(buf, q.wrapping_sub(self.prev));
            self.prev = q;
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BoolEncoder;

impl Encoder for BoolEncoder {
    type T = bool;

    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>) {
        presence.push(value.is_some());
        if let Some(&v) = value {
            buf.push(u8::from(v));
        }
    }
}

/// Encodes both `String` and `ByteArray` columns: LEB128 length, raw bytes.
#[derive(Debug, Default)]
pub(crate) struct BytesEncoder;

impl Encoder for BytesEncoder {
    type T = [u8];

    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>) {
        presence.push(value.is_some());
        if let Some(bytes) = value {
            write_varint_u64(buf, bytes.len() as u64);
            buf.extend_from_slice(bytes);
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BoolArrayEncoder;

impl Encoder for BoolArrayEncoder {
    type T = [bool];

    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>) {
        presence.push(value.is_some());
        if let Some(array) = value {
            write_varint_u64(buf, array.len() as u64);
            buf.extend(array.iter().map(|&b| u8::from(b)));
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct U64ArrayEncoder;

impl Encoder for U64ArrayEncoder {
    type T = [u64];

    fn encode(&mut self, value: Option<&Self::T>, buf: &mut Vec<u8>, presence: &mut Vec<bool>) {
        presence.push(value.is_some());
        if let Some(array) = value {
            write_varint_u64(buf, array.len() as u64);
            // Delta state never crosses an array boundary.
            let mut prev: u64 = 0;
            for &v in array {
                write_varint_i64(buf, v.wrapping_sub(prev) as i64);
                prev = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i64_encoder() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = I64Encoder::default();

        for value in [
            Some(&1),
            Some(&2),
            Some(&3),
            Some(&-100),
            None,
            None,
            Some(&-100),
            Some(&100),
        ] {
            encoder.encode(value, &mut buf, &mut presence);
        }

        #[rustfmt::skip]
        assert_eq!(buf, [0x01, // +1 from 0
                         0x01, // +1 from 1
                         0x01, // +1 from 2
                         0x99, // -103 from 3
                         0x7F,
                         // None
                         // None
                         0x00, // staying at -100
                         0xC8, // +200 from -100
                         0x01]);
        assert_eq!(
            presence,
            [true, true, true, true, false, false, true, true]
        );
    }

    #[test]
    fn test_u64_encoder_wraps() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = U64Encoder::default();

        for value in [
            Some(&1),
            Some(&2),
            None,
            Some(&100),
            Some(&u64::MAX),
            Some(&7),
        ] {
            encoder.encode(value, &mut buf, &mut presence);
        }

        #[rustfmt::skip]
        assert_eq!(buf, [0x01, // +1 from 0
                         0x01, // +1 from 1
                         // None
                         0xE2, // +98 from 2
                         0x00,
                         0x9B, // -101: wraps up to u64::MAX
                         0x7F,
                         0x08]); // +8: wraps back around to 7
        assert_eq!(presence, [true, true, false, true, true, true]);
    }

    #[test]
    fn test_f64_encoder_scale_7() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = F64Encoder::new(7);

        for value in [
            Some(&0.0),
            Some(&1.0),
            None,
            Some(&2.5),
            Some(&3.00001),
            Some(&-100.26),
        ] {
            encoder.encode(value, &mut buf, &mut presence);
        }

        #[rustfmt::skip]
        assert_eq!(buf, [0x00, // 0.0

                         0x80, // up to 1.0 * 10^7
                         0xAD,
                         0xE2,
                         0x04,

                         // None

                         0xC0, // up to 2.5 * 10^7
                         0xC3,
                         0x93,
                         0x07,

                         0xA4, // up to 3.00001 * 10^7
                         0x97,
                         0xB1,
                         0x02,

                         0xDC, // down to -100.26 * 10^7
                         0x8B,
                         0xCF,
                         0x93,
                         0x7C]);
        assert_eq!(presence, [true, true, false, true, true, true]);
    }

    #[test]
    fn test_f64_encoder_scale_2_truncates() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = F64Encoder::new(2);

        for value in [Some(&0.0), Some(&1.0), Some(&-20.0), Some(&-20.1234567)] {
            encoder.encode(value, &mut buf, &mut presence);
        }

        #[rustfmt::skip]
        assert_eq!(buf, [0x00,
                         0xE4, // 100
                         0x00,
                         0xCC, // -2100
                         0x6F,
                         0x74]); // -12: -20.1234567 truncates to -2012
        assert_eq!(presence, [true, true, true, true]);
    }

    #[test]
    fn test_f64_encoder_drops_unstorable_values() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = F64Encoder::new(7);

        encoder.encode(Some(&f64::NAN), &mut buf, &mut presence);
        encoder.encode(Some(&f64::INFINITY), &mut buf, &mut presence);
        encoder.encode(Some(&f64::NEG_INFINITY), &mut buf, &mut presence);
        encoder.encode(Some(&1.0e18), &mut buf, &mut presence); // 10^25 scaled
        encoder.encode(Some(&4.2), &mut buf, &mut presence);

        assert!(buf.len() < 10, "only the last value may produce bytes");
        assert_eq!(presence, [false, false, false, false, true]);
    }

    #[test]
    fn test_bool_encoder() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = BoolEncoder;

        for value in [
            Some(&true),
            Some(&true),
            Some(&false),
            None,
            None,
            Some(&false),
            Some(&true),
        ] {
            encoder.encode(value, &mut buf, &mut presence);
        }

        assert_eq!(buf, [0x01, 0x01, 0x00, 0x00, 0x01]);
        assert_eq!(presence, [true, true, true, false, false, true, true]);
    }

    #[test]
    fn test_bytes_encoder() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = BytesEncoder;

        encoder.encode(Some(b"A".as_slice()), &mut buf, &mut presence);
        encoder.encode(None, &mut buf, &mut presence);
        encoder.encode(Some(b"Hello, World!".as_slice()), &mut buf, &mut presence);

        #[rustfmt::skip]
        assert_eq!(buf, [0x01, b'A',
                         // None
                         0x0D, b'H', b'e', b'l', b'l', b'o', b',', b' ',
                         b'W', b'o', b'r', b'l', b'd', b'!']);
        assert_eq!(presence, [true, false, true]);
    }

    #[test]
    fn test_bool_array_encoder() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = BoolArrayEncoder;

        encoder.encode(Some([true, false, false].as_slice()), &mut buf, &mut presence);
        encoder.encode(None, &mut buf, &mut presence);
        encoder.encode(Some([true].as_slice()), &mut buf, &mut presence);
        encoder.encode(Some([].as_slice()), &mut buf, &mut presence);

        #[rustfmt::skip]
        assert_eq!(buf, [0x03, 0x01, 0x00, 0x00,
                         // None
                         0x01, 0x01,
                         0x00]); // empty array still writes its length
        assert_eq!(presence, [true, false, true, true]);
    }

    #[test]
    fn test_u64_array_encoder_resets_delta_state() {
        let mut buf = Vec::new();
        let mut presence = Vec::new();
        let mut encoder = U64ArrayEncoder;

        encoder.encode(Some([0, 17, 15].as_slice()), &mut buf, &mut presence);
        encoder.encode(None, &mut buf, &mut presence);
        encoder.encode(Some([8_000, 1].as_slice()), &mut buf, &mut presence);
        encoder.encode(Some([50].as_slice()), &mut buf, &mut presence);

        #[rustfmt::skip]
        assert_eq!(buf, [0x03, // three entries
                         0x00, // 0
                         0x11, // +17
                         0x7E, // -2
                         // None
                         0x02, // two entries
                         0xC0, // 8,000: first element starts from zero again
                         0x3E,
                         0xC1, // -7,999
                         0x41,
                         0x01, // one entry
                         0x32]); // 50
        assert_eq!(presence, [true, false, true, true]);
    }
}
