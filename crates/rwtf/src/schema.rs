//! Section schemas: ordered field definitions with wire-level type tags.

use crate::error::{Result, RwtfError};

/// Largest accepted F64 scale. 10^19 exceeds the i64 range every scaled
/// value must land in, so larger exponents could never store a value.
pub const MAX_F64_SCALE: u8 = 18;

/// The closed set of column types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Signed 64-bit integers, delta-coded.
    I64,
    /// Unsigned 64-bit integers, delta-coded with wrapping arithmetic.
    U64,
    /// Floats quantized to `value * 10^scale` and delta-coded as i64.
    F64 {
        /// Decimal exponent applied before quantization.
        scale: u8,
    },
    /// One byte per value: 0x00 or 0x01.
    Bool,
    /// Length-prefixed bytes, conventionally UTF-8.
    String,
    /// Length-prefixed sequence of bool bytes.
    BoolArray,
    /// Length-prefixed sequence of u64, delta-coded within the array.
    U64Array,
    /// Length-prefixed raw bytes.
    ByteArray,
}

impl DataType {
    /// Builds an `F64` type, rejecting scales no stored value could use.
    ///
    /// # Errors
    ///
    /// Returns `RwtfError::BadSchema` when `scale` exceeds [`MAX_F64_SCALE`].
    pub fn f64_with_scale(scale: u32) -> Result<Self> {
        if scale > u32::from(MAX_F64_SCALE) {
            return Err(RwtfError::BadSchema(format!(
                "F64 scale {} exceeds maximum {}",
                scale, MAX_F64_SCALE
            )));
        }
        Ok(Self::F64 { scale: scale as u8 })
    }

    /// The on-wire type tag.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Self::I64 => 0x00,
            Self::F64 { .. } => 0x01,
            Self::U64 => 0x02,
            Self::Bool => 0x10,
            Self::String => 0x20,
            Self::BoolArray => 0x21,
            Self::U64Array => 0x22,
            Self::ByteArray => 0x23,
        }
    }
}

/// One named, typed field of a section schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    name: String,
    data_type: DataType,
}

impl FieldDefinition {
    /// Creates a field definition.
    pub fn new<S: Into<String>>(name: S, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// The field's name. Arbitrary byte content survives a round-trip,
    /// lossily replaced on read when it is not valid UTF-8.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The field's declared column type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// An ordered list of field definitions.
///
/// Order is significant: it fixes the column order on the wire and the bit
/// positions in the presence bitmap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldDefinition>,
}

impl Schema {
    /// Creates a schema from fields in their declared order.
    pub fn with_fields(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }

    /// The fields in declared order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Whether the schema contains a field equal in name and type.
    pub(crate) fn contains(&self, field: &FieldDefinition) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}
