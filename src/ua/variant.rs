use crate::ua::{self, NodeId};

/// One scalar OPC UA built-in value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Scalar {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    ByteString(Vec<u8>),
    NodeId(Box<NodeId>),
    LocalizedText(ua::LocalizedText),
    QualifiedName(ua::QualifiedName),
    StatusCode(ua::StatusCode),
}

impl Scalar {
    /// Data type node id of this scalar's built-in type.
    #[must_use]
    pub fn data_type_id(&self) -> NodeId {
        match self {
            Self::Boolean(_) => ua::builtin::boolean(),
            Self::SByte(_) => ua::builtin::sbyte(),
            Self::Byte(_) => ua::builtin::byte(),
            Self::Int16(_) => ua::builtin::int16(),
            Self::UInt16(_) => ua::builtin::uint16(),
            Self::Int32(_) => ua::builtin::int32(),
            Self::UInt32(_) => ua::builtin::uint32(),
            Self::Int64(_) => ua::builtin::int64(),
            Self::UInt64(_) => ua::builtin::uint64(),
            Self::Float(_) => ua::builtin::float(),
            Self::Double(_) => ua::builtin::double(),
            Self::String(_) => ua::builtin::string(),
            Self::ByteString(_) => ua::builtin::byte_string(),
            Self::NodeId(_) => ua::builtin::base_data_type(),
            Self::LocalizedText(_) => ua::builtin::localized_text(),
            Self::QualifiedName(_) => ua::builtin::base_data_type(),
            Self::StatusCode(_) => ua::builtin::base_data_type(),
        }
    }

    /// Widens or narrows a numeric scalar into another numeric built-in type,
    /// when representable without loss. This mirrors `typeCheckValue()`
    /// coercing a value into the declared data type of its variable.
    #[must_use]
    pub fn coerce_numeric(&self, target: &NodeId) -> Option<Self> {
        let as_i64 = self.as_i64()?;
        if *target == ua::builtin::int32() {
            i32::try_from(as_i64).ok().map(Self::Int32)
        } else if *target == ua::builtin::int64() {
            Some(Self::Int64(as_i64))
        } else if *target == ua::builtin::uint32() {
            u32::try_from(as_i64).ok().map(Self::UInt32)
        } else if *target == ua::builtin::uint64() {
            u64::try_from(as_i64).ok().map(Self::UInt64)
        } else if *target == ua::builtin::double() {
            // Precision-lossy for large magnitudes, but a widening in kind.
            #[allow(clippy::cast_precision_loss, reason = "best-effort coercion")]
            Some(Self::Double(as_i64 as f64))
        } else {
            None
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::SByte(value) => Some(i64::from(value)),
            Self::Byte(value) => Some(i64::from(value)),
            Self::Int16(value) => Some(i64::from(value)),
            Self::UInt16(value) => Some(i64::from(value)),
            Self::Int32(value) => Some(i64::from(value)),
            Self::UInt32(value) => Some(i64::from(value)),
            Self::Int64(value) => Some(value),
            Self::UInt64(value) => i64::try_from(value).ok(),
            _ => None,
        }
    }
}

/// An OPC UA value: either a scalar or a homogeneous array of scalars.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl Variant {
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    #[must_use]
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(elements) => Some(elements.len()),
        }
    }

    #[must_use]
    pub fn data_type_id(&self) -> Option<NodeId> {
        match self {
            Self::Scalar(scalar) => Some(scalar.data_type_id()),
            Self::Array(elements) => elements.first().map(Scalar::data_type_id),
        }
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::Scalar(Scalar::Int32(value))
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Boolean(value))
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::String(value))
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::String(value.to_owned()))
    }
}
