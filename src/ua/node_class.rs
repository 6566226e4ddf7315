use std::fmt;

/// Node class, mirroring `UA_NodeClass`. Stored redundantly with
/// [`crate::node::NodeBody`]'s discriminant so that it can be compared
/// against a [`NodeClassMask`](crate::ua::NodeClassMask) without matching on
/// the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeClass {
    Object,
    Variable,
    Method,
    ObjectType,
    VariableType,
    ReferenceType,
    DataType,
    View,
}

impl NodeClass {
    /// Bit occupied by this class in a [`NodeClassMask`](crate::ua::NodeClassMask).
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Object => 1,
            Self::Variable => 1 << 1,
            Self::Method => 1 << 2,
            Self::ObjectType => 1 << 3,
            Self::VariableType => 1 << 4,
            Self::ReferenceType => 1 << 5,
            Self::DataType => 1 << 6,
            Self::View => 1 << 7,
        }
    }

    #[must_use]
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            Self::ObjectType | Self::VariableType | Self::ReferenceType | Self::DataType
        )
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
