use crate::ua::NodeClass;

/// Bitmask of [`NodeClass`] values, used to filter [`Browse`](crate::browse)
/// results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeClassMask(u32);

impl NodeClassMask {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn all() -> Self {
        Self(u32::MAX)
    }

    #[must_use]
    pub const fn with(self, class: NodeClass) -> Self {
        Self(self.0 | class.bit())
    }

    #[must_use]
    pub const fn matches(self, class: NodeClass) -> bool {
        self.0 == 0 || self.0 & class.bit() != 0
    }
}

impl FromIterator<NodeClass> for NodeClassMask {
    fn from_iter<T: IntoIterator<Item = NodeClass>>(iter: T) -> Self {
        iter.into_iter().fold(Self::none(), Self::with)
    }
}
