/// Direction to follow references in, mirroring `UA_BrowseDirection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BrowseDirection {
    Forward,
    Inverse,
    Both,
}

impl BrowseDirection {
    /// Whether a reference stored with the given `is_inverse` flag should be
    /// followed for this direction.
    #[must_use]
    pub const fn accepts(self, is_inverse: bool) -> bool {
        match self {
            Self::Forward => !is_inverse,
            Self::Inverse => is_inverse,
            Self::Both => true,
        }
    }
}
