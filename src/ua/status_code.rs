use std::fmt;

/// Wrapper for the OPC UA status code bitfield.
///
/// Unlike the upstream library, which resolves a code's name through a
/// generated lookup table shipped with the binary type catalog, we carry our
/// own small static table covering only the codes this core ever produces or
/// consumes (see spec §6). Any other value still round-trips and displays as
/// its raw hex value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusCode(u32);

macro_rules! status_codes {
    ($( ($name:ident, $value:expr) ),* $(,)?) => {
        impl StatusCode {
            $(
                pub const $name: Self = Self($value);
            )*

            #[must_use]
            fn name(self) -> Option<&'static str> {
                match self.0 {
                    $( $value => Some(stringify!($name)), )*
                    _ => None,
                }
            }
        }
    };
}

status_codes!(
    (GOOD, 0x0000_0000),
    (GOOD_NON_CRITICAL_TIMEOUT, 0x0000_CA00),
    (BAD_UNEXPECTED_ERROR, 0x8001_0000),
    (BAD_OUT_OF_MEMORY, 0x8003_0000),
    (BAD_NOT_IMPLEMENTED, 0x8043_0000),
    (BAD_NOTHING_TO_DO, 0x800F_0000),
    (BAD_NODE_ID_INVALID, 0x8033_0000),
    (BAD_NODE_ID_UNKNOWN, 0x8034_0000),
    (BAD_NODE_CLASS_INVALID, 0x8061_0000),
    (BAD_NODE_ATTRIBUTES_INVALID, 0x8062_0000),
    (BAD_PARENT_NODE_ID_INVALID, 0x805B_0000),
    (BAD_REFERENCE_TYPE_ID_INVALID, 0x8051_0000),
    (BAD_REFERENCE_NOT_ALLOWED, 0x805A_0000),
    (BAD_TYPE_DEFINITION_INVALID, 0x8053_0000),
    (BAD_TYPE_MISMATCH, 0x8074_0000),
    (UNCERTAIN_REFERENCE_NOT_DELETED, 0x40BC_0000),
    (BAD_SERVER_NOT_CONNECTED, 0x800D_0000),
    (BAD_SUBSCRIPTION_ID_INVALID, 0x8028_0000),
    (BAD_MONITORED_ITEM_ID_INVALID, 0x8042_0000),
    (BAD_SEQUENCE_NUMBER_UNKNOWN, 0x807D_0000),
    (BAD_NO_CONTINUATION_POINTS, 0x8013_0000),
);

impl StatusCode {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_good(self) -> bool {
        self.0 == Self::GOOD.0
    }

    /// Top two bits of the code classify it as Good (00), Uncertain (01) or
    /// Bad (1x); see Part 4 §7.34.
    #[must_use]
    pub const fn is_bad(self) -> bool {
        self.0 & 0xC000_0000 == 0x8000_0000
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode({self})")
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::GOOD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_is_good() {
        assert!(StatusCode::GOOD.is_good());
        assert!(!StatusCode::BAD_NODE_ID_UNKNOWN.is_good());
    }

    #[test]
    fn bad_classification() {
        assert!(StatusCode::BAD_NODE_ID_UNKNOWN.is_bad());
        assert!(!StatusCode::UNCERTAIN_REFERENCE_NOT_DELETED.is_bad());
        assert!(!StatusCode::GOOD.is_bad());
    }

    #[test]
    fn display_uses_name_table() {
        assert_eq!(StatusCode::BAD_TYPE_MISMATCH.to_string(), "BAD_TYPE_MISMATCH");
        assert_eq!(StatusCode::new(0x1234_0000).to_string(), "0x12340000");
    }
}
