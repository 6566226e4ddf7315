use crate::ua::{StatusCode, Variant};

/// A value together with its quality and timestamps, as delivered by Read
/// and carried in data-change notifications.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataValue {
    pub value: Option<Variant>,
    pub status: StatusCode,
    pub source_timestamp: Option<time::OffsetDateTime>,
    pub server_timestamp: Option<time::OffsetDateTime>,
}

impl DataValue {
    #[must_use]
    pub fn new(value: Variant) -> Self {
        Self {
            value: Some(value),
            status: StatusCode::GOOD,
            source_timestamp: None,
            server_timestamp: None,
        }
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        match &self.value {
            Some(value) => value.is_scalar(),
            None => true,
        }
    }
}

impl Default for DataValue {
    fn default() -> Self {
        Self {
            value: None,
            status: StatusCode::GOOD,
            source_timestamp: None,
            server_timestamp: None,
        }
    }
}

impl From<Variant> for DataValue {
    fn from(value: Variant) -> Self {
        Self::new(value)
    }
}
