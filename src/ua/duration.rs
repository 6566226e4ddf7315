/// Wrapper for `UA_Duration`: an interval of time in milliseconds.
///
/// See <https://reference.opcfoundation.org/Core/Part3/v105/docs/8.13>.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duration(f64);

impl Duration {
    #[must_use]
    pub const fn from_millis_f64(millis: f64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis_f64(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn to_std(self) -> Option<std::time::Duration> {
        std::time::Duration::try_from_secs_f64(self.0 / 1e3).ok()
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self(0.0)
    }
}

impl From<std::time::Duration> for Duration {
    fn from(duration: std::time::Duration) -> Self {
        #[allow(
            clippy::cast_precision_loss,
            reason = "millisecond-resolution durations fit comfortably in f64"
        )]
        Self(duration.as_secs_f64() * 1e3)
    }
}
