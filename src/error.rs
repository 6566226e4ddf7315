use thiserror::Error;

use crate::ua;

#[derive(Debug, Clone, Copy, Error)]
#[error("{0}")]
pub struct Error(ua::StatusCode);

impl Error {
    #[must_use]
    pub fn new(status_code: ua::StatusCode) -> Self {
        debug_assert!(!status_code.is_good());
        Self(status_code)
    }

    #[must_use]
    pub const fn status_code(self) -> ua::StatusCode {
        self.0
    }
}

impl From<ua::StatusCode> for Error {
    fn from(status_code: ua::StatusCode) -> Self {
        Self::new(status_code)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
