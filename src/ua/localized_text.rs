/// Human-readable text tagged with an optional locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalizedText {
    pub locale: Option<String>,
    pub text: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            locale: None,
            text: text.into(),
        }
    }
}
