/// Convenience result type used across mixview.
pub type MixviewResult<T> = Result<T, MixviewError>;

/// Top-level error taxonomy used by the loading and polling APIs.
///
/// Resolution itself never fails; these errors only surface while reading snapshots or
/// configuration.
#[derive(thiserror::Error, Debug)]
pub enum MixviewError {
    /// Invalid user-provided configuration or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// A snapshot document could not be turned into a model.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// A projection configuration document was rejected.
    #[error("config error: {0}")]
    Config(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// A snapshot source failed to produce a document this tick.
    #[error("source error: {0}")]
    Source(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MixviewError {
    /// Build a [`MixviewError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MixviewError::Snapshot`] value.
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Build a [`MixviewError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`MixviewError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`MixviewError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }
}

impl From<serde_json::Error> for MixviewError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
