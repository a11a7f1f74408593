/// Convenience result type used across Aperture.
pub type ApertureResult<T> = Result<T, ApertureError>;

/// Top-level error taxonomy used by mapping and rendering APIs.
#[derive(thiserror::Error, Debug)]
pub enum ApertureError {
    /// Setup-time misconfiguration (bad field path, short output array, invalid tween).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Render-time failure while evaluating one node or slot.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// The graphics surface rejected an operation.
    #[error("surface error: {0}")]
    Surface(String),

    /// Errors when serializing or deserializing configuration or data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApertureError {
    /// Build a [`ApertureError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`ApertureError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ApertureError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Build a [`ApertureError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the error is contained per node by the render engine.
    pub fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
