/// Convenience result type used across memeforge.
pub type MemeResult<T> = Result<T, MemeError>;

/// Error taxonomy returned by the compositor and its helpers.
///
/// Every variant is terminal for the render call that produced it. Only
/// [`MemeError::ImageAcquisition`] can succeed on retry with the same input.
#[derive(thiserror::Error, Debug)]
pub enum MemeError {
    /// Source image unreachable, empty, oversized, or not decodable.
    #[error("image acquisition error: {0}")]
    ImageAcquisition(String),

    /// Unknown filter identifier or malformed filter arguments.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Transform with the wrong arity or non-finite components.
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// Any other malformed request value (colors, sizes, positions, fonts).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal raster failure.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MemeError {
    /// Build a [`MemeError::ImageAcquisition`] value.
    pub fn image_acquisition(msg: impl Into<String>) -> Self {
        Self::ImageAcquisition(msg.into())
    }

    /// Build a [`MemeError::InvalidFilter`] value.
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    /// Build a [`MemeError::InvalidTransform`] value.
    pub fn invalid_transform(msg: impl Into<String>) -> Self {
        Self::InvalidTransform(msg.into())
    }

    /// Build a [`MemeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MemeError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// `true` when retrying the same request may succeed (network trouble and the like).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ImageAcquisition(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
