/// Convenience result type used across termlayer.
pub type TermlayerResult<T> = Result<T, TermlayerError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TermlayerError {
    /// A call against the windowing server failed (window, pixmap, gc, property).
    #[error("resource error: {0}")]
    Resource(String),

    /// Invalid configuration: unknown scale policy, malformed anchor window id.
    #[error("config error: {0}")]
    Config(String),

    /// The image source could not be read or decoded.
    #[error("content error: {0}")]
    Content(String),

    /// Malformed diagnostic record or unexpected exit of the external renderer.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The external renderer reported a failure for one of its layers.
    #[error("renderer error: [{name}] {message}")]
    Renderer {
        /// Error name reported by the renderer.
        name: String,
        /// Human readable message reported by the renderer.
        message: String,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TermlayerError {
    /// Build a [`TermlayerError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`TermlayerError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TermlayerError::Content`] value.
    pub fn content(msg: impl Into<String>) -> Self {
        Self::Content(msg.into())
    }

    /// Build a [`TermlayerError::Protocol`] value.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Build a [`TermlayerError::Renderer`] value.
    pub fn renderer(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Renderer {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
