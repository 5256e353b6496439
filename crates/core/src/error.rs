/// Result alias that carries the custom [`AudioError`] type.
pub type Result<T> = std::result::Result<T, AudioError>;

/// Common error type for the core crate.
///
/// None of these ever reach gameplay code through a playback request: the
/// [`AudioService`](crate::AudioService) logs them and reports a
/// [`Dispatch`](crate::Dispatch) instead. They surface directly only from
/// configuration loading, backend construction and the blocking gate call.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Free-form failure without a more specific category.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// The media backend refused to open, decode or start a session.
    #[error("audio backend failure: {0}")]
    Backend(String),
    /// The designated execution context no longer accepts or finished work.
    #[error("execution context unavailable: {0}")]
    ContextClosed(&'static str),
}

impl AudioError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a backend error from anything printable.
    pub fn backend<T: std::fmt::Display>(err: T) -> Self {
        Self::Backend(err.to_string())
    }
}
