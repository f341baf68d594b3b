pub type VidResult<T> = Result<T, VidError>;

/// Error taxonomy for a render run. Errors are typed internally and only
/// formatted to a single `"Error: ..."` line at the sink boundary.
#[derive(thiserror::Error, Debug)]
pub enum VidError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("audio decode error: {0}")]
    AudioDecode(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("composition error: {0}")]
    Composition(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VidError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn audio_decode(msg: impl Into<String>) -> Self {
        Self::AudioDecode(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }
}
