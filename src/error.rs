use thiserror::Error;

/// Failures of the image intake pipeline. The display text is shown to the
/// user as-is.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntakeError {
    #[error("Please select a PNG or JPG file. Selected: {media_type}")]
    InvalidType { media_type: String },

    #[error("File too large ({size_mb:.1}MB). Maximum size is {max_mb}MB.")]
    TooLarge { size_mb: f64, max_mb: u64 },

    #[error("{0}")]
    UnreadableFile(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize history failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Server-reported or transport failure of a generation request.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("image processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
