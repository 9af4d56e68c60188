//! Error types for the voice-anonymizer crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, transforming or writing audio.
#[derive(Debug, Error)]
pub enum AnonymizeError {
    /// A file could not be opened, created or renamed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A WAV container could not be decoded or encoded.
    #[error("WAV error on {}: {source}", path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    /// A sample buffer could not be sized.
    #[error("memory allocation failed for audio buffer ({requested} samples)")]
    Allocation { requested: usize },
    /// Buffer layout or format metadata is inconsistent.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// Input too short for the given parameters.
    #[error("input too short: {provided} samples provided, {minimum} required")]
    InputTooShort { provided: usize, minimum: usize },
    /// Processing parameters are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// A settings file could not be parsed.
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AnonymizeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnonymizeError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn wav(path: impl Into<PathBuf>, source: hound::Error) -> Self {
        // hound wraps plain I/O failures; surface those as I/O errors.
        match source {
            hound::Error::IoError(err) => AnonymizeError::io(path, err),
            other => AnonymizeError::Wav {
                path: path.into(),
                source: other,
            },
        }
    }
}
