// Format driver errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("cannot encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("frame has no channel \"{0}\"")]
    MissingChannel(String),

    #[error("frame already has a channel \"{0}\"")]
    DuplicateChannel(String),

    #[error("channel \"{name}\" has {found} samples, expected {expected}")]
    ChannelLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid PFS header: {0}")]
    InvalidHeader(String),

    #[error("frame dimensions must not be zero")]
    EmptyFrame,
}

impl FormatError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FormatError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FormatError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FormatError::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
