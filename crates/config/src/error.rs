// Configuration errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown settings key \"{0}\"")]
    UnknownKey(String),

    #[error("invalid version \"{0}\"")]
    InvalidVersion(String),

    #[error("no configuration directory on this platform")]
    NoConfigDir,
}
