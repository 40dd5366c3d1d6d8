use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Gateway operation errors
///
/// Every gateway call resolves to either its payload or one of these values.
/// Transport faults, HTTP failures and malformed bodies never escape the
/// client any other way.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Unexpected status_code: {status}, message is {message}")]
    Http { status: u16, message: String },

    #[error("Unexpected status: {status}, message is {message}")]
    Envelope { status: i64, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("can not find file: {file_src}, {path}")]
    ArtifactNotFound { file_src: String, path: String },

    #[error("found {count} files matching {path}, expected exactly one")]
    AmbiguousArtifact { path: String, count: usize },

    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

impl GatewayError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        GatewayError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
