// src/error.rs

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures while talking to the SIDRA endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid endpoint {url}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The server answered, but not with 200.
    #[error("SIDRA request failed with status {status}")]
    RemoteRequest { status: StatusCode },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decoding SIDRA response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("period {period:?} has malformed release timestamp {value:?}")]
    MalformedTimestamp { period: String, value: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("filesystem error on {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unexpected schema: {0}")]
    Schema(String),
}

impl ExportError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Any stage failure, passed through unchanged.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
