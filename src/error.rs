use std::path::PathBuf;

use thiserror::Error;

/// Every failure the pipeline can report. None of these are retried: a bad
/// shape or a corrupt file needs the caller to change something first.
#[derive(Debug, Error)]
pub enum GanError {
    /// A network could not be built from its specification.
    #[error("cannot build {role} network: {reason}")]
    Construction { role: String, reason: String },

    #[error("cannot load dataset from {}: {reason}", path.display())]
    DatasetLoad { path: PathBuf, reason: String },

    #[error("cannot load model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// A tensor was fed to a port whose declared shape differs.
    #[error("shape mismatch at `{port}`: expected {expected}, got {actual}")]
    ShapeMismatch {
        port: String,
        expected: String,
        actual: String,
    },

    #[error("cannot write model to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Decoding or encoding an inference image failed.
    #[error("image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, GanError>;
