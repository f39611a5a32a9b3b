//! Engine-wide error type
//!
//! Every fallible operation in the crate returns [`EngineResult`]. Errors are handed back to
//! the immediate caller and never retried internally.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::render::backend::ShaderStage;

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by windows, renderers and GPU resources
#[derive(Error, Debug)]
pub enum EngineError {
    /// Operation invoked on an instance that cannot service it
    #[error("{0}: invalid receiver")]
    InvalidReceiver(&'static str),

    /// Bad caller input
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Caller input of the wrong kind
    #[error("invalid data type: {0}")]
    InvalidDataType(String),

    /// Second `init` on the same instance
    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),

    /// Operation requires an initialized instance
    #[error("{0} is not initialized")]
    NotInitialized(String),

    /// Indexed access past the end of a collection
    #[error("index {index} out of range for {len} {what}")]
    IndexOutOfRange {
        /// Kind of collection that was indexed
        what: &'static str,
        /// Requested index
        index: usize,
        /// Number of stored items
        len: usize,
    },

    /// A resource path is empty, missing or unreadable
    #[error("invalid file path {path:?}: {reason}")]
    InvalidFilePath {
        /// Offending path
        path: PathBuf,
        /// Human-readable cause
        reason: String,
    },

    /// A required resource file has no content
    #[error("file is empty: {0:?}")]
    EmptyFile(PathBuf),

    /// A shader stage failed to compile
    #[error("failed to compile {stage} shader:\n{log}")]
    CompileError {
        /// Stage that failed
        stage: ShaderStage,
        /// Backend diagnostic log
        log: String,
    },

    /// The shader program failed to link
    #[error("failed to link program:\n{0}")]
    LinkError(String),

    /// Uniform lookup failed on a linked program
    #[error("failed to set [{type_name}] for uniform [{name}]: location not found")]
    UniformNotFound {
        /// Uniform name
        name: String,
        /// Shape of the value that was being set
        type_name: &'static str,
    },

    /// Pixel rows are not tightly packed RGBA8
    #[error("unsupported stride: expected {expected} bytes per row, got {actual}")]
    UnsupportedStride {
        /// `width * 4`
        expected: usize,
        /// Row length found in the buffer
        actual: usize,
    },

    /// Value shape outside the supported uniform set
    #[error("unsupported value type [{0}]")]
    UnsupportedValueType(String),

    /// Failure reported by the windowing/graphics backend
    #[error("backend initialization failed: {0}")]
    BackendInit(String),

    /// Image decoding failure
    #[error("image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Configuration file failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Build an [`EngineError::InvalidFilePath`] from a path and any displayable cause
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidFilePath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
