//! Error types for runtime operations

use crate::status::StatusCode;
use crate::types::DeviceId;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors reported by a device runtime
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// A runtime call returned a failure status
    #[error("{operation} failed: {code}")]
    Status { operation: &'static str, code: StatusCode },

    /// Access past the end of an allocation
    #[error("buffer access out of bounds: offset {offset} + size {size} > buffer size {buffer_size}")]
    OutOfBounds {
        offset: usize,
        size: usize,
        buffer_size: usize,
    },

    /// Program build failed; `log` is the raw compiler output
    #[error("program build failed on {device}: {code}")]
    Build {
        device: DeviceId,
        code: StatusCode,
        log: String,
    },
}

impl RuntimeError {
    /// Create a status error for `operation`
    pub fn status(operation: &'static str, code: StatusCode) -> Self {
        Self::Status { operation, code }
    }

    /// Status code carried by this error
    pub fn code(&self) -> StatusCode {
        match self {
            Self::Status { code, .. } | Self::Build { code, .. } => *code,
            Self::OutOfBounds { .. } => StatusCode::INVALID_VALUE,
        }
    }

    /// Name of the runtime operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Status { operation, .. } => operation,
            Self::OutOfBounds { .. } => "transfer",
            Self::Build { .. } => "build_program",
        }
    }
}
