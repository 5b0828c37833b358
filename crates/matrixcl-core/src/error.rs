//! Error types for matrixcl-core operations
//!
//! Runtime failures are classified where they happen: allocation and context
//! failures become [`DeviceError`], host/device transfers become
//! [`IoFailure`], and program builds become [`CompileFailure`]. Coordinate
//! and length checks made on the host never reach the runtime.

use matrixcl_runtime::{DeviceId, RuntimeError, StatusCode};
use std::fmt;

/// Result type for matrixcl-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in matrixcl-core operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Context creation, allocation or release failed
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Program build failed
    #[error(transparent)]
    Compile(#[from] CompileFailure),

    /// Host/device transfer failed
    #[error(transparent)]
    Io(#[from] IoFailure),

    /// Logical coordinates outside the extent
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    /// Host data length does not match the matrix
    #[error("Shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl Error {
    /// Classify a runtime failure from a non-transfer operation
    pub(crate) fn device(operation: &'static str, err: RuntimeError) -> Self {
        match err {
            RuntimeError::Build { device, code, log } => Error::Compile(CompileFailure { device, code, log }),
            other => Error::Device(DeviceError {
                operation,
                code: other.code(),
                message: Some(other.to_string()),
            }),
        }
    }

    /// Classify a runtime failure from a transfer
    pub(crate) fn io(direction: Direction, err: RuntimeError) -> Self {
        Error::Io(IoFailure {
            direction,
            code: err.code(),
            message: err.to_string(),
        })
    }

    /// Runtime status code, if the failure came from the runtime
    pub fn code(&self) -> Option<StatusCode> {
        match self {
            Error::Device(err) => Some(err.code),
            Error::Compile(err) => Some(err.code),
            Error::Io(err) => Some(err.code),
            Error::Bounds(_) | Error::ShapeMismatch { .. } => None,
        }
    }

    /// Whether a runtime status code is attached
    pub fn has_code(&self) -> bool {
        self.code().is_some()
    }

    /// Extra detail reported with the failure (runtime message or build log)
    pub fn message(&self) -> Option<&str> {
        match self {
            Error::Device(err) => err.message.as_deref(),
            Error::Compile(err) => Some(&err.log),
            Error::Io(err) => Some(&err.message),
            Error::Bounds(_) | Error::ShapeMismatch { .. } => None,
        }
    }
}

/// Failure of a runtime call that is not a transfer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Device error in {operation}: {code}")]
pub struct DeviceError {
    /// Runtime operation that failed
    pub operation: &'static str,
    pub code: StatusCode,
    pub message: Option<String>,
}

impl DeviceError {
    pub fn new(operation: &'static str, code: StatusCode) -> Self {
        Self {
            operation,
            code,
            message: None,
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Stable description of the status code, `"unclassified"` if unknown
    pub fn classification(&self) -> &'static str {
        self.code.describe()
    }
}

/// Program build failure with the raw compiler output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Program build failed on {device}: {code}")]
pub struct CompileFailure {
    /// Device the program was built for
    pub device: DeviceId,
    pub code: StatusCode,
    /// Raw build log
    pub log: String,
}

/// Direction of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
    DeviceToDevice,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::HostToDevice => "H2D",
            Direction::DeviceToHost => "D2H",
            Direction::DeviceToDevice => "D2D",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host/device transfer failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{direction} transfer failed: {code}")]
pub struct IoFailure {
    pub direction: Direction,
    pub code: StatusCode,
    pub message: String,
}

/// Coordinates outside a logical extent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Coordinates {coords:?} outside extent {extent:?}")]
pub struct BoundsError {
    pub coords: Vec<usize>,
    pub extent: Vec<usize>,
}

impl BoundsError {
    pub fn new(coords: &[usize], extent: &[usize]) -> Self {
        Self {
            coords: coords.to_vec(),
            extent: extent.to_vec(),
        }
    }
}
