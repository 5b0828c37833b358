//! # matrixcl-core - Device-Resident Matrices
//!
//! Rectangular numeric grids stored on a compute device, with optional rim
//! padding for stencil-style neighbour access, sharing one compute context
//! across matrices.
//!
//! ## Architecture
//!
//! ```text
//! Matrix2d<T>      coordinate adapter: Shape<2> + Matrix<T>
//!   ↓
//! Matrix<T>        name, rim, linear storage
//!   ↓
//! DeviceBuffer<T>  one device allocation (allocated / empty)
//!   ↓
//! ComputeContext   shared device context, released by the last holder
//!   ↓
//! matrixcl-runtime::DeviceRuntime
//! ```
//!
//! ## Key Guarantees
//!
//! 1. **Single release**: buffers and contexts are released exactly once
//! 2. **Undefined after resize**: a resize that changes the padded length
//!    leaves contents undefined; call `clear`, `fill` or `copy_from_slice`
//! 3. **Rim isolation**: logical coordinates outside `[0, width) x [0, height)`
//!    fail with [`Error::Bounds`] and never touch rim cells
//! 4. **Synchronous**: after a call returns, later reads observe its effect
//!
//! ## Example
//!
//! ```rust
//! use matrixcl_core::{ComputeContext, Matrix2d};
//!
//! # fn main() -> matrixcl_core::Result<()> {
//! let ctx = ComputeContext::host()?;
//!
//! let mut grid = Matrix2d::<f32>::empty(&ctx);
//! grid.set_name("temperature");
//! grid.resize_with_rim(4, 3, 1)?;
//! grid.clear()?;
//!
//! grid.put(0, 0, 5.0)?;
//! grid.put(3, 2, 9.0)?;
//!
//! let values = grid.to_vec()?;
//! assert_eq!(values[0], 5.0);
//! assert_eq!(values[11], 9.0);
//!
//! // matrices share the context instead of creating new ones
//! let other = Matrix2d::<f32>::new(&ctx, 4, 3)?;
//! assert!(other.context().same_context(&ctx));
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod context;
pub mod error;
pub mod map;
pub mod matrix;
pub mod matrix2d;
pub mod shape;

// Re-export primary types
pub use buffer::DeviceBuffer;
pub use context::{ComputeContext, Program};
pub use error::{BoundsError, CompileFailure, DeviceError, Direction, Error, IoFailure, Result};
pub use map::GridMap;
pub use matrix::Matrix;
pub use matrix2d::Matrix2d;
pub use shape::{LogicalOffsets, Shape};

pub use matrixcl_runtime::{
    BufferHandle, ContextHandle, DeviceId, DeviceInfo, DeviceRuntime, HostRuntime, HostRuntimeConfig, StatusCode,
};
