//! Device runtime interface for matrixcl
//!
//! This crate provides:
//! - **DeviceRuntime**: the services the matrix layer consumes from a device
//!   driver (contexts, allocations, transfers, program builds)
//! - **StatusCode**: runtime status codes with stable descriptions
//! - **HostRuntime**: a reference runtime keeping allocations in host memory
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     matrixcl-core                        │
//! │      (ComputeContext, DeviceBuffer, Matrix2d, ...)       │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ Arc<dyn DeviceRuntime>
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    DeviceRuntime                         │
//! │   contexts · buffers · transfers · programs              │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!                       ▼
//!                 ┌───────────┐
//!                 │   Host    │
//!                 │  Runtime  │
//!                 └───────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use matrixcl_runtime::{DeviceRuntime, HostRuntime};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = HostRuntime::new();
//! let ctx = runtime.create_context()?;
//!
//! let buffer = runtime.allocate(ctx, 16)?;
//! let data = [1.0f32, 2.0, 3.0, 4.0];
//! let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_ne_bytes()).collect();
//! runtime.write(buffer, 0, &bytes)?;
//!
//! let mut out = [0u8; 4];
//! runtime.read(buffer, 4, &mut out)?;
//! assert_eq!(f32::from_ne_bytes(out), 2.0);
//!
//! runtime.release(buffer)?;
//! runtime.release_context(ctx)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod host;
pub mod runtime;
pub mod status;
pub mod types;

// Re-export public API
pub use error::{Result, RuntimeError};
pub use host::{HostRuntime, HostRuntimeConfig, HostStats};
pub use runtime::DeviceRuntime;
pub use status::StatusCode;
pub use types::{BufferHandle, ContextHandle, DeviceId, DeviceInfo, ProgramHandle};
