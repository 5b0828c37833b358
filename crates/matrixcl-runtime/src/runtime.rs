//! Device runtime trait
//!
//! A `DeviceRuntime` is the boundary between matrixcl and whatever actually
//! owns device memory: an OpenCL/CUDA driver binding, or the in-process
//! [`crate::HostRuntime`]. The trait covers exactly the services the matrix
//! layer consumes:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                DeviceRuntime                  │
//! │  - contexts  (create / release)               │
//! │  - buffers   (allocate / release / size)      │
//! │  - transfers (write / read / fill / copy)     │
//! │  - programs  (build / release)                │
//! └───────────────────────┬───────────────────────┘
//!                         │
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!     ┌─────────┐    ┌─────────┐    ┌─────────┐
//!     │  Host   │    │ OpenCL  │    │  CUDA   │
//!     └─────────┘    └─────────┘    └─────────┘
//! ```
//!
//! All calls are synchronous: when a call returns `Ok`, its effect is
//! visible to every later call on the same runtime.

use crate::error::Result;
use crate::types::{BufferHandle, ContextHandle, DeviceInfo, ProgramHandle};

/// Services a device runtime provides to the matrix layer
///
/// Methods take `&self`; implementations synchronise internally so that a
/// runtime can be shared between contexts behind an `Arc`.
pub trait DeviceRuntime: Send + Sync {
    // ============================================================================================
    // Device & Contexts
    // ============================================================================================

    /// Description of the device this runtime drives
    fn device(&self) -> &DeviceInfo;

    /// Create a new execution context on the device
    ///
    /// # Errors
    ///
    /// Returns `DEVICE_NOT_AVAILABLE` (or another runtime status) when no
    /// context can be created.
    fn create_context(&self) -> Result<ContextHandle>;

    /// Release a context created by [`DeviceRuntime::create_context`]
    ///
    /// # Errors
    ///
    /// Returns `INVALID_CONTEXT` if the handle is unknown or already released.
    fn release_context(&self, context: ContextHandle) -> Result<()>;

    /// Block until all work queued on `context` has completed
    fn finish(&self, context: ContextHandle) -> Result<()>;

    // ============================================================================================
    // Buffer Management
    // ============================================================================================

    /// Allocate `bytes` of device memory in `context`
    ///
    /// Contents of a fresh allocation are unspecified.
    ///
    /// # Errors
    ///
    /// - `INVALID_CONTEXT` if the context is not live
    /// - `INVALID_BUFFER_SIZE` for zero-byte or over-limit requests
    /// - `MEM_OBJECT_ALLOCATION_FAILURE` when device memory is exhausted
    fn allocate(&self, context: ContextHandle, bytes: usize) -> Result<BufferHandle>;

    /// Release a buffer
    ///
    /// # Errors
    ///
    /// Returns `INVALID_MEM_OBJECT` if the handle is unknown.
    fn release(&self, buffer: BufferHandle) -> Result<()>;

    /// Size of a buffer in bytes
    fn buffer_size(&self, buffer: BufferHandle) -> Result<usize>;

    // ============================================================================================
    // Transfers
    // ============================================================================================

    /// Copy `data` from host memory into `buffer` starting at byte `offset`
    fn write(&self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()>;

    /// Copy bytes starting at `offset` in `buffer` into `data`
    fn read(&self, buffer: BufferHandle, offset: usize, data: &mut [u8]) -> Result<()>;

    /// Repeat `pattern` over the whole buffer
    ///
    /// # Errors
    ///
    /// Returns `INVALID_VALUE` if the pattern is empty or its length does not
    /// divide the buffer size.
    fn fill(&self, buffer: BufferHandle, pattern: &[u8]) -> Result<()>;

    /// Copy the first `bytes` of `src` into `dst` on the device
    fn copy(&self, src: BufferHandle, dst: BufferHandle, bytes: usize) -> Result<()>;

    // ============================================================================================
    // Programs
    // ============================================================================================

    /// Build a program from source for this runtime's device
    ///
    /// # Errors
    ///
    /// Returns [`crate::RuntimeError::Build`] carrying the build log when
    /// compilation fails.
    fn build_program(&self, context: ContextHandle, source: &str, options: &str) -> Result<ProgramHandle>;

    /// Release a built program
    fn release_program(&self, program: ProgramHandle) -> Result<()>;
}
