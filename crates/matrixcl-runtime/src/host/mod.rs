//! Host reference runtime
//!
//! Implements [`DeviceRuntime`] with allocations in host memory. It behaves
//! like a strict driver: limits are enforced, handles are validated, fresh
//! allocations contain garbage, and the device can be marked as lost to
//! exercise transfer failures.
//!
//! ```rust
//! use matrixcl_runtime::{DeviceRuntime, HostRuntime};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = HostRuntime::new();
//! let ctx = runtime.create_context()?;
//! let buf = runtime.allocate(ctx, 16)?;
//! runtime.fill(buf, &[0; 4])?;
//! runtime.release(buf)?;
//! runtime.release_context(ctx)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod memory;
mod program;

pub use config::HostRuntimeConfig;
pub use memory::HostStats;

use crate::error::{Result, RuntimeError};
use crate::runtime::DeviceRuntime;
use crate::status::StatusCode;
use crate::types::{BufferHandle, ContextHandle, DeviceId, DeviceInfo, ProgramHandle};
use memory::{HostMemory, MemoryLimits};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runtime keeping device allocations in host memory
#[derive(Clone)]
pub struct HostRuntime {
    device: Arc<DeviceInfo>,
    memory: Arc<RwLock<HostMemory>>,
    lost: Arc<AtomicBool>,
}

impl HostRuntime {
    /// Host runtime with default limits
    pub fn new() -> Self {
        Self::with_config(HostRuntimeConfig::default())
    }

    /// Host runtime with explicit limits
    pub fn with_config(config: HostRuntimeConfig) -> Self {
        let device = DeviceInfo {
            id: DeviceId(0),
            name: config.device_name,
            global_mem_bytes: config.global_mem_bytes,
            max_alloc_bytes: config.max_alloc_bytes,
        };
        let limits = MemoryLimits {
            global_mem_bytes: config.global_mem_bytes,
            max_alloc_bytes: config.max_alloc_bytes,
            uninit_byte: config.uninit_byte,
        };
        tracing::debug!(device = %device, "host_runtime_created");

        Self {
            device: Arc::new(device),
            memory: Arc::new(RwLock::new(HostMemory::new(limits))),
            lost: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Host runtime configured from `MATRIXCL_HOST_*` variables
    pub fn from_env() -> Self {
        Self::with_config(HostRuntimeConfig::from_env())
    }

    /// Snapshot of allocation and context counters
    pub fn stats(&self) -> HostStats {
        self.memory.read().stats()
    }

    /// Simulate losing the device: context creation and transfers fail with
    /// `DEVICE_NOT_AVAILABLE` until [`HostRuntime::restore_device`].
    ///
    /// Releases keep working so that owners can still clean up.
    pub fn lose_device(&self) {
        tracing::warn!(device = %self.device, "host device marked as lost");
        self.lost.store(true, Ordering::SeqCst);
    }

    /// Undo [`HostRuntime::lose_device`]
    pub fn restore_device(&self) {
        self.lost.store(false, Ordering::SeqCst);
    }

    fn ensure_available(&self, operation: &'static str) -> Result<()> {
        if self.lost.load(Ordering::SeqCst) {
            Err(RuntimeError::status(operation, StatusCode::DEVICE_NOT_AVAILABLE))
        } else {
            Ok(())
        }
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRuntime for HostRuntime {
    fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn create_context(&self) -> Result<ContextHandle> {
        self.ensure_available("create_context")?;
        Ok(self.memory.write().create_context())
    }

    fn release_context(&self, context: ContextHandle) -> Result<()> {
        self.memory.write().release_context(context)
    }

    fn finish(&self, context: ContextHandle) -> Result<()> {
        self.ensure_available("finish")?;
        // host transfers complete before returning, nothing is queued
        self.memory.read().check_context("finish", context)
    }

    fn allocate(&self, context: ContextHandle, bytes: usize) -> Result<BufferHandle> {
        self.ensure_available("allocate")?;
        self.memory.write().allocate(context, bytes)
    }

    fn release(&self, buffer: BufferHandle) -> Result<()> {
        self.memory.write().release(buffer)
    }

    fn buffer_size(&self, buffer: BufferHandle) -> Result<usize> {
        self.memory.read().buffer_size(buffer)
    }

    fn write(&self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        self.ensure_available("write")?;
        self.memory.write().write(buffer, offset, data)
    }

    fn read(&self, buffer: BufferHandle, offset: usize, data: &mut [u8]) -> Result<()> {
        self.ensure_available("read")?;
        self.memory.read().read(buffer, offset, data)
    }

    fn fill(&self, buffer: BufferHandle, pattern: &[u8]) -> Result<()> {
        self.ensure_available("fill")?;
        self.memory.write().fill(buffer, pattern)
    }

    fn copy(&self, src: BufferHandle, dst: BufferHandle, bytes: usize) -> Result<()> {
        self.ensure_available("copy")?;
        self.memory.write().copy(src, dst, bytes)
    }

    fn build_program(&self, context: ContextHandle, source: &str, options: &str) -> Result<ProgramHandle> {
        self.ensure_available("build_program")?;
        let mut memory = self.memory.write();
        memory.check_context("build_program", context)?;

        if source.trim().is_empty() {
            return Err(RuntimeError::status("build_program", StatusCode::INVALID_VALUE));
        }
        if !program::check_options(options) {
            return Err(RuntimeError::status("build_program", StatusCode::INVALID_BUILD_OPTIONS));
        }
        if let Err(log) = program::check_source(source) {
            return Err(RuntimeError::Build {
                device: self.device.id,
                code: StatusCode::BUILD_PROGRAM_FAILURE,
                log,
            });
        }

        Ok(memory.register_program(context))
    }

    fn release_program(&self, program: ProgramHandle) -> Result<()> {
        self.memory.write().release_program(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_configured_device() {
        let runtime = HostRuntime::with_config(HostRuntimeConfig {
            device_name: "unit".into(),
            ..HostRuntimeConfig::with_memory(4096)
        });
        assert_eq!(runtime.device().name, "unit");
        assert_eq!(runtime.device().global_mem_bytes, 4096);
        assert_eq!(runtime.device().max_alloc_bytes, 4096);
    }

    #[test]
    fn clones_share_state() {
        let runtime = HostRuntime::new();
        let other = runtime.clone();
        let ctx = runtime.create_context().unwrap();
        let _buf = other.allocate(ctx, 64).unwrap();
        assert_eq!(runtime.stats().live_buffers, 1);
        assert_eq!(runtime.stats().bytes_in_use, 64);
    }

    #[test]
    fn lost_device_fails_transfers_but_allows_release() {
        let runtime = HostRuntime::new();
        let ctx = runtime.create_context().unwrap();
        let buf = runtime.allocate(ctx, 4).unwrap();

        runtime.lose_device();
        let err = runtime.write(buf, 0, &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(err.code(), StatusCode::DEVICE_NOT_AVAILABLE);
        assert_eq!(
            runtime.create_context().unwrap_err().code(),
            StatusCode::DEVICE_NOT_AVAILABLE
        );

        runtime.release(buf).unwrap();
        runtime.release_context(ctx).unwrap();

        runtime.restore_device();
        assert!(runtime.create_context().is_ok());
    }

    #[test]
    fn build_program_paths() {
        let runtime = HostRuntime::new();
        let ctx = runtime.create_context().unwrap();

        let prog = runtime
            .build_program(ctx, "__kernel void zero(__global float* a) { a[0] = 0.0f; }", "-DRIM=1")
            .unwrap();
        assert_eq!(runtime.stats().live_programs, 1);
        runtime.release_program(prog).unwrap();

        let err = runtime.build_program(ctx, "void f( {", "").unwrap_err();
        match err {
            RuntimeError::Build { device, code, log } => {
                assert_eq!(device, DeviceId(0));
                assert_eq!(code, StatusCode::BUILD_PROGRAM_FAILURE);
                assert!(log.starts_with("<source>:1:"), "{log}");
            }
            other => panic!("expected build failure, got {other:?}"),
        }

        assert_eq!(
            runtime.build_program(ctx, "  ", "").unwrap_err().code(),
            StatusCode::INVALID_VALUE
        );
        assert_eq!(
            runtime.build_program(ctx, "void f() {}", "O3").unwrap_err().code(),
            StatusCode::INVALID_BUILD_OPTIONS
        );
    }

    #[test]
    fn finish_validates_context() {
        let runtime = HostRuntime::new();
        let ctx = runtime.create_context().unwrap();
        runtime.finish(ctx).unwrap();
        runtime.release_context(ctx).unwrap();
        assert_eq!(runtime.finish(ctx).unwrap_err().code(), StatusCode::INVALID_CONTEXT);
    }
}
