//! Shared compute context
//!
//! A `ComputeContext` wraps one device execution context. Copies share the
//! underlying resource; the device context is released exactly once, when
//! the last holder (context copy, buffer, matrix or program) is dropped.
//!
//! ```text
//! Matrix2d ──┐
//! Matrix2d ──┼──► Arc<ContextInner> ──► DeviceRuntime::release_context
//! Program  ──┘        (last drop)
//! ```

use crate::error::{Error, Result};
use matrixcl_runtime::{ContextHandle, DeviceInfo, DeviceRuntime, HostRuntime, ProgramHandle};
use std::fmt;
use std::sync::Arc;

struct ContextInner {
    runtime: Arc<dyn DeviceRuntime>,
    handle: ContextHandle,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        match self.runtime.release_context(self.handle) {
            Ok(()) => tracing::debug!(context = %self.handle, "compute_context_released"),
            Err(err) => tracing::warn!(
                context = %self.handle,
                error = %err,
                "failed to release compute context"
            ),
        }
    }
}

/// Reference-counted handle to a device execution context
///
/// Cloning (or [`ComputeContext::acquire`]) never creates a new device
/// context and cannot fail.
///
/// # Example
///
/// ```rust
/// use matrixcl_core::ComputeContext;
///
/// # fn main() -> matrixcl_core::Result<()> {
/// let ctx = ComputeContext::host()?;
/// let shared = ctx.acquire();
/// assert_eq!(ctx.handle(), shared.handle());
/// assert_eq!(ctx.holders(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ComputeContext {
    inner: Arc<ContextInner>,
}

impl ComputeContext {
    /// Create a device context on `runtime`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] (typically `DEVICE_NOT_AVAILABLE`) if the
    /// runtime cannot create a context.
    pub fn new(runtime: Arc<dyn DeviceRuntime>) -> Result<Self> {
        let handle = runtime
            .create_context()
            .map_err(|err| Error::device("create_context", err))?;

        tracing::debug!(context = %handle, device = %runtime.device(), "compute_context_created");

        Ok(Self {
            inner: Arc::new(ContextInner { runtime, handle }),
        })
    }

    /// Create a context on a host runtime configured from the environment
    #[tracing::instrument]
    pub fn host() -> Result<Self> {
        Self::new(Arc::new(HostRuntime::from_env()))
    }

    /// New reference to the same device context
    pub fn acquire(&self) -> Self {
        self.clone()
    }

    /// Number of live references to the device context
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both references point at the same device context
    pub fn same_context(&self, other: &ComputeContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn device(&self) -> &DeviceInfo {
        self.inner.runtime.device()
    }

    /// Raw context handle for kernel dispatch
    pub fn handle(&self) -> ContextHandle {
        self.inner.handle
    }

    /// Runtime owning the context
    pub fn runtime(&self) -> &dyn DeviceRuntime {
        self.inner.runtime.as_ref()
    }

    /// Block until all queued work on this context has completed
    pub fn finish(&self) -> Result<()> {
        self.runtime()
            .finish(self.handle())
            .map_err(|err| Error::device("finish", err))
    }

    /// Build a program for this context's device
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compile`] with the raw build log when the build fails.
    #[tracing::instrument(skip(self, source), fields(context = %self.handle(), source_len = source.len()))]
    pub fn build_program(&self, source: &str, options: &str) -> Result<Program> {
        let handle = self
            .runtime()
            .build_program(self.handle(), source, options)
            .map_err(|err| Error::device("build_program", err))?;

        tracing::debug!(program = %handle, "program_built");

        Ok(Program {
            context: self.acquire(),
            handle,
        })
    }
}

impl fmt::Debug for ComputeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeContext")
            .field("handle", &self.inner.handle)
            .field("device", &self.device().name)
            .field("holders", &self.holders())
            .finish()
    }
}

/// A built program, released when dropped
///
/// Holds a reference to its context so the context outlives the program.
pub struct Program {
    context: ComputeContext,
    handle: ProgramHandle,
}

impl Program {
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn context(&self) -> &ComputeContext {
        &self.context
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("handle", &self.handle)
            .field("context", &self.context.handle())
            .finish()
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if let Err(err) = self.context.runtime().release_program(self.handle) {
            tracing::warn!(program = %self.handle, error = %err, "failed to release program");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixcl_runtime::StatusCode;
    use serial_test::serial;

    fn host_context() -> (HostRuntime, ComputeContext) {
        let host = HostRuntime::new();
        let ctx = ComputeContext::new(Arc::new(host.clone())).unwrap();
        (host, ctx)
    }

    #[test]
    fn copies_share_one_device_context() {
        let (host, ctx) = host_context();
        let a = ctx.acquire();
        let b = a.clone();

        assert!(ctx.same_context(&b));
        assert_eq!(ctx.holders(), 3);
        assert_eq!(host.stats().contexts_created, 1);

        drop(a);
        drop(ctx);
        assert_eq!(b.holders(), 1);
        assert_eq!(host.stats().live_contexts, 1);

        drop(b);
        assert_eq!(host.stats().live_contexts, 0);
        assert_eq!(host.stats().contexts_released, 1);
    }

    #[test]
    fn creation_fails_when_device_is_lost() {
        let host = HostRuntime::new();
        host.lose_device();
        let err = ComputeContext::new(Arc::new(host.clone())).unwrap_err();
        match err {
            Error::Device(device) => {
                assert_eq!(device.operation, "create_context");
                assert_eq!(device.code(), StatusCode::DEVICE_NOT_AVAILABLE);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn program_keeps_context_alive() {
        let (host, ctx) = host_context();
        let program = ctx.build_program("__kernel void k() {}", "").unwrap();
        drop(ctx);

        assert_eq!(host.stats().live_contexts, 1);
        assert_eq!(program.context().holders(), 1);

        drop(program);
        assert_eq!(host.stats().live_programs, 0);
        assert_eq!(host.stats().live_contexts, 0);
    }

    #[test]
    fn failed_build_reports_log() {
        let (_host, ctx) = host_context();
        let err = ctx.build_program("__kernel void k() {", "").unwrap_err();
        match err {
            Error::Compile(failure) => {
                assert_eq!(failure.device, ctx.device().id);
                assert_eq!(failure.code, StatusCode::BUILD_PROGRAM_FAILURE);
                assert!(failure.log.contains("never closed"), "{}", failure.log);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn finish_succeeds_on_live_context() {
        let (_host, ctx) = host_context();
        ctx.finish().unwrap();
    }

    #[test]
    #[serial]
    fn host_context_reads_environment() {
        std::env::set_var("MATRIXCL_HOST_DEVICE_NAME", "ctx-test");
        let ctx = ComputeContext::host();
        std::env::remove_var("MATRIXCL_HOST_DEVICE_NAME");

        assert_eq!(ctx.unwrap().device().name, "ctx-test");
    }
}
