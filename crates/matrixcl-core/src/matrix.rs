//! Named linear matrices
//!
//! `Matrix<T>` is the base every shaped matrix is built on: a device buffer,
//! the context it lives in, an optional name and a rim count. The storage
//! primitives (`resize`, `clear`, `fill`, `set`) are crate-private; shaped
//! adapters such as [`crate::Matrix2d`] expose them with coordinate
//! semantics.

use crate::buffer::DeviceBuffer;
use crate::context::ComputeContext;
use crate::error::Result;
use bytemuck::Pod;
use matrixcl_runtime::BufferHandle;

/// Typed linear buffer with a name and rim count
#[derive(Debug)]
pub struct Matrix<T> {
    name: String,
    rim: usize,
    buffer: DeviceBuffer<T>,
}

impl<T: Pod> Matrix<T> {
    pub(crate) fn new(context: &ComputeContext) -> Self {
        Self {
            name: String::new(),
            rim: 0,
            buffer: DeviceBuffer::new(context),
        }
    }

    /// Name of the matrix; empty unless set
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of elements in the device buffer, rim included
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn rim(&self) -> usize {
        self.rim
    }

    pub fn context(&self) -> &ComputeContext {
        self.buffer.context()
    }

    /// Raw device handle for kernel binding; `None` while unallocated
    pub fn handle(&self) -> Option<BufferHandle> {
        self.buffer.handle()
    }

    pub(crate) fn buffer(&self) -> &DeviceBuffer<T> {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut DeviceBuffer<T> {
        &mut self.buffer
    }

    pub(crate) fn set_rim(&mut self, rim: usize) {
        self.rim = rim;
    }

    /// Resize the storage to `len` elements; contents become undefined
    pub(crate) fn resize(&mut self, len: usize) -> Result<()> {
        self.buffer.resize(len)
    }

    pub(crate) fn clear(&mut self) -> Result<()> {
        self.buffer.clear()
    }

    pub(crate) fn fill(&mut self, value: T) -> Result<()> {
        self.buffer.fill(value)
    }

    /// Replace the contents with `src`, resizing first if the length differs
    pub(crate) fn set(&mut self, src: &[T]) -> Result<()> {
        self.buffer.write(src)
    }

    pub(crate) fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            name: self.name.clone(),
            rim: self.rim,
            buffer: self.buffer.try_clone()?,
        })
    }
}
