//! Typed device buffers
//!
//! A `DeviceBuffer<T>` owns at most one device allocation of `len` elements.
//! It is either empty (no allocation, `len == 0`) or allocated; the state
//! changes only through [`DeviceBuffer::resize`], so an allocation is
//! released exactly once.
//!
//! Contents after a resize that changes the length are undefined. Call
//! [`DeviceBuffer::clear`], [`DeviceBuffer::fill`] or
//! [`DeviceBuffer::write`] before reading.

use crate::context::ComputeContext;
use crate::error::{BoundsError, DeviceError, Direction, Error, Result};
use bytemuck::Pod;
use matrixcl_runtime::{BufferHandle, StatusCode};
use matrixcl_tracing::performance;
use std::fmt;
use std::marker::PhantomData;
use std::time::Instant;

/// Typed RAII wrapper around one device allocation
///
/// `T` must be `bytemuck::Pod` so that host slices can be handed to the
/// runtime as bytes without copying.
///
/// # Example
///
/// ```rust
/// use matrixcl_core::{ComputeContext, DeviceBuffer};
///
/// # fn main() -> matrixcl_core::Result<()> {
/// let ctx = ComputeContext::host()?;
/// let mut buf = DeviceBuffer::<f32>::new(&ctx);
/// buf.write(&[1.0, 2.0, 3.0])?;
/// assert_eq!(buf.len(), 3);
/// assert_eq!(buf.to_vec()?, vec![1.0, 2.0, 3.0]);
/// # Ok(())
/// # }
/// ```
pub struct DeviceBuffer<T> {
    context: ComputeContext,
    handle: Option<BufferHandle>,
    /// Number of T elements; zero exactly when `handle` is `None`
    len: usize,
    _phantom: PhantomData<T>,
}

impl<T: Pod> DeviceBuffer<T> {
    /// Empty buffer bound to `context`; nothing is allocated
    pub fn new(context: &ComputeContext) -> Self {
        Self {
            context: context.acquire(),
            handle: None,
            len: 0,
            _phantom: PhantomData,
        }
    }

    /// Buffer with `len` elements of undefined contents
    pub fn with_len(context: &ComputeContext, len: usize) -> Result<Self> {
        let mut buffer = Self::new(context);
        buffer.resize(len)?;
        Ok(buffer)
    }

    /// Get number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get total size in bytes
    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Raw device handle for kernel binding; `None` while empty
    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    pub fn context(&self) -> &ComputeContext {
        &self.context
    }

    /// Change the element count
    ///
    /// A no-op when `len` equals the current length. Otherwise the old
    /// allocation is released and `len` elements are allocated; contents are
    /// undefined. On failure the buffer is left empty.
    #[tracing::instrument(skip(self), fields(
        from = self.len,
        type_name = std::any::type_name::<T>()
    ))]
    pub fn resize(&mut self, len: usize) -> Result<()> {
        if len == self.len {
            return Ok(());
        }

        self.release_allocation()?;
        if len == 0 {
            return Ok(());
        }

        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| Error::Device(DeviceError::new("allocate", StatusCode::INVALID_BUFFER_SIZE)))?;

        let start = Instant::now();
        let handle = self
            .context
            .runtime()
            .allocate(self.context.handle(), bytes)
            .map_err(|err| Error::device("allocate", err))?;

        self.handle = Some(handle);
        self.len = len;

        performance::record_allocation(bytes, len, start.elapsed().as_micros() as u64);
        Ok(())
    }

    /// Set every element to the zero value of `T`
    ///
    /// A no-op on an empty buffer; never reallocates.
    pub fn clear(&mut self) -> Result<()> {
        self.fill(T::zeroed())
    }

    /// Broadcast `value` to every element
    #[tracing::instrument(skip(self, value), fields(
        elements = self.len,
        type_name = std::any::type_name::<T>()
    ))]
    pub fn fill(&mut self, value: T) -> Result<()> {
        let Some(handle) = self.handle else {
            return Ok(());
        };

        let start = Instant::now();
        self.context
            .runtime()
            .fill(handle, bytemuck::bytes_of(&value))
            .map_err(|err| Error::io(Direction::HostToDevice, err))?;

        performance::record_fill(self.size_bytes(), std::mem::size_of::<T>(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    /// Copy `src` into the buffer (H2D transfer)
    ///
    /// If `src.len()` differs from the current length the buffer is resized
    /// first; every element is then overwritten.
    #[tracing::instrument(skip(self, src), fields(
        elements = src.len(),
        bytes = std::mem::size_of_val(src),
        type_name = std::any::type_name::<T>()
    ))]
    pub fn write(&mut self, src: &[T]) -> Result<()> {
        self.resize(src.len())?;
        self.write_range(0, src)
    }

    /// Copy the whole buffer into `dst` (D2H transfer)
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `dst.len()` differs from the
    /// buffer length.
    pub fn read_into(&self, dst: &mut [T]) -> Result<()> {
        if dst.len() != self.len {
            return Err(Error::ShapeMismatch {
                expected: self.len,
                actual: dst.len(),
            });
        }
        self.read_range(0, dst)
    }

    /// Copy the whole buffer into a new vector
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mut out = vec![T::zeroed(); self.len];
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Read the element at `index`
    pub fn read_at(&self, index: usize) -> Result<T> {
        let mut value = T::zeroed();
        self.read_range(index, std::slice::from_mut(&mut value))?;
        Ok(value)
    }

    /// Write the element at `index`
    pub fn write_at(&mut self, index: usize, value: T) -> Result<()> {
        self.write_range(index, std::slice::from_ref(&value))
    }

    /// Write `src` starting at element `offset`
    pub fn write_range(&mut self, offset: usize, src: &[T]) -> Result<()> {
        let handle = match self.checked_handle(offset, src.len())? {
            Some(handle) => handle,
            None => return Ok(()),
        };

        let start = Instant::now();
        let bytes: &[u8] = bytemuck::cast_slice(src);
        self.context
            .runtime()
            .write(handle, offset * std::mem::size_of::<T>(), bytes)
            .map_err(|err| Error::io(Direction::HostToDevice, err))?;

        performance::record_transfer(bytes.len(), Direction::HostToDevice.as_str(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    /// Read into `dst` starting at element `offset`
    pub fn read_range(&self, offset: usize, dst: &mut [T]) -> Result<()> {
        let handle = match self.checked_handle(offset, dst.len())? {
            Some(handle) => handle,
            None => return Ok(()),
        };

        let start = Instant::now();
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(dst);
        let byte_len = bytes.len();
        self.context
            .runtime()
            .read(handle, offset * std::mem::size_of::<T>(), bytes)
            .map_err(|err| Error::io(Direction::DeviceToHost, err))?;

        performance::record_transfer(byte_len, Direction::DeviceToHost.as_str(), start.elapsed().as_micros() as u64);
        Ok(())
    }

    /// Deep copy on the same context
    ///
    /// The copy has its own allocation and identical contents; later writes
    /// to either buffer do not affect the other.
    #[tracing::instrument(skip(self), fields(elements = self.len))]
    pub fn try_clone(&self) -> Result<Self> {
        let copy = Self::with_len(&self.context, self.len)?;
        if let (Some(src), Some(dst)) = (self.handle, copy.handle) {
            let start = Instant::now();
            self.context
                .runtime()
                .copy(src, dst, self.size_bytes())
                .map_err(|err| Error::io(Direction::DeviceToDevice, err))?;
            performance::record_transfer(
                self.size_bytes(),
                Direction::DeviceToDevice.as_str(),
                start.elapsed().as_micros() as u64,
            );
        }
        Ok(copy)
    }

    /// Validate `offset..offset + count`; `None` means nothing to transfer
    fn checked_handle(&self, offset: usize, count: usize) -> Result<Option<BufferHandle>> {
        if offset.saturating_add(count) > self.len || offset > self.len {
            return Err(BoundsError::new(&[offset.max(self.len)], &[self.len]).into());
        }
        if count == 0 {
            return Ok(None);
        }
        Ok(self.handle)
    }
}

impl<T> DeviceBuffer<T> {
    fn release_allocation(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let size_bytes = self.len * std::mem::size_of::<T>();
        self.len = 0;

        self.context
            .runtime()
            .release(handle)
            .map_err(|err| Error::device("release", err))?;
        performance::record_release(size_bytes);
        Ok(())
    }
}

impl<T> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        if let Err(err) = self.release_allocation() {
            tracing::warn!(error = %err, "failed to release device buffer");
        }
    }
}

impl<T> fmt::Debug for DeviceBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("handle", &self.handle)
            .field("len", &self.len)
            .field("type_name", &std::any::type_name::<T>())
            .finish()
    }
}
