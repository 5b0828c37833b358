//! Two-dimensional matrices with rim padding
//!
//! `Matrix2d<T>` is a thin coordinate adapter: a [`Matrix<T>`] holds the
//! padded linear storage and a [`Shape<2>`] maps logical `(ix, iy)` to
//! physical offsets. The backing length is always
//! `(width + 2*rim) * (height + 2*rim)`.
//!
//! # Element Access
//!
//! - [`Matrix2d::get`] / [`Matrix2d::put`] transfer one element per call
//! - [`Matrix2d::map`] reads the padded grid once and hands out `&mut T`
//!   per cell, writing everything back on [`GridMap::unmap`]
//! - [`Matrix2d::copy_from_slice`] / [`Matrix2d::to_vec`] move the whole
//!   logical grid in row-major order
//!
//! # Example
//!
//! ```rust
//! use matrixcl_core::{ComputeContext, Matrix2d};
//!
//! # fn main() -> matrixcl_core::Result<()> {
//! let ctx = ComputeContext::host()?;
//! let mut m = Matrix2d::<f32>::new(&ctx, 4, 3)?;
//! m.resize_with_rim(4, 3, 1)?;
//! assert_eq!(m.len(), 30);
//!
//! m.clear()?;
//! m.put(3, 2, 9.0)?;
//! assert_eq!(m.get(3, 2)?, 9.0);
//! assert!(m.get(4, 0).is_err());
//! # Ok(())
//! # }
//! ```

use crate::context::ComputeContext;
use crate::error::{Error, Result};
use crate::map::GridMap;
use crate::matrix::Matrix;
use crate::shape::Shape;
use bytemuck::Pod;
use matrixcl_runtime::BufferHandle;
use matrixcl_tracing::performance::PerformanceSpan;

/// Device-resident 2D grid of `T` with rim padding
#[derive(Debug)]
pub struct Matrix2d<T> {
    matrix: Matrix<T>,
    extent: [usize; 2],
}

impl<T: Pod> Matrix2d<T> {
    /// Zero-sized matrix; nothing is allocated until a resize
    pub fn empty(context: &ComputeContext) -> Self {
        Self {
            matrix: Matrix::new(context),
            extent: [0, 0],
        }
    }

    /// `width x height` matrix without rim; contents are undefined
    pub fn new(context: &ComputeContext, width: usize, height: usize) -> Result<Self> {
        let mut matrix = Self::empty(context);
        matrix.resize(width, height)?;
        Ok(matrix)
    }

    /// Matrix with `extent = [width, height]`; contents are undefined
    pub fn from_extent(context: &ComputeContext, extent: [usize; 2]) -> Result<Self> {
        Self::new(context, extent[0], extent[1])
    }

    pub fn width(&self) -> usize {
        self.extent[0]
    }

    pub fn height(&self) -> usize {
        self.extent[1]
    }

    pub fn rim(&self) -> usize {
        self.matrix.rim()
    }

    /// Logical `[width, height]`
    pub fn extent(&self) -> [usize; 2] {
        self.extent
    }

    /// Logical extent and rim, for work-group sizing
    pub fn shape(&self) -> Shape<2> {
        Shape::new(self.extent, self.matrix.rim())
    }

    /// Number of elements in the padded buffer
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn name(&self) -> &str {
        self.matrix.name()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.matrix.set_name(name);
    }

    /// Raw device handle for kernel binding; `None` while unallocated
    pub fn handle(&self) -> Option<BufferHandle> {
        self.matrix.handle()
    }

    pub fn context(&self) -> &ComputeContext {
        self.matrix.context()
    }

    /// Underlying linear matrix
    pub fn as_matrix(&self) -> &Matrix<T> {
        &self.matrix
    }

    /// Change the extent, keeping the current rim
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        self.resize_with_rim(width, height, self.rim())
    }

    /// Change the extent and rim
    ///
    /// The device buffer is reallocated only when the padded length changes.
    /// Contents are undefined afterwards either way. If the allocation fails
    /// the matrix is left empty with a zero extent and rim.
    #[tracing::instrument(skip(self), fields(name = %self.name()))]
    pub fn resize_with_rim(&mut self, width: usize, height: usize, rim: usize) -> Result<()> {
        let shape = Shape::new([width, height], rim);
        match self.matrix.resize(shape.padded_len()) {
            Ok(()) => {
                self.extent = shape.extent();
                self.matrix.set_rim(rim);
                Ok(())
            }
            Err(err) => {
                self.extent = [0, 0];
                self.matrix.set_rim(0);
                Err(err)
            }
        }
    }

    /// Set every cell, rim included, to zero
    pub fn clear(&mut self) -> Result<()> {
        self.matrix.clear()
    }

    /// Set every cell, rim included, to `value`
    pub fn fill(&mut self, value: T) -> Result<()> {
        self.matrix.fill(value)
    }

    /// Write `width * height` logical values in row-major order
    ///
    /// The padded image is written in one transfer with rim cells zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `values.len() != width * height`.
    pub fn copy_from_slice(&mut self, values: &[T]) -> Result<()> {
        let _perf = PerformanceSpan::for_operation("matrix2d_copy_from_slice");
        let shape = self.shape();
        if values.len() != shape.logical_len() {
            return Err(Error::ShapeMismatch {
                expected: shape.logical_len(),
                actual: values.len(),
            });
        }

        let mut image = vec![T::zeroed(); shape.padded_len()];
        for (value, offset) in values.iter().zip(shape.logical_offsets()) {
            image[offset] = *value;
        }
        self.matrix.set(&image)
    }

    /// Read the logical cells in row-major order
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let _perf = PerformanceSpan::for_operation("matrix2d_to_vec");
        let padded = self.matrix.buffer().to_vec()?;
        Ok(self.shape().logical_offsets().map(|offset| padded[offset]).collect())
    }

    /// Read the element at `(ix, iy)`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`] unless `ix < width` and `iy < height`.
    pub fn get(&self, ix: usize, iy: usize) -> Result<T> {
        let offset = self.shape().offset([ix, iy])?;
        self.matrix.buffer().read_at(offset)
    }

    /// Write the element at `(ix, iy)`
    pub fn put(&mut self, ix: usize, iy: usize, value: T) -> Result<()> {
        let offset = self.shape().offset([ix, iy])?;
        self.matrix.buffer_mut().write_at(offset, value)
    }

    /// Map the matrix into host memory for many element updates
    pub fn map(&mut self) -> Result<GridMap<'_, T>> {
        GridMap::new(self)
    }

    /// Deep copy with independent storage and identical contents
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            matrix: self.matrix.try_clone()?,
            extent: self.extent,
        })
    }

    pub(crate) fn read_padded(&self) -> Result<Vec<T>> {
        self.matrix.buffer().to_vec()
    }

    pub(crate) fn write_padded(&mut self, image: &[T]) -> Result<()> {
        self.matrix.set(image)
    }
}
