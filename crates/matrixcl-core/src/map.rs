//! Host mappings of 2D matrices
//!
//! A `GridMap` holds a host copy of a matrix's padded grid and addresses it
//! with the matrix's own [`Shape`], so indices mean the same thing as in
//! [`Matrix2d::get`]. Changes are written back on [`GridMap::unmap`]; a map
//! dropped without `unmap` writes back too and logs any failure.

use crate::error::Result;
use crate::matrix2d::Matrix2d;
use crate::shape::Shape;
use bytemuck::Pod;
use std::ops::{Index, IndexMut};

/// Mutable host view of a [`Matrix2d`]
///
/// # Example
///
/// ```rust
/// use matrixcl_core::{ComputeContext, Matrix2d};
///
/// # fn main() -> matrixcl_core::Result<()> {
/// let ctx = ComputeContext::host()?;
/// let mut m = Matrix2d::<f32>::new(&ctx, 3, 3)?;
/// m.clear()?;
///
/// let mut map = m.map()?;
/// map[(1, 1)] = 4.0;
/// *map.get_mut(2, 0)? += 1.0;
/// map.unmap()?;
///
/// assert_eq!(m.get(1, 1)?, 4.0);
/// assert_eq!(m.get(2, 0)?, 1.0);
/// # Ok(())
/// # }
/// ```
pub struct GridMap<'a, T: Pod> {
    matrix: &'a mut Matrix2d<T>,
    shape: Shape<2>,
    host: Vec<T>,
    dirty: bool,
}

impl<'a, T: Pod> GridMap<'a, T> {
    pub(crate) fn new(matrix: &'a mut Matrix2d<T>) -> Result<Self> {
        let host = matrix.read_padded()?;
        Ok(Self {
            shape: matrix.shape(),
            matrix,
            host,
            dirty: false,
        })
    }

    pub fn shape(&self) -> Shape<2> {
        self.shape
    }

    pub fn get(&self, ix: usize, iy: usize) -> Result<&T> {
        let offset = self.shape.offset([ix, iy])?;
        Ok(&self.host[offset])
    }

    pub fn get_mut(&mut self, ix: usize, iy: usize) -> Result<&mut T> {
        let offset = self.shape.offset([ix, iy])?;
        self.dirty = true;
        Ok(&mut self.host[offset])
    }

    /// Write changes back to the device and end the mapping
    pub fn unmap(mut self) -> Result<()> {
        let result = self.write_back();
        self.dirty = false;
        result
    }

    fn write_back(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.matrix.write_padded(&self.host)?;
        self.dirty = false;
        Ok(())
    }
}

impl<T: Pod> Index<(usize, usize)> for GridMap<'_, T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the coordinates are outside the logical extent.
    fn index(&self, (ix, iy): (usize, usize)) -> &T {
        match self.shape.offset([ix, iy]) {
            Ok(offset) => &self.host[offset],
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T: Pod> IndexMut<(usize, usize)> for GridMap<'_, T> {
    fn index_mut(&mut self, (ix, iy): (usize, usize)) -> &mut T {
        match self.shape.offset([ix, iy]) {
            Ok(offset) => {
                self.dirty = true;
                &mut self.host[offset]
            }
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T: Pod> Drop for GridMap<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.write_back() {
            tracing::error!(
                matrix = %self.matrix.name(),
                error = %err,
                "failed to write back grid mapping"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ComputeContext;
    use crate::error::Error;
    use matrixcl_runtime::HostRuntime;
    use std::sync::Arc;

    fn context() -> (HostRuntime, ComputeContext) {
        let host = HostRuntime::new();
        let ctx = ComputeContext::new(Arc::new(host.clone())).unwrap();
        (host, ctx)
    }

    #[test]
    fn indexing_matches_get() {
        let (_host, ctx) = context();
        let mut m = Matrix2d::<i32>::new(&ctx, 3, 2).unwrap();
        m.resize_with_rim(3, 2, 1).unwrap();
        m.copy_from_slice(&[1, 2, 3, 4, 5, 6]).unwrap();

        let map = m.map().unwrap();
        assert_eq!(map[(0, 0)], 1);
        assert_eq!(map[(2, 1)], 6);
        assert_eq!(*map.get(1, 1).unwrap(), 5);
        assert!(matches!(map.get(3, 0), Err(Error::Bounds(_))));
    }

    #[test]
    fn drop_writes_back() {
        let (_host, ctx) = context();
        let mut m = Matrix2d::<f32>::new(&ctx, 2, 2).unwrap();
        m.clear().unwrap();
        {
            let mut map = m.map().unwrap();
            map[(1, 0)] = 2.5;
        }
        assert_eq!(m.get(1, 0).unwrap(), 2.5);
    }

    #[test]
    fn clean_map_does_not_transfer() {
        let (host, ctx) = context();
        let mut m = Matrix2d::<f32>::new(&ctx, 2, 2).unwrap();
        m.clear().unwrap();

        let map = m.map().unwrap();
        host.lose_device();
        // nothing was modified, so unmapping needs no transfer
        assert!(map.unmap().is_ok());
        host.restore_device();
    }

    #[test]
    fn unmap_reports_write_back_failure() {
        let (host, ctx) = context();
        let mut m = Matrix2d::<f32>::new(&ctx, 2, 2).unwrap();
        m.clear().unwrap();

        let mut map = m.map().unwrap();
        map[(0, 0)] = 1.0;
        host.lose_device();
        assert!(matches!(map.unmap(), Err(Error::Io(_))));
        host.restore_device();

        assert_eq!(m.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    #[should_panic(expected = "outside extent")]
    fn index_out_of_range_panics() {
        let (_host, ctx) = context();
        let mut m = Matrix2d::<u8>::new(&ctx, 2, 2).unwrap();
        let map = m.map().unwrap();
        let _value = map[(2, 0)];
    }
}
