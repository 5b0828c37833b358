//! N-dimensional extents with rim padding
//!
//! A `Shape<N>` describes a logical grid of `extent[0] x ... x extent[N-1]`
//! cells surrounded by `rim` padding cells on every side. The padded grid is
//! stored linearly with dimension 0 varying fastest:
//!
//! ```text
//!   extent [4, 3], rim 1  ->  padded [6, 5], 30 cells
//!
//!   r r r r r r
//!   r . . . . r      logical (ix, iy) lives at
//!   r . . . . r      (iy + rim) * 6 + (ix + rim)
//!   r . . . . r
//!   r r r r r r
//! ```
//!
//! [`Shape::offset`] is the only place logical coordinates are mapped to
//! physical offsets.

use crate::error::BoundsError;

/// Logical extent plus rim padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape<const N: usize> {
    extent: [usize; N],
    rim: usize,
}

impl<const N: usize> Shape<N> {
    pub fn new(extent: [usize; N], rim: usize) -> Self {
        Self { extent, rim }
    }

    /// Logical extent, without the rim
    pub fn extent(&self) -> [usize; N] {
        self.extent
    }

    pub fn rim(&self) -> usize {
        self.rim
    }

    /// Extent including the rim on both sides of every dimension
    ///
    /// Saturates instead of overflowing; a saturated shape cannot be
    /// allocated.
    pub fn padded_extent(&self) -> [usize; N] {
        let pad = self.rim.saturating_mul(2);
        self.extent.map(|e| e.saturating_add(pad))
    }

    /// Number of cells in the padded grid
    pub fn padded_len(&self) -> usize {
        self.padded_extent().iter().fold(1usize, |acc, &e| acc.saturating_mul(e))
    }

    /// Number of logical cells
    pub fn logical_len(&self) -> usize {
        self.extent.iter().fold(1usize, |acc, &e| acc.saturating_mul(e))
    }

    pub fn contains(&self, coords: [usize; N]) -> bool {
        coords.iter().zip(self.extent.iter()).all(|(c, e)| c < e)
    }

    /// Physical offset of logical `coords`
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if any coordinate is outside the extent; rim
    /// cells are never addressable through this mapping.
    pub fn offset(&self, coords: [usize; N]) -> Result<usize, BoundsError> {
        if !self.contains(coords) {
            return Err(BoundsError::new(&coords, &self.extent));
        }

        let padded = self.padded_extent();
        let mut offset = 0;
        let mut stride = 1;
        for (c, p) in coords.iter().zip(padded.iter()) {
            offset += (c + self.rim) * stride;
            stride *= p;
        }
        Ok(offset)
    }

    /// Physical offsets of every logical cell in row-major order
    /// (dimension 0 fastest)
    pub fn logical_offsets(&self) -> LogicalOffsets<N> {
        LogicalOffsets {
            shape: *self,
            next: [0; N],
            remaining: self.logical_len(),
        }
    }
}

/// Iterator returned by [`Shape::logical_offsets`]
#[derive(Debug, Clone)]
pub struct LogicalOffsets<const N: usize> {
    shape: Shape<N>,
    next: [usize; N],
    remaining: usize,
}

impl<const N: usize> Iterator for LogicalOffsets<N> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let offset = self.shape.offset(self.next).ok()?;
        self.remaining -= 1;

        for (c, e) in self.next.iter_mut().zip(self.shape.extent.iter()) {
            *c += 1;
            if *c < *e {
                break;
            }
            *c = 0;
        }
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const N: usize> ExactSizeIterator for LogicalOffsets<N> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_sizes() {
        let shape = Shape::new([4, 3], 1);
        assert_eq!(shape.padded_extent(), [6, 5]);
        assert_eq!(shape.padded_len(), 30);
        assert_eq!(shape.logical_len(), 12);

        let no_rim = Shape::new([4, 3], 0);
        assert_eq!(no_rim.padded_len(), 12);

        let only_rim = Shape::new([0, 0], 2);
        assert_eq!(only_rim.padded_len(), 16);
        assert_eq!(only_rim.logical_len(), 0);
    }

    #[test]
    fn offset_adds_rim_to_each_coordinate() {
        let shape = Shape::new([4, 3], 1);
        assert_eq!(shape.offset([0, 0]).unwrap(), 7);
        assert_eq!(shape.offset([3, 2]).unwrap(), 3 * 6 + 4);
        assert_eq!(Shape::new([4, 3], 0).offset([3, 2]).unwrap(), 11);
    }

    #[test]
    fn out_of_range_coordinates_fail() {
        let shape = Shape::new([4, 3], 2);
        let err = shape.offset([4, 0]).unwrap_err();
        assert_eq!(err.coords, vec![4, 0]);
        assert_eq!(err.extent, vec![4, 3]);
        assert!(shape.offset([0, 3]).is_err());
        assert!(!shape.contains([0, 3]));
    }

    #[test]
    fn logical_offsets_skip_rim() {
        let shape = Shape::new([2, 2], 1);
        let offsets: Vec<_> = shape.logical_offsets().collect();
        assert_eq!(offsets, vec![5, 6, 9, 10]);
        assert_eq!(shape.logical_offsets().len(), 4);
    }

    #[test]
    fn three_dimensional_offsets() {
        let shape = Shape::new([2, 3, 4], 1);
        assert_eq!(shape.padded_extent(), [4, 5, 6]);
        // (1+1) + (2+1)*4 + (3+1)*4*5
        assert_eq!(shape.offset([1, 2, 3]).unwrap(), 2 + 12 + 80);
        assert_eq!(shape.logical_offsets().count(), 24);
    }

    #[test]
    fn empty_extent_has_no_logical_cells() {
        let shape = Shape::new([0, 5], 1);
        assert_eq!(shape.logical_offsets().count(), 0);
        assert!(shape.offset([0, 0]).is_err());
    }
}
