// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The raster is the only thing the tile workers write to.  It is a
//! dense, row-major grid; the workers never see it whole.  Instead the
//! raster is carved into vertical slices, each of which is a stack of
//! row segments borrowed mutably and independently, so disjoint
//! columns can be filled from different threads without locks.

use itertools::iproduct;

use crate::error::{RenderError, Result};
use crate::planes::{Pixel, RasterDimensions};

/// A grid of color values.  `T` is a palette index (`u8`) in indexed
/// mode or a full color in direct mode.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster<T> {
    dimensions: RasterDimensions,
    data: Vec<T>,
}

/// One vertical slice of a raster: the columns `left..left + width`
/// of every row, top to bottom.
pub(crate) struct ColumnSlice<'a, T> {
    pub left: usize,
    pub rows: Vec<&'a mut [T]>,
}

impl<T: Copy + Default> Raster<T> {
    /// Allocates a raster filled with `T::default()`.
    pub fn new(dimensions: RasterDimensions) -> Result<Self> {
        Self::filled(dimensions, T::default())
    }
}

impl<T: Copy> Raster<T> {
    /// Allocates a raster with every cell set to `value`.  Allocation
    /// failure is reported rather than aborting the process.
    pub fn filled(dimensions: RasterDimensions, value: T) -> Result<Self> {
        let len = dimensions.len();
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| RenderError::AllocationFailed(len))?;
        data.resize(len, value);
        Ok(Raster { dimensions, data })
    }

    /// Wraps an existing row-major buffer.
    pub fn from_vec(dimensions: RasterDimensions, data: Vec<T>) -> Option<Self> {
        if data.len() != dimensions.len() {
            return None;
        }
        Some(Raster { dimensions, data })
    }

    /// The size this raster was built for.
    pub fn dimensions(&self) -> RasterDimensions {
        self.dimensions
    }

    /// The value at a pixel, if it lies inside the raster.
    pub fn get(&self, pixel: Pixel) -> Option<T> {
        self.offset(pixel).map(|o| self.data[o])
    }

    /// Stores a value.  Writes outside the raster are dropped and
    /// reported by returning false.
    pub fn set(&mut self, pixel: Pixel, value: T) -> bool {
        match self.offset(pixel) {
            Some(o) => {
                self.data[o] = value;
                true
            }
            None => false,
        }
    }

    /// Overwrites every cell.
    pub fn fill(&mut self, value: T) {
        for cell in self.data.iter_mut() {
            *cell = value;
        }
    }

    /// Row-major view of the cells.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Gives up the row-major buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The rows, top to bottom.
    pub fn rows(&self) -> std::slice::Chunks<'_, T> {
        self.data.chunks(self.dimensions.width())
    }

    /// Every pixel coordinate in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> {
        let dims = self.dimensions;
        iproduct!(0..dims.height(), 0..dims.width()).map(|(y, x)| Pixel(x, y))
    }

    fn offset(&self, pixel: Pixel) -> Option<usize> {
        if pixel.0 >= self.dimensions.width() || pixel.1 >= self.dimensions.height() {
            return None;
        }
        Some(pixel.1 * self.dimensions.width() + pixel.0)
    }

    /// Splits the raster into `ceil(width / slice_width)` vertical
    /// slices; the last one takes whatever columns remain.
    pub(crate) fn column_slices_mut(&mut self, slice_width: usize) -> Vec<ColumnSlice<'_, T>> {
        let width = self.dimensions.width();
        let slice_width = slice_width.max(1);
        let count = width / slice_width + if width % slice_width == 0 { 0 } else { 1 };

        let mut slices: Vec<ColumnSlice<'_, T>> = (0..count)
            .map(|i| ColumnSlice {
                left: i * slice_width,
                rows: Vec::with_capacity(self.dimensions.height()),
            })
            .collect();

        for row in self.data.chunks_mut(width) {
            for (slice, segment) in slices.iter_mut().zip(row.chunks_mut(slice_width)) {
                slice.rows.push(segment);
            }
        }
        slices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: usize, h: usize) -> RasterDimensions {
        RasterDimensions::new(w, h).unwrap()
    }

    #[test]
    fn new_raster_is_default_filled() {
        let r: Raster<u8> = Raster::new(dims(3, 2)).unwrap();
        assert_eq!(r.as_slice(), &[0; 6]);
        assert_eq!(r.rows().count(), 2);
    }

    #[test]
    fn set_and_get_respect_bounds() {
        let mut r: Raster<u8> = Raster::new(dims(3, 2)).unwrap();
        assert!(r.set(Pixel(2, 1), 9));
        assert!(!r.set(Pixel(3, 0), 9));
        assert!(!r.set(Pixel(0, 2), 9));
        assert_eq!(r.get(Pixel(2, 1)), Some(9));
        assert_eq!(r.get(Pixel(3, 1)), None);
        assert_eq!(r.as_slice()[5], 9);
    }

    #[test]
    fn filled_raster_needs_no_default() {
        let r = Raster::filled(dims(2, 2), image::Rgba([0u8, 0, 0, 255])).unwrap();
        assert!(r.as_slice().iter().all(|p| p.0[3] == 255));
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Raster::from_vec(dims(2, 2), vec![1u8; 3]).is_none());
        let r = Raster::from_vec(dims(2, 2), vec![1u8, 2, 3, 4]).unwrap();
        assert_eq!(r.get(Pixel(0, 1)), Some(3));
    }

    #[test]
    fn pixels_walk_row_major() {
        let r: Raster<u8> = Raster::new(dims(2, 2)).unwrap();
        let all: Vec<Pixel> = r.pixels().collect();
        assert_eq!(all, vec![Pixel(0, 0), Pixel(1, 0), Pixel(0, 1), Pixel(1, 1)]);
    }

    #[test]
    fn column_slices_cover_every_cell_once() {
        let mut r: Raster<u8> = Raster::new(dims(7, 3)).unwrap();
        {
            let slices = r.column_slices_mut(3);
            assert_eq!(slices.len(), 3);
            assert_eq!(
                slices.iter().map(|s| s.left).collect::<Vec<_>>(),
                vec![0, 3, 6]
            );
            for (n, slice) in slices.into_iter().enumerate() {
                assert_eq!(slice.rows.len(), 3);
                for row in slice.rows {
                    for cell in row.iter_mut() {
                        *cell += n as u8 + 1;
                    }
                }
            }
        }
        assert_eq!(r.rows().next().unwrap(), &[1, 1, 1, 2, 2, 2, 3]);
        assert!(r.as_slice().iter().all(|&c| c >= 1 && c <= 3));
    }

    #[test]
    fn oversized_slice_width_yields_one_slice() {
        let mut r: Raster<u8> = Raster::new(dims(5, 2)).unwrap();
        let slices = r.column_slices_mut(50);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].rows[0].len(), 5);
    }
}
