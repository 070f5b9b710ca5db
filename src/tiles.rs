// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The tile renderer fills one raster.  Each pixel is mapped onto the
//! plane window and colored by a caller-supplied function; the raster
//! is handed out in vertical slices to scoped worker threads, and the
//! caller waits at the end of the scope until every slice is done.

use log::debug;
use num::Complex;

use crate::error::{RenderError, Result};
use crate::planes::{PlaneMapper, PlaneWindow, RasterDimensions};
use crate::raster::{ColumnSlice, Raster};

/// Renders rasters of a fixed size for a (resettable) plane window.
#[derive(Clone, Debug)]
pub struct TileRenderer {
    mapper: PlaneMapper,
    slice_width: usize,
}

impl TileRenderer {
    /// Requires the raster size, the window of the plane to draw, and
    /// the width of the vertical slice each worker draws.  A slice
    /// width at or beyond the raster width means a single worker.
    pub fn new(
        dimensions: RasterDimensions,
        window: PlaneWindow,
        slice_width: usize,
    ) -> Result<Self> {
        if slice_width == 0 {
            return Err(RenderError::ZeroSliceWidth);
        }
        Ok(TileRenderer {
            mapper: PlaneMapper::new(dimensions, window),
            slice_width,
        })
    }

    /// One slice per available CPU, but never narrower than a column.
    pub fn default_slice_width(width: usize) -> usize {
        (width / num_cpus::get()).max(1)
    }

    /// Points the renderer at a new window, leaving everything else
    /// as it was.  Used when a pooled renderer is picked up for a new
    /// frame.
    pub fn set_window(&mut self, window: PlaneWindow) {
        self.mapper.window = window;
    }

    /// The window the next render will draw.
    pub fn window(&self) -> PlaneWindow {
        self.mapper.window
    }

    /// The raster size this renderer draws.
    pub fn dimensions(&self) -> RasterDimensions {
        self.mapper.dimensions
    }

    /// Width of the vertical slices handed to workers.
    pub fn slice_width(&self) -> usize {
        self.slice_width
    }

    /// Allocates a raster and fills it.
    pub fn render<T, F>(&self, color_fn: &F) -> Result<Raster<T>>
    where
        T: Copy + Default + Send,
        F: Fn(Complex<f64>) -> T + Sync,
    {
        let mut raster = Raster::new(self.mapper.dimensions)?;
        self.render_into(&mut raster, color_fn)?;
        Ok(raster)
    }

    /// Fills every pixel of `raster` with `color_fn` applied to the
    /// pixel's plane coordinate.  Blocks until all slices are drawn.
    /// If any worker panics the contents of `raster` are unspecified.
    pub fn render_into<T, F>(&self, raster: &mut Raster<T>, color_fn: &F) -> Result<()>
    where
        T: Copy + Send,
        F: Fn(Complex<f64>) -> T + Sync,
    {
        let expected = self.mapper.dimensions;
        let found = raster.dimensions();
        if expected != found {
            return Err(RenderError::DimensionMismatch {
                expected_width: expected.width(),
                expected_height: expected.height(),
                found_width: found.width(),
                found_height: found.height(),
            });
        }

        let slices = raster.column_slices_mut(self.slice_width);
        debug!(
            "rendering {}x{} in {} slices of width {}",
            expected.width(),
            expected.height(),
            slices.len(),
            self.slice_width
        );

        let mapper = &self.mapper;
        crossbeam::scope(|spawner| {
            for slice in slices {
                spawner.spawn(move |_| render_slice(mapper, slice, color_fn));
            }
        })
        .map_err(|_| RenderError::WorkerPanicked)
    }
}

/// Processes one vertical slice of the image, top to bottom.
fn render_slice<T, F>(mapper: &PlaneMapper, slice: ColumnSlice<'_, T>, color_fn: &F)
where
    F: Fn(Complex<f64>) -> T,
{
    let left = slice.left;
    for (py, row) in slice.rows.into_iter().enumerate() {
        let im = mapper.row_to_im(py);
        for (offset, cell) in row.iter_mut().enumerate() {
            *cell = color_fn(Complex::new(mapper.column_to_re(left + offset), im));
        }
    }
}

/// Renders a standalone image in one call.
pub fn render_image<T, F>(
    dimensions: RasterDimensions,
    window: PlaneWindow,
    slice_width: usize,
    color_fn: &F,
) -> Result<Raster<T>>
where
    T: Copy + Default + Send,
    F: Fn(Complex<f64>) -> T + Sync,
{
    TileRenderer::new(dimensions, window, slice_width)?.render(color_fn)
}
