//! Contains the PlaneMapper struct, which describes a relationship
//! between a raster on the integral plane with an origin at 0,0, and a
//! window on the complex plane described by its center and its extent.
//! The window's center always lands on the raster's geometric center.
use num::Complex;

use crate::error::{RenderError, Result};

/// Describes the width and height of a raster that is assumed to
/// start at 0,0.  Both are strictly positive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RasterDimensions {
    width: usize,
    height: usize,
}

impl RasterDimensions {
    /// Refuses empty rasters, and rasters whose pixel count overflows.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyRaster { width, height });
        }
        if width.checked_mul(height).is_none() {
            return Err(RenderError::RasterTooLarge { width, height });
        }
        Ok(RasterDimensions { width, height })
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of cells in the raster.  Used to calculate
    /// memory needs.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Never true for dimensions built through `new`.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The rectangle of the complex plane currently mapped onto the
/// raster, treating the real part as the x-component and the
/// imaginary part as the y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneWindow {
    center: Complex<f64>,
    width: f64,
    height: f64,
}

impl PlaneWindow {
    /// Constructor.  The extent must be finite and positive.
    pub fn new(center: Complex<f64>, width: f64, height: f64) -> Result<Self> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(width) || !usable(height) {
            return Err(RenderError::InvalidWindow { width, height });
        }
        Ok(PlaneWindow {
            center,
            width,
            height,
        })
    }

    /// Point of the plane shown at the middle of the raster.
    #[inline]
    pub fn center(&self) -> Complex<f64> {
        self.center
    }

    /// Extent along the real axis.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Extent along the imaginary axis.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The same window with both extents multiplied by `factor`.  The
    /// center does not move.  Fails like `new` if the result is not a
    /// usable window.
    pub fn zoomed(&self, factor: f64) -> Result<Self> {
        PlaneWindow::new(self.center, self.width * factor, self.height * factor)
    }
}

/// Describes the x, y of a cell in a raster: column first, then row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pixel(pub usize, pub usize);

/// Maps points between a raster and a window on the complex plane.
/// Rows grow downward and so does the imaginary part; there is no
/// vertical flip.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneMapper {
    /// The raster side of the mapping.
    pub dimensions: RasterDimensions,
    /// The complex side of the mapping.
    pub window: PlaneWindow,
}

impl PlaneMapper {
    /// Both halves are already validated by their own constructors.
    pub fn new(dimensions: RasterDimensions, window: PlaneWindow) -> Self {
        PlaneMapper { dimensions, window }
    }

    /// Real part for a raster column.
    #[inline]
    pub fn column_to_re(&self, px: usize) -> f64 {
        self.window.center.re
            + ((px as f64) / (self.dimensions.width as f64) - 0.5) * self.window.width
    }

    /// Imaginary part for a raster row.
    #[inline]
    pub fn row_to_im(&self, py: usize) -> f64 {
        self.window.center.im
            + ((py as f64) / (self.dimensions.height as f64) - 0.5) * self.window.height
    }

    /// Given a pixel on the raster, return the complex number at the
    /// equivalent location of the plane window.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(self.column_to_re(pixel.0), self.row_to_im(pixel.1))
    }

    /// Given a complex number, map it as closely as possible to a pixel
    /// of the raster, or `None` if it falls outside the window.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        let left = ((point.re - self.window.center.re) / self.window.width + 0.5)
            * (self.dimensions.width as f64);
        let top = ((point.im - self.window.center.im) / self.window.height + 0.5)
            * (self.dimensions.height as f64);
        if left < 0.0
            || left >= (self.dimensions.width as f64)
            || top < 0.0
            || top >= (self.dimensions.height as f64)
        {
            return None;
        }
        Some(Pixel(left as usize, top as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(width: usize, height: usize, cx: f64, cy: f64, pw: f64, ph: f64) -> PlaneMapper {
        PlaneMapper::new(
            RasterDimensions::new(width, height).unwrap(),
            PlaneWindow::new(Complex::new(cx, cy), pw, ph).unwrap(),
        )
    }

    #[test]
    fn dimensions_fail_on_empty_shape() {
        assert!(RasterDimensions::new(0, 4).is_err());
        assert!(RasterDimensions::new(4, 0).is_err());
        assert!(RasterDimensions::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn dimensions_pass_on_good_shape() {
        let dims = RasterDimensions::new(4, 3).unwrap();
        assert_eq!((dims.width(), dims.height()), (4, 3));
        assert_eq!(dims.len(), 12);
        assert!(!dims.is_empty());
    }

    #[test]
    fn window_fails_on_bad_extent() {
        let origin = Complex::new(0.0, 0.0);
        assert!(PlaneWindow::new(origin, 0.0, 1.0).is_err());
        assert!(PlaneWindow::new(origin, 1.0, -1.0).is_err());
        assert!(PlaneWindow::new(origin, std::f64::NAN, 1.0).is_err());
        assert!(PlaneWindow::new(origin, std::f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn zoom_keeps_center_and_scales_extent() {
        let w = PlaneWindow::new(Complex::new(-0.5, 0.25), 4.0, 2.0).unwrap();
        let z = w.zoomed(0.5).unwrap();
        assert_eq!(z.center(), w.center());
        assert_eq!(z.width(), 2.0);
        assert_eq!(z.height(), 1.0);
    }

    #[test]
    fn zoom_refuses_unusable_factors() {
        let w = PlaneWindow::new(Complex::new(0.0, 0.0), 4.0, 2.0).unwrap();
        assert!(w.zoomed(0.0).is_err());
        assert!(w.zoomed(-1.0).is_err());
        assert!(w.zoomed(std::f64::NAN).is_err());
    }

    #[test]
    fn pixel_to_point_on_centered_planes() {
        let pm = mapper(4, 4, 0.0, 0.0, 4.0, 4.0);
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 1)), Complex::new(1.0, -1.0));
    }

    #[test]
    fn pixel_to_point_on_offset_planes() {
        let pm = mapper(640, 320, 1.0, -1.0, 4.0, 2.0);
        assert_eq!(pm.pixel_to_point(&Pixel(320, 160)), Complex::new(1.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-1.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(480, 0)), Complex::new(2.0, -2.0));
    }

    #[test]
    fn rows_grow_downward_without_flip() {
        let pm = mapper(10, 10, 0.0, 0.0, 2.0, 2.0);
        assert!(pm.row_to_im(0) < pm.row_to_im(9));
    }

    #[test]
    fn point_to_pixel_inverts_pixel_to_point() {
        let pm = mapper(640, 640, 0.0, 0.0, 4.0, 4.0);
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(320, 320)));
        assert_eq!(pm.point_to_pixel(&Complex::new(-2.0, -2.0)), Some(Pixel(0, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(1.0, -2.0)), Some(Pixel(480, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(2.0, 2.0)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(-2.5, 0.0)), None);
    }
}
