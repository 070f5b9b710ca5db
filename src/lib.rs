#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time fractal renderer
//!
//! An escape-time fractal colors each point of the complex plane by
//! how many times a map such as z -> z^2 + c can be applied before the
//! iterate runs off to infinity.  This crate maps a window of the plane
//! onto a raster, colors every pixel with a caller-supplied function
//! (usually an escape function fed through a palette), and does so in
//! parallel: each raster is cut into vertical slices drawn on their own
//! threads.
//!
//! Animations are runs of such rasters whose window zooms in a little
//! more every frame and whose coloring can change from frame to frame.
//! They can be drawn one frame at a time, or with several frames in
//! flight at once; either way the frames come out in order and the two
//! results are identical.

extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;

pub mod animation;
pub mod colors;
pub mod encode;
pub mod error;
pub mod julia;
pub mod planes;
pub mod pool;
pub mod raster;
pub mod tiles;

pub use animation::{AnimationBuffer, AnimationConfig, AnimationRenderer, RenderedFrame};
pub use colors::{ColorPalette, PaletteKind};
pub use error::RenderError;
pub use julia::JuliaSetFn;
pub use planes::{Pixel, PlaneMapper, PlaneWindow, RasterDimensions};
pub use raster::Raster;
pub use tiles::{render_image, TileRenderer};
