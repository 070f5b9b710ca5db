// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type shared by the renderers, the schedulers and the
//! encoders.  Nothing in the library recovers from any of these; they
//! all travel up to whoever asked for the image.

use failure::Fail;

/// Everything that can stop a render.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// A raster needs at least one pixel in each direction.
    #[fail(display = "raster dimensions {}x{} must both be non-zero", width, height)]
    EmptyRaster {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// width * height does not fit in memory addressing.
    #[fail(display = "raster dimensions {}x{} are too large", width, height)]
    RasterTooLarge {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// The plane window must cover a finite, positive area.
    #[fail(display = "plane window {}x{} must have a finite, positive size", width, height)]
    InvalidWindow {
        /// Requested plane width.
        width: f64,
        /// Requested plane height.
        height: f64,
    },

    /// Animations need at least one frame.
    #[fail(display = "an animation needs at least one frame")]
    NoFrames,

    /// The zoom factor must be finite and positive.
    #[fail(display = "zoom factor {} must be finite and positive", _0)]
    InvalidZoom(f64),

    /// Slices are at least one column wide.
    #[fail(display = "slice width must be at least one column")]
    ZeroSliceWidth,

    /// The bounded scheduler needs room for at least one frame.
    #[fail(display = "at least one concurrent frame job is required")]
    ZeroJobs,

    /// A raster handed to a renderer was sized for a different image.
    #[fail(
        display = "raster is {}x{} but the renderer expects {}x{}",
        found_width, found_height, expected_width, expected_height
    )]
    DimensionMismatch {
        /// Width the renderer was built for.
        expected_width: usize,
        /// Height the renderer was built for.
        expected_height: usize,
        /// Width of the raster supplied.
        found_width: usize,
        /// Height of the raster supplied.
        found_height: usize,
    },

    /// The raster buffer could not be allocated.
    #[fail(display = "could not allocate a raster of {} pixels", _0)]
    AllocationFailed(usize),

    /// A coloring function panicked inside a slice worker.  The raster
    /// it was filling is lost, and with it the whole render.
    #[fail(display = "a slice worker panicked while filling a raster")]
    WorkerPanicked,

    /// A frame job panicked outside its slice workers, typically in the
    /// per-frame coloring function generator.
    #[fail(display = "the job rendering frame {} panicked", _0)]
    FramePanicked(usize),

    /// Frames reached the animation buffer out of sequence.
    #[fail(display = "frame {} arrived when frame {} was expected", found, expected)]
    OutOfOrder {
        /// The frame id the buffer was waiting for.
        expected: usize,
        /// The frame id it was given.
        found: usize,
    },

    /// The coloring function produced an index the palette does not have.
    #[fail(display = "palette index {} is outside a palette of {} colors", index, len)]
    PaletteIndex {
        /// The offending index.
        index: u8,
        /// Number of entries in the palette.
        len: usize,
    },

    /// The encoder could not handle the image.
    #[fail(display = "failed to encode image: {}", _0)]
    Image(#[cause] image::ImageError),

    /// Writing the output failed.
    #[fail(display = "i/o failure: {}", _0)]
    Io(#[cause] std::io::Error),
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Image(err)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
