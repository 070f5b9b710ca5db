// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hands finished rasters to the `image` encoders.  Paletted rasters
//! are expanded through their palette first; a palette of at most 256
//! colors survives GIF encoding exactly.

use std::io::Write;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageFormat, Rgba, RgbaImage};
use log::info;

use crate::animation::AnimationBuffer;
use crate::error::{RenderError, Result};
use crate::raster::Raster;

/// Expands a paletted raster into full colors.
pub fn expand(raster: &Raster<u8>, palette: &[Rgba<u8>]) -> Result<RgbaImage> {
    let mut pixels: Vec<u8> = Vec::with_capacity(raster.as_slice().len() * 4);
    for &index in raster.as_slice() {
        let color = palette.get(index as usize).ok_or(RenderError::PaletteIndex {
            index,
            len: palette.len(),
        })?;
        pixels.extend_from_slice(&color.0);
    }
    to_image(raster, pixels)
}

fn to_image<T: Copy>(raster: &Raster<T>, pixels: Vec<u8>) -> Result<RgbaImage> {
    let dims = raster.dimensions();
    RgbaImage::from_raw(dims.width() as u32, dims.height() as u32, pixels).ok_or(
        RenderError::RasterTooLarge {
            width: dims.width(),
            height: dims.height(),
        },
    )
}

/// Writes a looping GIF, one frame per buffer entry.  Delays are in
/// hundredths of a second.
pub fn write_gif<W: Write>(
    writer: W,
    buffer: &AnimationBuffer<u8>,
    palette: &[Rgba<u8>],
) -> Result<()> {
    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(Repeat::Infinite)?;
    for frame in buffer.frames() {
        let image = expand(&frame.raster, palette)?;
        let delay = Delay::from_numer_denom_ms(frame.delay.saturating_mul(10), 1);
        encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
    }
    info!("encoded {} frames", buffer.len());
    Ok(())
}

/// Writes a paletted raster as a PNG.
pub fn write_png_indexed<P: AsRef<Path>>(
    path: P,
    raster: &Raster<u8>,
    palette: &[Rgba<u8>],
) -> Result<()> {
    expand(raster, palette)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Writes a direct-color raster as a PNG.
pub fn write_png_direct<P: AsRef<Path>>(path: P, raster: &Raster<Rgba<u8>>) -> Result<()> {
    let pixels: Vec<u8> = raster.as_slice().iter().flat_map(|p| p.0.iter().cloned()).collect();
    to_image(raster, pixels)?.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
