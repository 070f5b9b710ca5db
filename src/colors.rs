// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Palettes translate an escape iteration count into a color, either as
//! an index into the palette (for paletted animations) or as the color
//! itself (for direct-color images).  Every palette ends with black,
//! which is where points that never escape land.

use std::str::FromStr;

use image::Rgba;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 0xff]);

/// What the renderers need from a palette.
pub trait ColorPalette {
    /// Builds the color table.  Must run before anything else.
    fn precompute(&mut self);

    /// Index into `palette()` for a point that escaped after `iters`
    /// iterations.
    fn color_index(&self, iters: usize) -> u8;

    /// The palette entries.
    fn palette(&self) -> &[Rgba<u8>];

    /// The color itself.
    fn color(&self, iters: usize) -> Rgba<u8> {
        self.palette()[self.color_index(iters) as usize]
    }
}

/// Shades of gray, brightest for the fastest escapes unless inverted.
#[derive(Clone, Debug, Default)]
pub struct BwPalette {
    /// Darkest for the fastest escapes.
    pub inverse: bool,
    /// Iteration cap of the escape function.
    pub max_iters: usize,
    /// Gray step between consecutive iteration counts (wrapping).
    pub contrast: u8,
    colors: Vec<Rgba<u8>>,
}

impl BwPalette {
    /// Unprecomputed palette.
    pub fn new(max_iters: usize, contrast: u8, inverse: bool) -> Self {
        BwPalette {
            inverse,
            max_iters,
            contrast,
            colors: Vec::new(),
        }
    }
}

impl ColorPalette for BwPalette {
    fn precompute(&mut self) {
        self.colors = (0..0xffu8)
            .map(|i| {
                let step = self.contrast.wrapping_mul(i);
                let level = if self.inverse { step } else { 0xff - step };
                Rgba([level, level, level, 0xff])
            })
            .collect();
        self.colors.push(BLACK);
    }

    fn color_index(&self, iters: usize) -> u8 {
        if iters < self.max_iters {
            (iters % 0xff) as u8
        } else {
            0xff
        }
    }

    fn palette(&self) -> &[Rgba<u8>] {
        &self.colors
    }
}

/// The sixteen-stop gradient UltraFractal popularised.
#[derive(Clone, Debug, Default)]
pub struct UltraFractalPalette {
    /// Iteration cap of the escape function.
    pub max_iters: usize,
    colors: Vec<Rgba<u8>>,
}

const ULTRA_FRACTAL: [[u8; 3]; 16] = [
    [66, 30, 15],
    [25, 7, 26],
    [9, 1, 47],
    [4, 4, 73],
    [0, 7, 100],
    [12, 44, 138],
    [24, 82, 177],
    [57, 125, 209],
    [134, 181, 229],
    [211, 236, 248],
    [241, 233, 191],
    [248, 201, 95],
    [255, 170, 0],
    [204, 128, 0],
    [153, 87, 0],
    [106, 52, 3],
];

impl UltraFractalPalette {
    /// Unprecomputed palette.
    pub fn new(max_iters: usize) -> Self {
        UltraFractalPalette {
            max_iters,
            colors: Vec::new(),
        }
    }
}

impl ColorPalette for UltraFractalPalette {
    fn precompute(&mut self) {
        self.colors = ULTRA_FRACTAL
            .iter()
            .map(|&[r, g, b]| Rgba([r, g, b, 0xff]))
            .collect();
        self.colors.push(BLACK);
    }

    fn color_index(&self, iters: usize) -> u8 {
        if iters < self.max_iters {
            (iters % ULTRA_FRACTAL.len()) as u8
        } else {
            ULTRA_FRACTAL.len() as u8
        }
    }

    fn palette(&self) -> &[Rgba<u8>] {
        &self.colors
    }
}

const GREEN_STEPS: usize = 64;

/// Bright green fading to black.
#[derive(Clone, Debug, Default)]
pub struct GreenBlackPalette {
    /// Iteration cap of the escape function.
    pub max_iters: usize,
    colors: Vec<Rgba<u8>>,
}

impl GreenBlackPalette {
    /// Unprecomputed palette.
    pub fn new(max_iters: usize) -> Self {
        GreenBlackPalette {
            max_iters,
            colors: Vec::new(),
        }
    }
}

impl ColorPalette for GreenBlackPalette {
    fn precompute(&mut self) {
        self.colors = (0..GREEN_STEPS)
            .map(|i| {
                let fade = |peak: usize| (peak * (GREEN_STEPS - i) / GREEN_STEPS) as u8;
                Rgba([fade(40), fade(255), fade(90), 0xff])
            })
            .collect();
        self.colors.push(BLACK);
    }

    fn color_index(&self, iters: usize) -> u8 {
        if iters < self.max_iters {
            (iters % GREEN_STEPS) as u8
        } else {
            GREEN_STEPS as u8
        }
    }

    fn palette(&self) -> &[Rgba<u8>] {
        &self.colors
    }
}

/// The palettes selectable by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaletteKind {
    /// `bw`
    Bw,
    /// `bw-inv`
    BwInverse,
    /// `uf`
    UltraFractal,
    /// `gb`
    GreenBlack,
}

impl FromStr for PaletteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bw" => Ok(PaletteKind::Bw),
            "bw-inv" => Ok(PaletteKind::BwInverse),
            "uf" => Ok(PaletteKind::UltraFractal),
            "gb" => Ok(PaletteKind::GreenBlack),
            other => Err(format!(
                "invalid palette '{}' - expected 'bw', 'bw-inv', 'uf' or 'gb'",
                other
            )),
        }
    }
}

impl PaletteKind {
    /// A precomputed palette of this kind.  `contrast` only matters to
    /// the grayscale palettes.
    pub fn build(self, max_iters: usize, contrast: u8) -> Box<dyn ColorPalette + Send + Sync> {
        let mut palette: Box<dyn ColorPalette + Send + Sync> = match self {
            PaletteKind::Bw => Box::new(BwPalette::new(max_iters, contrast, false)),
            PaletteKind::BwInverse => Box::new(BwPalette::new(max_iters, contrast, true)),
            PaletteKind::UltraFractal => Box::new(UltraFractalPalette::new(max_iters)),
            PaletteKind::GreenBlack => Box::new(GreenBlackPalette::new(max_iters)),
        };
        palette.precompute();
        palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [PaletteKind; 4] = [
        PaletteKind::Bw,
        PaletteKind::BwInverse,
        PaletteKind::UltraFractal,
        PaletteKind::GreenBlack,
    ];

    #[test]
    fn every_index_is_inside_its_palette() {
        for &kind in &KINDS {
            let p = kind.build(1000, 15);
            assert!(p.palette().len() <= 256);
            for iters in 0..=1000 {
                assert!((p.color_index(iters) as usize) < p.palette().len(), "{:?}", kind);
            }
        }
    }

    #[test]
    fn interior_points_are_black() {
        for &kind in &KINDS {
            let p = kind.build(500, 15);
            assert_eq!(p.color(500), BLACK, "{:?}", kind);
            assert_eq!(p.color(9000), BLACK, "{:?}", kind);
        }
    }

    #[test]
    fn palette_sizes() {
        assert_eq!(PaletteKind::Bw.build(10, 1).palette().len(), 256);
        assert_eq!(PaletteKind::UltraFractal.build(10, 1).palette().len(), 17);
        assert_eq!(PaletteKind::GreenBlack.build(10, 1).palette().len(), 65);
    }

    #[test]
    fn bw_contrast_steps_down_from_white() {
        let p = PaletteKind::Bw.build(1000, 15);
        assert_eq!(p.color(0), Rgba([255, 255, 255, 255]));
        assert_eq!(p.color(2), Rgba([225, 225, 225, 255]));
        let inv = PaletteKind::BwInverse.build(1000, 15);
        assert_eq!(inv.color(2), Rgba([30, 30, 30, 255]));
    }

    #[test]
    fn ultra_fractal_cycles_every_sixteen() {
        let p = PaletteKind::UltraFractal.build(1000, 0);
        assert_eq!(p.color_index(3), p.color_index(19));
        assert_eq!(p.color(0), Rgba([66, 30, 15, 255]));
    }

    #[test]
    fn kinds_parse_by_name() {
        assert_eq!("bw-inv".parse::<PaletteKind>(), Ok(PaletteKind::BwInverse));
        assert_eq!("gb".parse::<PaletteKind>(), Ok(PaletteKind::GreenBlack));
        assert!("rainbow".parse::<PaletteKind>().is_err());
    }
}
