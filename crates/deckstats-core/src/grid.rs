//! The 72x72 RGBA pixel grid that every key image is drawn into.
//!
//! [`PixelGrid`] is an `embedded-graphics` [`DrawTarget`], so lines and text
//! are drawn with the usual primitives. Off-grid pixels are clipped silently.

use std::convert::Infallible;
use std::fmt;

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, RgbColor, Size};

use crate::error::{DeckError, Result};

/// Key icon edge length in pixels.
pub const ICON_SIZE: usize = 72;
/// Channels per pixel in the grid (R, G, B, A).
pub const GRID_CHANNELS: usize = 4;
/// Byte length of a full grid.
pub const GRID_BYTES: usize = ICON_SIZE * ICON_SIZE * GRID_CHANNELS;

/// Row-major, top-to-bottom RGBA pixels for one key.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pixels: Vec<u8>,
}

impl PixelGrid {
    /// A fully transparent black grid.
    pub fn new() -> Self {
        Self {
            pixels: vec![0; GRID_BYTES],
        }
    }

    /// A grid where every pixel has the given RGBA value.
    pub fn filled(rgba: [u8; 4]) -> Self {
        Self {
            pixels: rgba.repeat(ICON_SIZE * ICON_SIZE),
        }
    }

    /// Wrap caller-supplied RGBA bytes, validating the length.
    pub fn from_rgba(pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != GRID_BYTES {
            return Err(DeckError::InvalidGrid {
                expected: GRID_BYTES,
                actual: pixels.len(),
            });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> usize {
        ICON_SIZE
    }

    pub fn height(&self) -> usize {
        ICON_SIZE
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * ICON_SIZE + x) * GRID_CHANNELS;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Overwrite the pixel at `(x, y)`. Panics when out of bounds.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = (y * ICON_SIZE + x) * GRID_CHANNELS;
        self.pixels[i..i + GRID_CHANNELS].copy_from_slice(&rgba);
    }

    /// Number of pixels whose RGB channels are not all zero.
    pub fn lit_pixels(&self) -> usize {
        self.pixels
            .chunks_exact(GRID_CHANNELS)
            .filter(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
            .count()
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelGrid")
            .field("width", &ICON_SIZE)
            .field("height", &ICON_SIZE)
            .field("lit_pixels", &self.lit_pixels())
            .finish()
    }
}

impl OriginDimensions for PixelGrid {
    fn size(&self) -> Size {
        Size::new(ICON_SIZE as u32, ICON_SIZE as u32)
    }
}

impl DrawTarget for PixelGrid {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            if x >= ICON_SIZE || y >= ICON_SIZE {
                continue;
            }
            self.set_pixel(x, y, [color.r(), color.g(), color.b(), 0xFF]);
        }
        Ok(())
    }
}
