//! Conversion between [`PixelGrid`] and the device's bitmap byte layout.
//!
//! The device expects each row mirrored horizontally and each pixel as a
//! B, G, R triple with no alpha. Source column `c` of row `r` lands at
//! destination column `ICON_SIZE - 1 - c` of the same row.

use crate::grid::{GRID_CHANNELS, ICON_SIZE, PixelGrid};

/// Bytes per encoded pixel (B, G, R).
pub const ENCODED_CHANNELS: usize = 3;
/// Byte length of one encoded key image.
pub const ENCODED_BYTES: usize = ICON_SIZE * ICON_SIZE * ENCODED_CHANNELS;

/// One key image in device byte order. Always exactly [`ENCODED_BYTES`] long.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Box<[u8; ENCODED_BYTES]>,
}

impl EncodedImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// B, G, R triple at destination `(x, y)`.
    pub fn triple(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * ICON_SIZE + x) * ENCODED_CHANNELS;
        [self.bytes[i], self.bytes[i + 1], self.bytes[i + 2]]
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("len", &ENCODED_BYTES)
            .finish()
    }
}

/// Mirror each row, reorder to B, G, R and drop alpha.
pub fn encode(grid: &PixelGrid) -> EncodedImage {
    let src = grid.as_rgba();
    let mut bytes = Box::new([0u8; ENCODED_BYTES]);

    for r in 0..ICON_SIZE {
        let row_src = r * ICON_SIZE * GRID_CHANNELS;
        let row_dst = r * ICON_SIZE * ENCODED_CHANNELS;
        for c in 0..ICON_SIZE {
            let s = row_src + c * GRID_CHANNELS;
            let d = row_dst + (ICON_SIZE - 1 - c) * ENCODED_CHANNELS;
            bytes[d] = src[s + 2];
            bytes[d + 1] = src[s + 1];
            bytes[d + 2] = src[s];
        }
    }

    EncodedImage { bytes }
}

/// Undo [`encode`]. Alpha is not recoverable and comes back as 255.
pub fn decode(image: &EncodedImage) -> PixelGrid {
    let mut grid = PixelGrid::new();
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let [b, g, r] = image.triple(ICON_SIZE - 1 - x, y);
            grid.set_pixel(x, y, [r, g, b, 0xFF]);
        }
    }
    grid
}
