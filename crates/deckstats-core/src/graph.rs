//! History graph: bucketed bar heights drawn as vertical lines.
//!
//! Samples are grouped left to right into non-overlapping buckets of
//! `bucket_width` samples. Each bucket becomes one 1px-wide bar at column
//! `x = bucket index`, rising from the bottom row by the bucket's mean value.
//! With the default capacity of 288 samples and 4 samples per bucket the
//! graph is exactly one icon (72 columns) wide.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};
use crate::grid::{ICON_SIZE, PixelGrid};

/// Samples averaged into one bar unless configured otherwise.
pub const DEFAULT_BUCKET_WIDTH: usize = 4;

/// What to do with a trailing group shorter than the bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialBucket {
    /// Skip it. Matches the long-standing rendering of the deck.
    #[default]
    Drop,
    /// Render it as the mean of the samples it does have.
    Average,
}

/// One bar of the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphBar {
    /// Column, equal to the bucket index.
    pub x: u32,
    /// Mean of the bucket's samples, in sample units.
    pub height: f32,
}

/// Colour and vertical scale of a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStyle {
    pub color: Rgb888,
    /// Value that maps to the full icon height. `None` draws one pixel per unit.
    pub full_scale: Option<f32>,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            color: Rgb888::RED,
            full_scale: None,
        }
    }
}

/// Average consecutive samples into bars.
pub fn graph_bars(
    samples: &[f32],
    bucket_width: usize,
    partial: PartialBucket,
) -> Result<Vec<GraphBar>> {
    if bucket_width == 0 {
        return Err(DeckError::InvalidArgument(
            "graph bucket width must be positive".to_string(),
        ));
    }

    let bars = samples
        .chunks(bucket_width)
        .enumerate()
        .filter(|(_, bucket)| bucket.len() == bucket_width || partial == PartialBucket::Average)
        .map(|(i, bucket)| GraphBar {
            x: i as u32,
            height: bucket.iter().sum::<f32>() / bucket.len() as f32,
        })
        .collect();
    Ok(bars)
}

/// Bar height in whole pixels, clamped to the icon.
fn bar_pixels(height: f32, full_scale: Option<f32>) -> i32 {
    let scaled = match full_scale {
        Some(max) if max > 0.0 => height / max * ICON_SIZE as f32,
        _ => height,
    };
    // NaN saturates to 0 in the cast.
    scaled.round().clamp(0.0, ICON_SIZE as f32) as i32
}

/// Draw bars onto `grid` from the bottom row upward.
pub fn draw_graph(grid: &mut PixelGrid, bars: &[GraphBar], style: &GraphStyle) {
    let baseline = ICON_SIZE as i32;
    let stroke = PrimitiveStyle::with_stroke(style.color, 1);
    for bar in bars {
        let pixels = bar_pixels(bar.height, style.full_scale);
        if pixels == 0 || bar.x as usize >= ICON_SIZE {
            continue;
        }
        let x = bar.x as i32;
        Line::new(Point::new(x, baseline - 1), Point::new(x, baseline - pixels))
            .into_styled(stroke)
            .draw(grid)
            .ok();
    }
}

/// Render a full graph key image from a chronological snapshot.
pub fn render_graph(
    samples: &[f32],
    bucket_width: usize,
    partial: PartialBucket,
    style: &GraphStyle,
) -> Result<PixelGrid> {
    let bars = graph_bars(samples, bucket_width, partial)?;
    let mut grid = PixelGrid::new();
    draw_graph(&mut grid, &bars, style);
    Ok(grid)
}
