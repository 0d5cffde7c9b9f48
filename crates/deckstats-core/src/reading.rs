//! Key image showing the latest value of a metric above its label.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use crate::grid::PixelGrid;

/// Baseline origin of the value text.
const VALUE_ORIGIN: Point = Point::new(10, 44);
/// Baseline origin of the label text.
const LABEL_ORIGIN: Point = Point::new(10, 64);

/// Value text as shown on the key: rounded to a whole number with a degree sign.
pub fn format_reading(value: f32) -> String {
    if value.is_finite() {
        format!("{value:.0}\u{b0}")
    } else {
        "--".to_string()
    }
}

/// Render `value` in large type with `label` underneath.
pub fn render_reading(label: &str, value: f32, color: Rgb888) -> PixelGrid {
    let mut grid = PixelGrid::new();

    let value_style = MonoTextStyle::new(&FONT_10X20, color);
    Text::new(&format_reading(value), VALUE_ORIGIN, value_style)
        .draw(&mut grid)
        .ok();

    let label_style = MonoTextStyle::new(&FONT_6X10, color);
    Text::new(label, LABEL_ORIGIN, label_style)
        .draw(&mut grid)
        .ok();

    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ICON_SIZE;

    fn lit_rows(grid: &PixelGrid) -> Vec<usize> {
        (0..ICON_SIZE)
            .filter(|&y| (0..ICON_SIZE).any(|x| grid.pixel(x, y)[3] != 0))
            .collect()
    }

    #[test]
    fn formats_whole_degrees() {
        assert_eq!(format_reading(45.4), "45\u{b0}");
        assert_eq!(format_reading(45.6), "46\u{b0}");
        assert_eq!(format_reading(-3.2), "-3\u{b0}");
        assert_eq!(format_reading(f32::NAN), "--");
    }

    #[test]
    fn draws_value_and_label() {
        let grid = render_reading("CPU", 52.0, Rgb888::WHITE);
        assert!(grid.lit_pixels() > 0);
        let rows = lit_rows(&grid);
        // Value glyphs sit above the value baseline, label glyphs above the label baseline.
        assert!(rows.iter().any(|&y| y < 44));
        assert!(rows.iter().any(|&y| (54..64).contains(&y)));
        // Nothing left of the text origin.
        assert!((0..ICON_SIZE).all(|y| (0..10).all(|x| grid.pixel(x, y)[3] == 0)));
    }

    #[test]
    fn text_uses_requested_color() {
        let grid = render_reading("GPU", 61.0, Rgb888::new(0, 200, 0));
        let lit: Vec<[u8; 4]> = (0..ICON_SIZE)
            .flat_map(|y| (0..ICON_SIZE).map(move |x| (x, y)))
            .map(|(x, y)| grid.pixel(x, y))
            .filter(|p| p[3] != 0)
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|p| *p == [0, 200, 0, 255]));
    }
}
