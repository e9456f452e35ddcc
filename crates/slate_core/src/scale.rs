//! Logical/physical coordinate scaling
//!
//! Zoom is a display scale factor in percent of the 100%-DPI baseline.
//! Physical pixels = logical units * zoom / 100, rounded half-up. Every
//! public drawing entry point converts to physical pixels before any cached
//! geometry or backend call is touched; `*_in_pixels` internals never
//! re-scale.

use crate::geometry::{Point, Rectangle};

/// Round half-up, matching the rounding the rest of the toolkit has always
/// used (0.5 rounds toward positive infinity, including for negatives).
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Logical -> physical pixels at the given zoom percentage.
pub fn scale_up(value: i32, zoom: u32) -> i32 {
    debug_assert!(zoom > 0, "zoom must be positive");
    if zoom == 100 {
        return value;
    }
    round_half_up(value as f64 * zoom as f64 / 100.0)
}

/// Physical pixels -> logical at the given zoom percentage.
pub fn scale_down(value: i32, zoom: u32) -> i32 {
    debug_assert!(zoom > 0, "zoom must be positive");
    if zoom == 100 {
        return value;
    }
    round_half_up(value as f64 * 100.0 / zoom as f64)
}

/// Rescale a physical value from one zoom to another.
pub fn rescale(value: i32, from_zoom: u32, to_zoom: u32) -> i32 {
    if from_zoom == to_zoom {
        return value;
    }
    round_half_up(value as f64 * to_zoom as f64 / from_zoom as f64)
}

pub fn scale_up_f32(value: f32, zoom: u32) -> f32 {
    debug_assert!(zoom > 0, "zoom must be positive");
    value * zoom as f32 / 100.0
}

pub fn scale_down_f32(value: f32, zoom: u32) -> f32 {
    debug_assert!(zoom > 0, "zoom must be positive");
    value * 100.0 / zoom as f32
}

pub fn scale_up_point(p: Point, zoom: u32) -> Point {
    Point::new(scale_up(p.x, zoom), scale_up(p.y, zoom))
}

pub fn scale_down_point(p: Point, zoom: u32) -> Point {
    Point::new(scale_down(p.x, zoom), scale_down(p.y, zoom))
}

/// Rectangles scale position and extent independently so that adjacent
/// rectangles stay adjacent after scaling.
pub fn scale_up_rect(r: Rectangle, zoom: u32) -> Rectangle {
    Rectangle::new(
        scale_up(r.x, zoom),
        scale_up(r.y, zoom),
        scale_up(r.width, zoom),
        scale_up(r.height, zoom),
    )
}

pub fn scale_down_rect(r: Rectangle, zoom: u32) -> Rectangle {
    Rectangle::new(
        scale_down(r.x, zoom),
        scale_down(r.y, zoom),
        scale_down(r.width, zoom),
        scale_down(r.height, zoom),
    )
}

/// Element-wise scaling for alternating x/y coordinate arrays (polygons,
/// polylines).
pub fn scale_up_points(values: &[i32], zoom: u32) -> Vec<i32> {
    values.iter().map(|&v| scale_up(v, zoom)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_at_100() {
        for v in [-7, 0, 1, 3, 1000] {
            assert_eq!(scale_up(v, 100), v);
            assert_eq!(scale_down(v, 100), v);
        }
    }

    #[test]
    fn test_scale_up_rounds_half_up() {
        assert_eq!(scale_up(1, 150), 2); // 1.5 -> 2
        assert_eq!(scale_up(3, 150), 5); // 4.5 -> 5
        assert_eq!(scale_up(1, 125), 1); // 1.25 -> 1
        assert_eq!(scale_up(2, 175), 4); // 3.5 -> 4
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        for zoom in [100u32, 150, 200] {
            for v in 0..=500 {
                let round_tripped = scale_down(scale_up(v, zoom), zoom);
                assert!(
                    (round_tripped - v).abs() <= 1,
                    "v={v} zoom={zoom} -> {round_tripped}"
                );
                if zoom == 100 {
                    assert_eq!(round_tripped, v);
                }
            }
        }
    }

    #[test]
    fn test_rescale_between_zooms() {
        assert_eq!(rescale(200, 100, 150), 300);
        assert_eq!(rescale(300, 150, 100), 200);
        assert_eq!(rescale(42, 125, 125), 42);
    }

    #[test]
    fn test_rect_scales_extent_independently() {
        let r = Rectangle::new(1, 1, 3, 3);
        assert_eq!(scale_up_rect(r, 200), Rectangle::new(2, 2, 6, 6));
        assert_eq!(scale_up_rect(r, 150), Rectangle::new(2, 2, 5, 5));
    }

    #[test]
    fn test_point_array_scaling() {
        assert_eq!(scale_up_points(&[0, 1, 2, 3], 200), vec![0, 2, 4, 6]);
    }
}
