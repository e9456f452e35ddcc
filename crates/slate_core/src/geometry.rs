//! Geometry and attribute value types

use serde::{Deserialize, Serialize};

/// A point in logical or physical coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    /// Smallest rectangle covering both rectangles
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rectangle::new(left, top, right - left, bottom - top)
    }

    /// Overlapping area, or an empty rectangle when disjoint
    pub fn intersection(&self, other: &Rectangle) -> Rectangle {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right <= left || bottom <= top {
            return Rectangle::default();
        }
        Rectangle::new(left, top, right - left, bottom - top)
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        !self.intersection(other).is_empty()
    }
}

/// An RGB color value with 0-255 components
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// An RGB color value with an alpha channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: u8,
}

impl Rgba {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            rgb: Rgb::new(red, green, blue),
            alpha,
        }
    }
}

/// Line style for GC stroking
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
    /// Dash pattern supplied by the caller
    Custom,
}

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Flat,
    Round,
    Square,
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// The full set of stroke attributes a GC carries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineAttributes {
    pub width: f32,
    pub style: LineStyle,
    pub cap: LineCap,
    pub join: LineJoin,
    pub dashes: Option<Vec<f32>>,
    pub dash_offset: f32,
    pub miter_limit: f32,
}

impl LineAttributes {
    pub fn with_width(width: f32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}

impl Default for LineAttributes {
    fn default() -> Self {
        Self {
            width: 0.0,
            style: LineStyle::Solid,
            cap: LineCap::Flat,
            join: LineJoin::Miter,
            dashes: None,
            dash_offset: 0.0,
            miter_limit: 10.0,
        }
    }
}

/// Path segment opcode used by [`PathData`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PathOp {
    MoveTo = 1,
    LineTo = 2,
    QuadTo = 3,
    CubicTo = 4,
    Close = 5,
}

impl PathOp {
    /// Number of (x, y) pairs the opcode consumes from the point array
    pub fn point_count(self) -> usize {
        match self {
            PathOp::MoveTo | PathOp::LineTo => 1,
            PathOp::QuadTo => 2,
            PathOp::CubicTo => 3,
            PathOp::Close => 0,
        }
    }
}

/// Portable path representation: parallel opcode and coordinate arrays
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    pub ops: Vec<PathOp>,
    /// Alternating x/y coordinates, consumed per [`PathOp::point_count`]
    pub points: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_union() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(5, 5, 10, 10);
        assert_eq!(a.union(&b), Rectangle::new(0, 0, 15, 15));
        assert_eq!(a.union(&Rectangle::default()), a);
    }

    #[test]
    fn test_rectangle_intersection() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Rectangle::new(5, 5, 5, 5));
        assert!(a
            .intersection(&Rectangle::new(20, 20, 5, 5))
            .is_empty());
    }

    #[test]
    fn test_rectangle_contains_is_exclusive_of_far_edge() {
        let r = Rectangle::new(0, 0, 10, 10);
        assert!(r.contains(0, 0));
        assert!(r.contains(9, 9));
        assert!(!r.contains(10, 10));
    }

    #[test]
    fn test_path_op_point_counts() {
        assert_eq!(PathOp::MoveTo.point_count(), 1);
        assert_eq!(PathOp::QuadTo.point_count(), 2);
        assert_eq!(PathOp::CubicTo.point_count(), 3);
        assert_eq!(PathOp::Close.point_count(), 0);
    }
}
