//! Draw-operation records
//!
//! One variant per primitive the graphics context can emit, carrying its
//! already-scaled pixel-space parameters. These records double as the shared
//! vocabulary of the backend boundary: the native backend consumes the same
//! spec structs the bridge serializes.

use serde::{Deserialize, Serialize};

use slate_core::geometry::{LineCap, LineJoin, LineStyle, PathData, Rectangle, Rgba};

/// Everything the backend needs to build a pen for outline drawing.
///
/// Dash values are already divided by the effective line width, and the
/// width itself is in physical pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PenSpec {
    pub color: Rgba,
    pub width: f32,
    pub style: LineStyle,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dashes: Option<Vec<f32>>,
    pub dash_offset: f32,
    /// Pattern stroke; `None` strokes with `color`.
    pub pattern: Option<BrushSpec>,
}

/// Everything the backend needs to build a fill brush.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BrushSpec {
    Solid(Rgba),
    LinearGradient {
        from: (i32, i32),
        to: (i32, i32),
        start: Rgba,
        end: Rgba,
    },
    Image {
        handle: u64,
    },
}

/// A font identity at a concrete rasterization zoom.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    /// Height in points; the backend bakes in the pixel height for `zoom`.
    pub height: f32,
    pub bold: bool,
    pub italic: bool,
    pub zoom: u32,
}

/// Flags for text drawing (mirrors the draw-text entry points).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFlags {
    /// Leave the background untouched instead of filling it
    pub transparent: bool,
    /// Expand '\t' sequences
    pub expand_tabs: bool,
    /// Treat '&' as a mnemonic marker
    pub mnemonics: bool,
    /// Honor '\n' as line separators
    pub newlines: bool,
}

/// A serialized drawing operation in physical pixel coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DrawOp {
    // State application (the flush side of the GC dirty mask)
    SelectPen(PenSpec),
    SelectNullPen,
    SelectBrush(BrushSpec),
    SelectNullBrush,
    SelectFont(FontSpec),
    TextColors {
        foreground: Rgba,
        background: Option<Rgba>,
    },
    DrawOffset {
        x: f32,
        y: f32,
    },
    Alpha(u8),
    Antialias(bool),
    TextAntialias(bool),
    Interpolation(i8),
    FillRule(bool),
    XorMode(bool),
    ClipRect(Rectangle),
    ClipPath(PathData),
    ClipRects(Vec<Rectangle>),
    ClipReset,
    Transform(Option<[f32; 6]>),

    // Primitives
    DrawLine {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
    DrawPoint {
        x: i32,
        y: i32,
    },
    DrawRect(Rectangle),
    FillRect(Rectangle),
    DrawRoundRect {
        rect: Rectangle,
        arc_width: i32,
        arc_height: i32,
    },
    FillRoundRect {
        rect: Rectangle,
        arc_width: i32,
        arc_height: i32,
    },
    DrawOval(Rectangle),
    FillOval(Rectangle),
    DrawArc {
        rect: Rectangle,
        start_angle: i32,
        arc_angle: i32,
    },
    FillArc {
        rect: Rectangle,
        start_angle: i32,
        arc_angle: i32,
    },
    DrawPolyline {
        points: Vec<i32>,
    },
    DrawPolygon {
        points: Vec<i32>,
    },
    FillPolygon {
        points: Vec<i32>,
    },
    DrawPath(PathData),
    FillPath(PathData),
    DrawFocus(Rectangle),
    FillGradientRect {
        rect: Rectangle,
        vertical: bool,
        start: Rgba,
        end: Rgba,
    },
    DrawText {
        text: String,
        x: i32,
        y: i32,
        flags: TextFlags,
    },
    DrawImage {
        image: u64,
        src: Rectangle,
        dest: Rectangle,
        /// Substituted for the transparent pixel, when the image has one.
        background: Option<Rgba>,
    },
    CopyArea {
        src: Rectangle,
        dest_x: i32,
        dest_y: i32,
        paint: bool,
    },
    CopyAreaToImage {
        image: u64,
        x: i32,
        y: i32,
    },

    // Device-scoped resource traffic
    RegisterImage {
        image: u64,
        width: i32,
        height: i32,
        zoom: u32,
    },
    DestroyImage {
        image: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_op_json_round_trip() {
        let op = DrawOp::DrawLine {
            x1: 0,
            y1: 1,
            x2: 20,
            y2: 21,
        };
        let json = serde_json::to_string(&op).unwrap();
        let back: DrawOp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_pen_spec_serializes_dashes() {
        let op = DrawOp::SelectPen(PenSpec {
            color: Rgba::new(1, 2, 3, 255),
            width: 3.0,
            style: LineStyle::Custom,
            cap: LineCap::Round,
            join: LineJoin::Bevel,
            miter_limit: 10.0,
            dashes: Some(vec![2.0, 1.0]),
            dash_offset: 0.5,
            pattern: None,
        });
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("SelectPen"));
        let back: DrawOp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
