//! Bridge backend
//!
//! Realizes GC operations by constructing serializable draw-operation
//! records and submitting them to the device's sink. Submission is
//! fire-and-forget; nothing flows back.

use std::rc::Rc;

use slate_bridge::{BrushSpec, DrawOp, DrawOpSink, FontSpec, PenSpec, TextFlags};
use slate_core::geometry::{PathData, Rectangle, Rgba};
use slate_core::Result;

use super::{BackendHandle, ClipSpec, GcBackend};

pub struct BridgeGc {
    sink: Rc<dyn DrawOpSink>,
    id: u64,
    font: Option<FontSpec>,
    disposed: bool,
}

impl BridgeGc {
    pub fn new(sink: Rc<dyn DrawOpSink>, id: u64) -> Self {
        Self {
            sink,
            id,
            font: None,
            disposed: false,
        }
    }

    fn submit(&self, op: DrawOp) {
        if !self.disposed {
            self.sink.submit(self.id, op);
        }
    }
}

impl GcBackend for BridgeGc {
    fn apply_pen(&mut self, pen: &PenSpec) -> Result<()> {
        self.submit(DrawOp::SelectPen(pen.clone()));
        Ok(())
    }

    fn apply_null_pen(&mut self) {
        self.submit(DrawOp::SelectNullPen);
    }

    fn apply_brush(&mut self, brush: &BrushSpec) -> Result<()> {
        self.submit(DrawOp::SelectBrush(brush.clone()));
        Ok(())
    }

    fn apply_null_brush(&mut self) {
        self.submit(DrawOp::SelectNullBrush);
    }

    fn apply_font(&mut self, font: &FontSpec, _handle: BackendHandle) -> Result<()> {
        self.font = Some(font.clone());
        self.submit(DrawOp::SelectFont(font.clone()));
        Ok(())
    }

    fn apply_text_colors(&mut self, foreground: Rgba, background: Option<Rgba>) {
        self.submit(DrawOp::TextColors {
            foreground,
            background,
        });
    }

    fn apply_draw_offset(&mut self, x: f32, y: f32) {
        self.submit(DrawOp::DrawOffset { x, y });
    }

    fn set_alpha(&mut self, alpha: u8) {
        self.submit(DrawOp::Alpha(alpha));
    }

    fn set_antialias(&mut self, on: bool) {
        self.submit(DrawOp::Antialias(on));
    }

    fn set_text_antialias(&mut self, on: bool) {
        self.submit(DrawOp::TextAntialias(on));
    }

    fn set_interpolation(&mut self, level: i8) {
        self.submit(DrawOp::Interpolation(level));
    }

    fn set_fill_rule(&mut self, even_odd: bool) {
        self.submit(DrawOp::FillRule(even_odd));
    }

    fn set_xor(&mut self, xor: bool) {
        self.submit(DrawOp::XorMode(xor));
    }

    fn set_clip(&mut self, clip: ClipSpec) {
        let op = match clip {
            ClipSpec::Rect(rect) => DrawOp::ClipRect(rect),
            ClipSpec::Rects(rects) => DrawOp::ClipRects(rects),
            ClipSpec::Path(data) => DrawOp::ClipPath(data),
            ClipSpec::Reset => DrawOp::ClipReset,
        };
        self.submit(op);
    }

    fn set_transform(&mut self, elements: Option<[f32; 6]>) {
        self.submit(DrawOp::Transform(elements));
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.submit(DrawOp::DrawLine { x1, y1, x2, y2 });
    }

    fn draw_point(&mut self, x: i32, y: i32) {
        self.submit(DrawOp::DrawPoint { x, y });
    }

    fn draw_rect(&mut self, rect: Rectangle) {
        self.submit(DrawOp::DrawRect(rect));
    }

    fn fill_rect(&mut self, rect: Rectangle) {
        self.submit(DrawOp::FillRect(rect));
    }

    fn draw_round_rect(&mut self, rect: Rectangle, arc_width: i32, arc_height: i32) {
        self.submit(DrawOp::DrawRoundRect {
            rect,
            arc_width,
            arc_height,
        });
    }

    fn fill_round_rect(&mut self, rect: Rectangle, arc_width: i32, arc_height: i32) {
        self.submit(DrawOp::FillRoundRect {
            rect,
            arc_width,
            arc_height,
        });
    }

    fn draw_oval(&mut self, rect: Rectangle) {
        self.submit(DrawOp::DrawOval(rect));
    }

    fn fill_oval(&mut self, rect: Rectangle) {
        self.submit(DrawOp::FillOval(rect));
    }

    fn draw_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32) {
        self.submit(DrawOp::DrawArc {
            rect,
            start_angle,
            arc_angle,
        });
    }

    fn fill_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32) {
        self.submit(DrawOp::FillArc {
            rect,
            start_angle,
            arc_angle,
        });
    }

    fn draw_polyline(&mut self, points: &[i32]) {
        self.submit(DrawOp::DrawPolyline {
            points: points.to_vec(),
        });
    }

    fn draw_polygon(&mut self, points: &[i32]) {
        self.submit(DrawOp::DrawPolygon {
            points: points.to_vec(),
        });
    }

    fn fill_polygon(&mut self, points: &[i32]) {
        self.submit(DrawOp::FillPolygon {
            points: points.to_vec(),
        });
    }

    fn draw_path(&mut self, _handle: BackendHandle, data: &PathData) {
        self.submit(DrawOp::DrawPath(data.clone()));
    }

    fn fill_path(&mut self, _handle: BackendHandle, data: &PathData) {
        self.submit(DrawOp::FillPath(data.clone()));
    }

    fn draw_focus(&mut self, rect: Rectangle) {
        self.submit(DrawOp::DrawFocus(rect));
    }

    fn fill_gradient_rect(&mut self, rect: Rectangle, vertical: bool, start: Rgba, end: Rgba) {
        self.submit(DrawOp::FillGradientRect {
            rect,
            vertical,
            start,
            end,
        });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, flags: TextFlags) {
        self.submit(DrawOp::DrawText {
            text: text.to_owned(),
            x,
            y,
            flags,
        });
    }

    fn draw_image(
        &mut self,
        image: BackendHandle,
        src: Rectangle,
        dest: Rectangle,
        background: Option<Rgba>,
    ) {
        self.submit(DrawOp::DrawImage {
            image,
            src,
            dest,
            background,
        });
    }

    fn copy_area(&mut self, src: Rectangle, dest_x: i32, dest_y: i32, paint: bool) {
        self.submit(DrawOp::CopyArea {
            src,
            dest_x,
            dest_y,
            paint,
        });
    }

    fn copy_area_to_image(&mut self, image: BackendHandle, x: i32, y: i32) {
        self.submit(DrawOp::CopyAreaToImage { image, x, y });
    }

    fn text_extent(&mut self, text: &str, _flags: TextFlags) -> (i32, i32) {
        // The sink is one-way, so metrics are estimated locally the same way
        // the recording surface does it.
        let height_px = self
            .font
            .as_ref()
            .map(|f| (f.height * f.zoom as f32 / 100.0).round() as i32)
            .unwrap_or(0);
        (text.chars().count() as i32 * (height_px / 2).max(1), height_px)
    }

    fn supports_advanced(&self) -> bool {
        true
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
