//! Native-surface backend
//!
//! [`NativeSurface`] is the boundary to the platform drawing API: handle
//! allocation, pen/brush/font selection, and pixel-space primitives. Its
//! internals are the platform's business; this module only drives it.
//! [`NativeGc`] adapts the GC backend interface onto a surface, owning the
//! pen/brush/font objects it has selected so far.

use std::rc::Rc;

use slate_bridge::{BrushSpec, FontSpec, PenSpec, TextFlags};
use slate_core::geometry::{PathData, Rectangle, Rgba};
use slate_core::Result;

use super::{BackendHandle, ClipSpec, GcBackend};
use crate::image::ImageData;

/// What a GC draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GcTarget {
    /// A materialized image handle at a concrete zoom.
    Image(BackendHandle),
    /// A widget surface rendered at the given zoom.
    Surface { zoom: u32 },
}

/// The platform drawing capability.
///
/// All coordinates are physical pixels. Allocation methods fail with
/// [`GraphicsError::NoHandles`] on resource exhaustion; drawing methods are
/// assumed fast, local, and infallible.
pub trait NativeSurface {
    fn create_pen(&self, pen: &PenSpec) -> Result<BackendHandle>;
    fn destroy_pen(&self, handle: BackendHandle);
    fn create_brush(&self, brush: &BrushSpec) -> Result<BackendHandle>;
    fn destroy_brush(&self, handle: BackendHandle);
    fn create_font(&self, font: &FontSpec) -> Result<BackendHandle>;
    fn destroy_font(&self, handle: BackendHandle);

    fn create_image(&self, data: &ImageData, zoom: u32) -> Result<BackendHandle>;
    fn create_blank_image(&self, width_px: i32, height_px: i32, zoom: u32)
        -> Result<BackendHandle>;
    /// Decode the current pixel contents of an image handle.
    fn read_image(&self, handle: BackendHandle) -> Option<ImageData>;
    fn destroy_image(&self, handle: BackendHandle);

    fn create_path(&self, data: &PathData) -> Result<BackendHandle>;
    fn destroy_path(&self, handle: BackendHandle);
    fn create_region(&self) -> Result<BackendHandle>;
    fn region_set(&self, handle: BackendHandle, rects: &[Rectangle]);
    fn destroy_region(&self, handle: BackendHandle);
    fn create_transform(&self, elements: [f32; 6]) -> Result<BackendHandle>;
    fn transform_set(&self, handle: BackendHandle, elements: [f32; 6]);
    fn destroy_transform(&self, handle: BackendHandle);

    fn new_gc(&self, target: GcTarget) -> Result<BackendHandle>;
    fn destroy_gc(&self, gc: BackendHandle);

    fn select_pen(&self, gc: BackendHandle, pen: Option<BackendHandle>);
    fn select_brush(&self, gc: BackendHandle, brush: Option<BackendHandle>);
    fn select_font(&self, gc: BackendHandle, font: BackendHandle);
    fn set_text_colors(&self, gc: BackendHandle, foreground: Rgba, background: Option<Rgba>);
    fn set_draw_offset(&self, gc: BackendHandle, x: f32, y: f32);
    fn set_alpha(&self, gc: BackendHandle, alpha: u8);
    fn set_antialias(&self, gc: BackendHandle, on: bool);
    fn set_text_antialias(&self, gc: BackendHandle, on: bool);
    fn set_interpolation(&self, gc: BackendHandle, level: i8);
    fn set_fill_rule(&self, gc: BackendHandle, even_odd: bool);
    fn set_xor(&self, gc: BackendHandle, xor: bool);
    fn set_clip(&self, gc: BackendHandle, clip: &ClipSpec);
    fn set_transform(&self, gc: BackendHandle, elements: Option<[f32; 6]>);

    fn draw_line(&self, gc: BackendHandle, x1: i32, y1: i32, x2: i32, y2: i32);
    fn draw_point(&self, gc: BackendHandle, x: i32, y: i32);
    fn draw_rect(&self, gc: BackendHandle, rect: Rectangle);
    fn fill_rect(&self, gc: BackendHandle, rect: Rectangle);
    fn draw_round_rect(&self, gc: BackendHandle, rect: Rectangle, arc_width: i32, arc_height: i32);
    fn fill_round_rect(&self, gc: BackendHandle, rect: Rectangle, arc_width: i32, arc_height: i32);
    fn draw_oval(&self, gc: BackendHandle, rect: Rectangle);
    fn fill_oval(&self, gc: BackendHandle, rect: Rectangle);
    fn draw_arc(&self, gc: BackendHandle, rect: Rectangle, start_angle: i32, arc_angle: i32);
    fn fill_arc(&self, gc: BackendHandle, rect: Rectangle, start_angle: i32, arc_angle: i32);
    fn draw_polyline(&self, gc: BackendHandle, points: &[i32]);
    fn draw_polygon(&self, gc: BackendHandle, points: &[i32]);
    fn fill_polygon(&self, gc: BackendHandle, points: &[i32]);
    fn draw_path(&self, gc: BackendHandle, path: BackendHandle);
    fn fill_path(&self, gc: BackendHandle, path: BackendHandle);
    fn draw_focus(&self, gc: BackendHandle, rect: Rectangle);
    fn fill_gradient_rect(
        &self,
        gc: BackendHandle,
        rect: Rectangle,
        vertical: bool,
        start: Rgba,
        end: Rgba,
    );
    fn draw_text(&self, gc: BackendHandle, text: &str, x: i32, y: i32, flags: TextFlags);
    fn draw_image(
        &self,
        gc: BackendHandle,
        image: BackendHandle,
        src: Rectangle,
        dest: Rectangle,
        background: Option<Rgba>,
    );
    fn copy_area(&self, gc: BackendHandle, src: Rectangle, dest_x: i32, dest_y: i32, paint: bool);
    fn copy_area_to_image(&self, gc: BackendHandle, image: BackendHandle, x: i32, y: i32);

    fn text_extent(&self, font: BackendHandle, text: &str, flags: TextFlags) -> (i32, i32);

    fn supports_advanced(&self) -> bool;
}

/// GC backend that drives a [`NativeSurface`].
///
/// Pens and brushes are created lazily from the flushed GC state and replace
/// the previously selected object, which is destroyed. This is the expense
/// the GC's dirty-bit batching exists to avoid paying per draw call.
pub struct NativeGc {
    surface: Rc<dyn NativeSurface>,
    gc: BackendHandle,
    pen: Option<BackendHandle>,
    pen_spec: Option<PenSpec>,
    brush: Option<BackendHandle>,
    brush_spec: Option<BrushSpec>,
    font: Option<BackendHandle>,
    disposed: bool,
}

impl NativeGc {
    pub fn new(surface: Rc<dyn NativeSurface>, target: GcTarget) -> Result<Self> {
        let gc = surface.new_gc(target)?;
        Ok(Self {
            surface,
            gc,
            pen: None,
            pen_spec: None,
            brush: None,
            brush_spec: None,
            font: None,
            disposed: false,
        })
    }

    fn replace_pen(&mut self, new: Option<BackendHandle>) {
        self.surface.select_pen(self.gc, new);
        if let Some(old) = self.pen.take() {
            self.surface.destroy_pen(old);
        }
        self.pen = new;
    }

    fn replace_brush(&mut self, new: Option<BackendHandle>) {
        self.surface.select_brush(self.gc, new);
        if let Some(old) = self.brush.take() {
            self.surface.destroy_brush(old);
        }
        self.brush = new;
    }
}

impl GcBackend for NativeGc {
    fn apply_pen(&mut self, pen: &PenSpec) -> Result<()> {
        // Re-selecting after a null pen does not rebuild an unchanged pen.
        if self.pen_spec.as_ref() == Some(pen) {
            if let Some(handle) = self.pen {
                self.surface.select_pen(self.gc, Some(handle));
                return Ok(());
            }
        }
        let handle = self.surface.create_pen(pen)?;
        self.replace_pen(Some(handle));
        self.pen_spec = Some(pen.clone());
        Ok(())
    }

    fn apply_null_pen(&mut self) {
        // Keep the pen object; only deselect it.
        self.surface.select_pen(self.gc, None);
    }

    fn apply_brush(&mut self, brush: &BrushSpec) -> Result<()> {
        if self.brush_spec.as_ref() == Some(brush) {
            if let Some(handle) = self.brush {
                self.surface.select_brush(self.gc, Some(handle));
                return Ok(());
            }
        }
        let handle = self.surface.create_brush(brush)?;
        self.replace_brush(Some(handle));
        self.brush_spec = Some(brush.clone());
        Ok(())
    }

    fn apply_null_brush(&mut self) {
        self.surface.select_brush(self.gc, None);
    }

    fn apply_font(&mut self, _font: &FontSpec, handle: BackendHandle) -> Result<()> {
        // The device font cache owns the handle; this GC only selects it.
        self.surface.select_font(self.gc, handle);
        self.font = Some(handle);
        Ok(())
    }

    fn apply_text_colors(&mut self, foreground: Rgba, background: Option<Rgba>) {
        self.surface.set_text_colors(self.gc, foreground, background);
    }

    fn apply_draw_offset(&mut self, x: f32, y: f32) {
        self.surface.set_draw_offset(self.gc, x, y);
    }

    fn set_alpha(&mut self, alpha: u8) {
        self.surface.set_alpha(self.gc, alpha);
    }

    fn set_antialias(&mut self, on: bool) {
        self.surface.set_antialias(self.gc, on);
    }

    fn set_text_antialias(&mut self, on: bool) {
        self.surface.set_text_antialias(self.gc, on);
    }

    fn set_interpolation(&mut self, level: i8) {
        self.surface.set_interpolation(self.gc, level);
    }

    fn set_fill_rule(&mut self, even_odd: bool) {
        self.surface.set_fill_rule(self.gc, even_odd);
    }

    fn set_xor(&mut self, xor: bool) {
        self.surface.set_xor(self.gc, xor);
    }

    fn set_clip(&mut self, clip: ClipSpec) {
        self.surface.set_clip(self.gc, &clip);
    }

    fn set_transform(&mut self, elements: Option<[f32; 6]>) {
        self.surface.set_transform(self.gc, elements);
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.surface.draw_line(self.gc, x1, y1, x2, y2);
    }

    fn draw_point(&mut self, x: i32, y: i32) {
        self.surface.draw_point(self.gc, x, y);
    }

    fn draw_rect(&mut self, rect: Rectangle) {
        self.surface.draw_rect(self.gc, rect);
    }

    fn fill_rect(&mut self, rect: Rectangle) {
        self.surface.fill_rect(self.gc, rect);
    }

    fn draw_round_rect(&mut self, rect: Rectangle, arc_width: i32, arc_height: i32) {
        self.surface.draw_round_rect(self.gc, rect, arc_width, arc_height);
    }

    fn fill_round_rect(&mut self, rect: Rectangle, arc_width: i32, arc_height: i32) {
        self.surface.fill_round_rect(self.gc, rect, arc_width, arc_height);
    }

    fn draw_oval(&mut self, rect: Rectangle) {
        self.surface.draw_oval(self.gc, rect);
    }

    fn fill_oval(&mut self, rect: Rectangle) {
        self.surface.fill_oval(self.gc, rect);
    }

    fn draw_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32) {
        self.surface.draw_arc(self.gc, rect, start_angle, arc_angle);
    }

    fn fill_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32) {
        self.surface.fill_arc(self.gc, rect, start_angle, arc_angle);
    }

    fn draw_polyline(&mut self, points: &[i32]) {
        self.surface.draw_polyline(self.gc, points);
    }

    fn draw_polygon(&mut self, points: &[i32]) {
        self.surface.draw_polygon(self.gc, points);
    }

    fn fill_polygon(&mut self, points: &[i32]) {
        self.surface.fill_polygon(self.gc, points);
    }

    fn draw_path(&mut self, handle: BackendHandle, _data: &PathData) {
        self.surface.draw_path(self.gc, handle);
    }

    fn fill_path(&mut self, handle: BackendHandle, _data: &PathData) {
        self.surface.fill_path(self.gc, handle);
    }

    fn draw_focus(&mut self, rect: Rectangle) {
        self.surface.draw_focus(self.gc, rect);
    }

    fn fill_gradient_rect(&mut self, rect: Rectangle, vertical: bool, start: Rgba, end: Rgba) {
        self.surface.fill_gradient_rect(self.gc, rect, vertical, start, end);
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, flags: TextFlags) {
        self.surface.draw_text(self.gc, text, x, y, flags);
    }

    fn draw_image(
        &mut self,
        image: BackendHandle,
        src: Rectangle,
        dest: Rectangle,
        background: Option<Rgba>,
    ) {
        self.surface.draw_image(self.gc, image, src, dest, background);
    }

    fn copy_area(&mut self, src: Rectangle, dest_x: i32, dest_y: i32, paint: bool) {
        self.surface.copy_area(self.gc, src, dest_x, dest_y, paint);
    }

    fn copy_area_to_image(&mut self, image: BackendHandle, x: i32, y: i32) {
        self.surface.copy_area_to_image(self.gc, image, x, y);
    }

    fn text_extent(&mut self, text: &str, flags: TextFlags) -> (i32, i32) {
        match self.font {
            Some(font) => self.surface.text_extent(font, text, flags),
            None => (0, 0),
        }
    }

    fn supports_advanced(&self) -> bool {
        self.surface.supports_advanced()
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(pen) = self.pen.take() {
            self.surface.select_pen(self.gc, None);
            self.surface.destroy_pen(pen);
        }
        if let Some(brush) = self.brush.take() {
            self.surface.select_brush(self.gc, None);
            self.surface.destroy_brush(brush);
        }
        self.surface.destroy_gc(self.gc);
        self.gc = 0;
    }
}
