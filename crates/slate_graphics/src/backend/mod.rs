//! Backend abstraction
//!
//! Every resource type exists once; the rendering target behind it is chosen
//! a single time, at device construction, by a runtime flag. The two targets
//! are a native OS surface (an opaque capability this crate drives but does
//! not re-implement) and a remote sink receiving serialized draw operations.
//!
//! All backend calls operate in physical pixel coordinates. The graphics
//! context scales before dispatch, so drawing output is independent of the
//! backend choice.

pub mod bridge;
pub mod native;
pub mod recording;

use std::rc::Rc;

use slate_bridge::{BrushSpec, DrawOpSink, FontSpec, PenSpec, TextFlags};
use slate_core::geometry::{PathData, Rectangle, Rgba};
use slate_core::Result;

pub use native::NativeSurface;
pub use recording::RecordingSurface;

/// Opaque backend handle. Zero is the invalid/disposed sentinel.
pub type BackendHandle = u64;

/// Rendering target selection, made once when the device is created.
#[derive(Clone)]
pub enum BackendKind {
    /// Drive a native OS drawing surface directly.
    Native(Rc<dyn NativeSurface>),
    /// Serialize draw operations to an external renderer.
    Bridge(Rc<dyn DrawOpSink>),
}

/// Clip shape handed to a GC backend.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipSpec {
    Rect(Rectangle),
    Rects(Vec<Rectangle>),
    Path(PathData),
    Reset,
}

/// Per-GC backend object.
///
/// The state-application hooks are only invoked from the GC's flush routine,
/// and only for aspects whose dirty bit is set; primitives assume the state
/// they depend on has been applied.
pub trait GcBackend {
    fn apply_pen(&mut self, pen: &PenSpec) -> Result<()>;
    fn apply_null_pen(&mut self);
    fn apply_brush(&mut self, brush: &BrushSpec) -> Result<()>;
    fn apply_null_brush(&mut self);
    /// `handle` is the interned device font handle for `font`; the bridge
    /// backend serializes the `FontSpec` record instead.
    fn apply_font(&mut self, font: &FontSpec, handle: BackendHandle) -> Result<()>;
    fn apply_text_colors(&mut self, foreground: Rgba, background: Option<Rgba>);
    fn apply_draw_offset(&mut self, x: f32, y: f32);

    fn set_alpha(&mut self, alpha: u8);
    fn set_antialias(&mut self, on: bool);
    fn set_text_antialias(&mut self, on: bool);
    fn set_interpolation(&mut self, level: i8);
    fn set_fill_rule(&mut self, even_odd: bool);
    fn set_xor(&mut self, xor: bool);
    fn set_clip(&mut self, clip: ClipSpec);
    fn set_transform(&mut self, elements: Option<[f32; 6]>);

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32);
    fn draw_point(&mut self, x: i32, y: i32);
    fn draw_rect(&mut self, rect: Rectangle);
    fn fill_rect(&mut self, rect: Rectangle);
    fn draw_round_rect(&mut self, rect: Rectangle, arc_width: i32, arc_height: i32);
    fn fill_round_rect(&mut self, rect: Rectangle, arc_width: i32, arc_height: i32);
    fn draw_oval(&mut self, rect: Rectangle);
    fn fill_oval(&mut self, rect: Rectangle);
    fn draw_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32);
    fn fill_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32);
    fn draw_polyline(&mut self, points: &[i32]);
    fn draw_polygon(&mut self, points: &[i32]);
    fn fill_polygon(&mut self, points: &[i32]);
    fn draw_path(&mut self, handle: BackendHandle, data: &PathData);
    fn fill_path(&mut self, handle: BackendHandle, data: &PathData);
    fn draw_focus(&mut self, rect: Rectangle);
    fn fill_gradient_rect(&mut self, rect: Rectangle, vertical: bool, start: Rgba, end: Rgba);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, flags: TextFlags);
    fn draw_image(
        &mut self,
        image: BackendHandle,
        src: Rectangle,
        dest: Rectangle,
        background: Option<Rgba>,
    );
    fn copy_area(&mut self, src: Rectangle, dest_x: i32, dest_y: i32, paint: bool);
    fn copy_area_to_image(&mut self, image: BackendHandle, x: i32, y: i32);

    /// Text extent of `text` under the currently applied font, in pixels.
    fn text_extent(&mut self, text: &str, flags: TextFlags) -> (i32, i32);

    /// Whether the advanced-graphics subsystem (alpha, patterns, transforms,
    /// antialiasing, path clips) is available on this backend.
    fn supports_advanced(&self) -> bool;

    /// Release the backend binding. Called exactly once from GC disposal.
    fn dispose(&mut self);
}
