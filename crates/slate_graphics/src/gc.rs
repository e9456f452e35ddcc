//! Graphics context
//!
//! The GC is a state machine over a backend drawing target. Attribute setters
//! are cheap: they record the new value and clear the "applied" bit for the
//! aspects the change invalidates. Nothing reaches the backend until a
//! primitive runs, at which point `check_gc` applies exactly the aspects that
//! primitive depends on and that are not already applied.
//!
//! Public entry points take logical coordinates and scale to physical pixels
//! before dispatch; the backend never sees logical units.

use std::rc::Rc;

use bitflags::bitflags;

use slate_bridge::{BrushSpec, PenSpec, TextFlags};
use slate_core::geometry::{LineAttributes, LineStyle, Point, Rectangle};
use slate_core::scale::{
    scale_down, scale_up, scale_up_f32, scale_up_points, scale_up_rect,
};
use slate_core::{GraphicsError, Result};

use crate::backend::{BackendHandle, ClipSpec, GcBackend};
use crate::backend::native::GcTarget;
use crate::color::Color;
use crate::device::Device;
use crate::font::Font;
use crate::image::{Image, ImageInner};
use crate::path::Path;
use crate::pattern::Pattern;
use crate::region::Region;
use crate::resource::ResourceState;
use crate::transform::Transform;

bitflags! {
    /// Aspects of GC state, tracked as "applied to the backend" bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct GcState: u32 {
        const FOREGROUND      = 1 << 0;
        const BACKGROUND      = 1 << 1;
        const FONT            = 1 << 2;
        const LINE_STYLE      = 1 << 3;
        const LINE_CAP        = 1 << 4;
        const LINE_JOIN       = 1 << 5;
        const LINE_WIDTH      = 1 << 6;
        const LINE_MITERLIMIT = 1 << 7;
        const FOREGROUND_TEXT = 1 << 8;
        const BACKGROUND_TEXT = 1 << 9;
        const BRUSH           = 1 << 10;
        const PEN             = 1 << 11;
        const NULL_BRUSH      = 1 << 12;
        const NULL_PEN        = 1 << 13;
        const DRAW_OFFSET     = 1 << 14;

        /// Everything an outline primitive depends on.
        const DRAW = Self::FOREGROUND.bits()
            | Self::LINE_STYLE.bits()
            | Self::LINE_WIDTH.bits()
            | Self::LINE_CAP.bits()
            | Self::LINE_JOIN.bits()
            | Self::LINE_MITERLIMIT.bits()
            | Self::PEN.bits()
            | Self::NULL_BRUSH.bits()
            | Self::DRAW_OFFSET.bits();
        /// Everything a fill primitive depends on.
        const FILL = Self::BACKGROUND.bits()
            | Self::BRUSH.bits()
            | Self::NULL_PEN.bits();
        /// Everything a text primitive depends on.
        const TEXT = Self::FONT.bits()
            | Self::FOREGROUND_TEXT.bits()
            | Self::BACKGROUND_TEXT.bits();

        const PEN_ASPECTS = Self::FOREGROUND.bits()
            | Self::LINE_STYLE.bits()
            | Self::LINE_WIDTH.bits()
            | Self::LINE_CAP.bits()
            | Self::LINE_JOIN.bits()
            | Self::LINE_MITERLIMIT.bits();
        const BRUSH_ASPECTS = Self::BACKGROUND.bits() | Self::BRUSH.bits();
    }
}

/// A graphics context bound to a drawing target for its whole lifetime.
pub struct Gc {
    state: ResourceState,
    backend: Box<dyn GcBackend>,
    zoom: u32,
    mirrored: bool,
    applied: GcState,
    foreground: Color,
    background: Color,
    alpha: u8,
    line: LineAttributes,
    font: Font,
    advanced: bool,
    foreground_pattern: Option<Pattern>,
    background_pattern: Option<Pattern>,
    transform: Option<[f32; 6]>,
    clip: Option<Rectangle>,
    /// Keeps the target image's one-GC-at-a-time guard held.
    image_guard: Option<Rc<ImageInner>>,
}

impl Gc {
    fn build(
        device: &Device,
        target: GcTarget,
        zoom: u32,
        image_guard: Option<Rc<ImageInner>>,
    ) -> Result<Self> {
        let (backend, _id) = device.new_gc_backend(target)?;
        let font = Font::new(device, device.system_font());
        Ok(Self {
            state: ResourceState::new(device, "gc"),
            backend,
            zoom,
            mirrored: false,
            applied: GcState::empty(),
            foreground: Color::from_rgb(slate_core::geometry::Rgb::new(0, 0, 0)),
            background: Color::from_rgb(slate_core::geometry::Rgb::new(255, 255, 255)),
            alpha: 255,
            line: LineAttributes::default(),
            font,
            advanced: false,
            foreground_pattern: None,
            background_pattern: None,
            transform: None,
            clip: None,
            image_guard,
        })
    }

    /// Context on the device's drawing surface, at the current zoom.
    pub fn for_surface(device: &Device) -> Result<Self> {
        let zoom = device.zoom();
        Self::build(device, GcTarget::Surface { zoom }, zoom, None)
    }

    /// Context targeting an image. At most one may exist per image.
    pub fn on_image(image: &Image) -> Result<Self> {
        let device = image.device();
        let zoom = device.zoom();
        image.begin_gc(zoom)?;
        let handle = match image.handle(zoom) {
            Ok(handle) => handle,
            Err(err) => {
                image.gc_guard().end_gc();
                return Err(err);
            }
        };
        Self::build(&device, GcTarget::Image(handle), zoom, Some(image.gc_guard()))
    }

    /// Context on a raw image handle, used when materializing draw-callback
    /// images (the image's GC guard is not taken).
    pub(crate) fn for_image_handle(
        device: &Device,
        handle: BackendHandle,
        zoom: u32,
    ) -> Result<Self> {
        Self::build(device, GcTarget::Image(handle), zoom, None)
    }

    pub fn device(&self) -> Device {
        self.state.device().clone()
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    pub fn dispose(&mut self) {
        if !self.state.mark_disposed() {
            return;
        }
        self.backend.dispose();
        if let Some(guard) = self.image_guard.take() {
            guard.end_gc();
        }
    }

    // ---- state application ---------------------------------------------

    /// Applies every aspect in `mask` that is not already applied. Each
    /// aspect is marked applied only once its backend hook succeeds, so a
    /// failed application is retried by the next primitive.
    fn check_gc(&mut self, mask: GcState) -> Result<()> {
        let applied = self.applied;
        if applied.contains(mask) {
            return Ok(());
        }
        let mut dirty = mask - applied;
        // Any pen aspect invalidates the selected pen as a whole.
        if dirty.intersects(GcState::PEN_ASPECTS) {
            dirty |= GcState::PEN;
        }
        if dirty.contains(GcState::PEN) {
            let spec = self.pen_spec();
            self.backend.apply_pen(&spec)?;
            self.applied |= GcState::PEN | GcState::PEN_ASPECTS;
            self.applied -= GcState::NULL_PEN;
        } else if dirty.contains(GcState::NULL_PEN) {
            self.backend.apply_null_pen();
            self.applied |= GcState::NULL_PEN;
            self.applied -= GcState::PEN;
        }
        if dirty.intersects(GcState::BRUSH_ASPECTS) {
            let spec = self.brush_spec()?;
            self.backend.apply_brush(&spec)?;
            self.applied |= GcState::BRUSH_ASPECTS;
            self.applied -= GcState::NULL_BRUSH;
        } else if dirty.contains(GcState::NULL_BRUSH) {
            self.backend.apply_null_brush();
            self.applied |= GcState::NULL_BRUSH;
            self.applied -= GcState::BRUSH;
        }
        if dirty.contains(GcState::FONT) {
            let spec = self.font.spec_for_zoom(self.zoom);
            let handle = self.font.handle_for_zoom(self.zoom)?;
            self.backend.apply_font(&spec, handle)?;
            self.applied |= GcState::FONT;
        }
        if dirty.intersects(GcState::FOREGROUND_TEXT | GcState::BACKGROUND_TEXT) {
            self.backend
                .apply_text_colors(self.foreground.rgba(), Some(self.background.rgba()));
            self.applied |= GcState::FOREGROUND_TEXT | GcState::BACKGROUND_TEXT;
        }
        if dirty.contains(GcState::DRAW_OFFSET) {
            let offset = if self.effective_line_width_px() % 2 == 1 {
                0.5
            } else {
                0.0
            };
            let x = if self.mirrored { -offset } else { offset };
            self.backend.apply_draw_offset(x, offset);
            self.applied |= GcState::DRAW_OFFSET;
        }
        Ok(())
    }

    /// Stroke width in physical pixels, never below one.
    fn effective_line_width_px(&self) -> i32 {
        let px = scale_up_f32(self.line.width, self.zoom);
        (px.round() as i32).max(1)
    }

    fn pen_spec(&self) -> PenSpec {
        let width_px = scale_up_f32(self.line.width, self.zoom);
        let effective = width_px.max(1.0);
        // Backend dash units are multiples of the line width.
        let dashes = match (self.line.style, &self.line.dashes) {
            (LineStyle::Custom, Some(dashes)) => Some(
                dashes
                    .iter()
                    .map(|d| scale_up_f32(*d, self.zoom) / effective)
                    .collect(),
            ),
            _ => None,
        };
        let mut color = self.foreground.rgba();
        color.alpha = self.alpha;
        PenSpec {
            color,
            width: width_px,
            style: self.line.style,
            cap: self.line.cap,
            join: self.line.join,
            miter_limit: self.line.miter_limit,
            dashes,
            dash_offset: scale_up_f32(self.line.dash_offset, self.zoom),
            pattern: self
                .foreground_pattern
                .as_ref()
                .and_then(|p| p.brush_spec(self.zoom).ok()),
        }
    }

    fn brush_spec(&self) -> Result<BrushSpec> {
        if let Some(pattern) = &self.background_pattern {
            return pattern.brush_spec(self.zoom);
        }
        let mut color = self.background.rgba();
        color.alpha = self.alpha;
        Ok(BrushSpec::Solid(color))
    }

    fn require_advanced(&self) -> Result<()> {
        if self.backend.supports_advanced() {
            Ok(())
        } else {
            Err(GraphicsError::NoGraphicsLibrary)
        }
    }

    // ---- attributes ----------------------------------------------------

    pub fn foreground(&self) -> Color {
        self.foreground
    }

    pub fn set_foreground(&mut self, color: Color) -> Result<()> {
        self.state.check_disposed()?;
        if self.foreground == color {
            return Ok(());
        }
        self.foreground = color;
        self.applied -= GcState::FOREGROUND | GcState::FOREGROUND_TEXT;
        Ok(())
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) -> Result<()> {
        self.state.check_disposed()?;
        if self.background == color {
            return Ok(());
        }
        self.background = color;
        self.applied -= GcState::BACKGROUND | GcState::BACKGROUND_TEXT;
        Ok(())
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// `None` restores the device's system font.
    pub fn set_font(&mut self, font: Option<Font>) -> Result<()> {
        self.state.check_disposed()?;
        let font = match font {
            Some(font) => font,
            None => Font::new(self.state.device(), self.state.device().system_font()),
        };
        if self.font == font {
            return Ok(());
        }
        self.font = font;
        self.applied -= GcState::FONT;
        Ok(())
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: u8) -> Result<()> {
        self.state.check_disposed()?;
        self.require_advanced()?;
        self.advanced = true;
        if self.alpha == alpha {
            return Ok(());
        }
        self.alpha = alpha;
        self.backend.set_alpha(alpha);
        // Alpha is baked into pens and brushes.
        self.applied -= GcState::FOREGROUND | GcState::BACKGROUND;
        Ok(())
    }

    pub fn line_attributes(&self) -> LineAttributes {
        self.line.clone()
    }

    pub fn set_line_attributes(&mut self, attributes: LineAttributes) -> Result<()> {
        self.state.check_disposed()?;
        if attributes.width < 0.0 {
            return Err(GraphicsError::InvalidArgument("negative line width"));
        }
        if attributes.style == LineStyle::Custom && attributes.dashes.is_none() {
            return Err(GraphicsError::InvalidArgument(
                "custom line style requires dashes",
            ));
        }
        if let Some(dashes) = &attributes.dashes {
            if dashes.iter().any(|d| *d <= 0.0) {
                return Err(GraphicsError::InvalidArgument("dash lengths must be positive"));
            }
        }
        if self.line == attributes {
            return Ok(());
        }
        if self.line.width != attributes.width {
            self.applied -= GcState::LINE_WIDTH | GcState::DRAW_OFFSET;
        }
        if self.line.style != attributes.style || self.line.dashes != attributes.dashes {
            self.applied -= GcState::LINE_STYLE;
        }
        if self.line.cap != attributes.cap {
            self.applied -= GcState::LINE_CAP;
        }
        if self.line.join != attributes.join {
            self.applied -= GcState::LINE_JOIN;
        }
        if self.line.miter_limit != attributes.miter_limit {
            self.applied -= GcState::LINE_MITERLIMIT;
        }
        self.line = attributes;
        Ok(())
    }

    pub fn line_width(&self) -> i32 {
        self.line.width as i32
    }

    pub fn set_line_width(&mut self, width: i32) -> Result<()> {
        let mut attributes = self.line.clone();
        attributes.width = width as f32;
        self.set_line_attributes(attributes)
    }

    pub fn line_style(&self) -> LineStyle {
        self.line.style
    }

    pub fn set_line_style(&mut self, style: LineStyle) -> Result<()> {
        let mut attributes = self.line.clone();
        if style != LineStyle::Custom {
            attributes.dashes = None;
        }
        attributes.style = style;
        self.set_line_attributes(attributes)
    }

    /// Sets a custom dash pattern; an empty slice restores solid lines.
    pub fn set_line_dash(&mut self, dashes: &[i32]) -> Result<()> {
        let mut attributes = self.line.clone();
        if dashes.is_empty() {
            attributes.style = LineStyle::Solid;
            attributes.dashes = None;
        } else {
            if dashes.iter().any(|d| *d <= 0) {
                return Err(GraphicsError::InvalidArgument("dash lengths must be positive"));
            }
            attributes.style = LineStyle::Custom;
            attributes.dashes = Some(dashes.iter().map(|d| *d as f32).collect());
        }
        self.set_line_attributes(attributes)
    }

    pub fn set_line_cap(&mut self, cap: slate_core::geometry::LineCap) -> Result<()> {
        let mut attributes = self.line.clone();
        attributes.cap = cap;
        self.set_line_attributes(attributes)
    }

    pub fn set_line_join(&mut self, join: slate_core::geometry::LineJoin) -> Result<()> {
        let mut attributes = self.line.clone();
        attributes.join = join;
        self.set_line_attributes(attributes)
    }

    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    /// Right-to-left orientation flips the horizontal draw offset.
    pub fn set_mirrored(&mut self, mirrored: bool) -> Result<()> {
        self.state.check_disposed()?;
        if self.mirrored != mirrored {
            self.mirrored = mirrored;
            self.applied -= GcState::DRAW_OFFSET;
        }
        Ok(())
    }

    // ---- advanced subsystem --------------------------------------------

    pub fn advanced(&self) -> bool {
        self.advanced
    }

    /// Turns the advanced subsystem on or off. Turning it off resets every
    /// advanced-only attribute to its default.
    pub fn set_advanced(&mut self, on: bool) -> Result<()> {
        self.state.check_disposed()?;
        if on {
            self.require_advanced()?;
            self.advanced = true;
            return Ok(());
        }
        if !self.advanced {
            return Ok(());
        }
        self.advanced = false;
        if self.alpha != 255 {
            self.alpha = 255;
            self.backend.set_alpha(255);
            self.applied -= GcState::FOREGROUND | GcState::BACKGROUND;
        }
        self.backend.set_antialias(false);
        self.backend.set_text_antialias(false);
        self.backend.set_interpolation(0);
        if self.transform.take().is_some() {
            self.backend.set_transform(None);
            self.applied -= GcState::DRAW_OFFSET;
        }
        if self.foreground_pattern.take().is_some() {
            self.applied -= GcState::FOREGROUND;
        }
        if self.background_pattern.take().is_some() {
            self.applied -= GcState::BACKGROUND;
        }
        Ok(())
    }

    pub fn set_antialias(&mut self, on: bool) -> Result<()> {
        self.state.check_disposed()?;
        self.require_advanced()?;
        self.advanced = true;
        self.backend.set_antialias(on);
        Ok(())
    }

    pub fn set_text_antialias(&mut self, on: bool) -> Result<()> {
        self.state.check_disposed()?;
        self.require_advanced()?;
        self.advanced = true;
        self.backend.set_text_antialias(on);
        Ok(())
    }

    /// Interpolation quality: -1 none, 0 default, 1 low, 2 high.
    pub fn set_interpolation(&mut self, level: i8) -> Result<()> {
        self.state.check_disposed()?;
        self.require_advanced()?;
        if !(-1..=2).contains(&level) {
            return Err(GraphicsError::InvalidArgument("invalid interpolation level"));
        }
        self.advanced = true;
        self.backend.set_interpolation(level);
        Ok(())
    }

    /// `true` selects the even-odd fill rule, `false` winding.
    pub fn set_fill_rule(&mut self, even_odd: bool) -> Result<()> {
        self.state.check_disposed()?;
        self.backend.set_fill_rule(even_odd);
        Ok(())
    }

    pub fn set_xor_mode(&mut self, xor: bool) -> Result<()> {
        self.state.check_disposed()?;
        self.backend.set_xor(xor);
        Ok(())
    }

    pub fn set_foreground_pattern(&mut self, pattern: Option<Pattern>) -> Result<()> {
        self.state.check_disposed()?;
        if let Some(pattern) = &pattern {
            if pattern.is_disposed() {
                return Err(GraphicsError::InvalidArgument("pattern is disposed"));
            }
            self.require_advanced()?;
            self.advanced = true;
        }
        self.foreground_pattern = pattern;
        self.applied -= GcState::FOREGROUND;
        Ok(())
    }

    pub fn set_background_pattern(&mut self, pattern: Option<Pattern>) -> Result<()> {
        self.state.check_disposed()?;
        if let Some(pattern) = &pattern {
            if pattern.is_disposed() {
                return Err(GraphicsError::InvalidArgument("pattern is disposed"));
            }
            self.require_advanced()?;
            self.advanced = true;
        }
        self.background_pattern = pattern;
        self.applied -= GcState::BACKGROUND;
        Ok(())
    }

    pub fn set_transform(&mut self, transform: Option<&Transform>) -> Result<()> {
        self.state.check_disposed()?;
        match transform {
            Some(transform) => {
                self.require_advanced()?;
                transform.check_disposed()?;
                self.advanced = true;
                let mut elements = transform.elements();
                // Translation is the only length-valued pair.
                elements[4] = scale_up_f32(elements[4], self.zoom);
                elements[5] = scale_up_f32(elements[5], self.zoom);
                self.transform = Some(transform.elements());
                self.backend.set_transform(Some(elements));
            }
            None => {
                if self.transform.take().is_none() {
                    return Ok(());
                }
                self.backend.set_transform(None);
            }
        }
        self.applied -= GcState::DRAW_OFFSET;
        Ok(())
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
            .map(|elements| Transform::from_elements(self.state.device(), elements))
    }

    // ---- clipping ------------------------------------------------------

    /// Bounding rectangle of the current clip, or `None` when unclipped.
    pub fn clipping(&self) -> Option<Rectangle> {
        self.clip
    }

    pub fn set_clip_rect(&mut self, rect: Option<Rectangle>) -> Result<()> {
        self.state.check_disposed()?;
        match rect {
            Some(rect) => {
                let rect = normalize(rect);
                self.clip = Some(rect);
                self.backend
                    .set_clip(ClipSpec::Rect(scale_up_rect(rect, self.zoom)));
            }
            None => {
                self.clip = None;
                self.backend.set_clip(ClipSpec::Reset);
            }
        }
        Ok(())
    }

    pub fn set_clip_region(&mut self, region: Option<&Region>) -> Result<()> {
        self.state.check_disposed()?;
        match region {
            Some(region) => {
                region.check_disposed()?;
                let rects: Vec<Rectangle> = region
                    .rects()
                    .iter()
                    .map(|r| scale_up_rect(*r, self.zoom))
                    .collect();
                self.clip = Some(region.bounds());
                self.backend.set_clip(ClipSpec::Rects(rects));
            }
            None => {
                self.clip = None;
                self.backend.set_clip(ClipSpec::Reset);
            }
        }
        Ok(())
    }

    pub fn set_clip_path(&mut self, path: Option<&Path>) -> Result<()> {
        self.state.check_disposed()?;
        match path {
            Some(path) => {
                self.require_advanced()?;
                path.check_disposed()?;
                self.advanced = true;
                self.clip = Some(path.bounds());
                self.backend
                    .set_clip(ClipSpec::Path(path.data_for_zoom(self.zoom)));
            }
            None => {
                self.clip = None;
                self.backend.set_clip(ClipSpec::Reset);
            }
        }
        Ok(())
    }

    // ---- outline primitives --------------------------------------------

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::DRAW)?;
        let z = self.zoom;
        self.backend.draw_line(
            scale_up(x1, z),
            scale_up(y1, z),
            scale_up(x2, z),
            scale_up(y2, z),
        );
        Ok(())
    }

    pub fn draw_point(&mut self, x: i32, y: i32) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::DRAW)?;
        let z = self.zoom;
        self.backend.draw_point(scale_up(x, z), scale_up(y, z));
        Ok(())
    }

    pub fn draw_rectangle(&mut self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::DRAW)?;
        let rect = scale_up_rect(normalize(rect), self.zoom);
        self.backend.draw_rect(rect);
        Ok(())
    }

    pub fn draw_round_rectangle(
        &mut self,
        rect: Rectangle,
        arc_width: i32,
        arc_height: i32,
    ) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::DRAW)?;
        let z = self.zoom;
        self.backend.draw_round_rect(
            scale_up_rect(normalize(rect), z),
            scale_up(arc_width, z),
            scale_up(arc_height, z),
        );
        Ok(())
    }

    pub fn draw_oval(&mut self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::DRAW)?;
        let rect = scale_up_rect(normalize(rect), self.zoom);
        self.backend.draw_oval(rect);
        Ok(())
    }

    pub fn draw_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::DRAW)?;
        let rect = scale_up_rect(normalize(rect), self.zoom);
        self.backend.draw_arc(rect, start_angle, arc_angle);
        Ok(())
    }

    pub fn draw_polyline(&mut self, points: &[i32]) -> Result<()> {
        self.state.check_disposed()?;
        check_point_array(points)?;
        self.check_gc(GcState::DRAW)?;
        let scaled = scale_up_points(points, self.zoom);
        self.backend.draw_polyline(&scaled);
        Ok(())
    }

    pub fn draw_polygon(&mut self, points: &[i32]) -> Result<()> {
        self.state.check_disposed()?;
        check_point_array(points)?;
        self.check_gc(GcState::DRAW)?;
        let scaled = scale_up_points(points, self.zoom);
        self.backend.draw_polygon(&scaled);
        Ok(())
    }

    pub fn draw_path(&mut self, path: &Path) -> Result<()> {
        self.state.check_disposed()?;
        path.check_disposed()?;
        self.require_advanced()?;
        self.advanced = true;
        self.check_gc(GcState::DRAW)?;
        let handle = path.handle_for_zoom(self.zoom)?;
        let data = path.data_for_zoom(self.zoom);
        self.backend.draw_path(handle, &data);
        Ok(())
    }

    pub fn draw_focus(&mut self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::DRAW)?;
        let rect = scale_up_rect(normalize(rect), self.zoom);
        self.backend.draw_focus(rect);
        Ok(())
    }

    // ---- fill primitives -----------------------------------------------

    pub fn fill_rectangle(&mut self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::FILL)?;
        let rect = scale_up_rect(normalize(rect), self.zoom);
        self.backend.fill_rect(rect);
        Ok(())
    }

    pub fn fill_round_rectangle(
        &mut self,
        rect: Rectangle,
        arc_width: i32,
        arc_height: i32,
    ) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::FILL)?;
        let z = self.zoom;
        self.backend.fill_round_rect(
            scale_up_rect(normalize(rect), z),
            scale_up(arc_width, z),
            scale_up(arc_height, z),
        );
        Ok(())
    }

    pub fn fill_oval(&mut self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::FILL)?;
        let rect = scale_up_rect(normalize(rect), self.zoom);
        self.backend.fill_oval(rect);
        Ok(())
    }

    pub fn fill_arc(&mut self, rect: Rectangle, start_angle: i32, arc_angle: i32) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::FILL)?;
        let rect = scale_up_rect(normalize(rect), self.zoom);
        self.backend.fill_arc(rect, start_angle, arc_angle);
        Ok(())
    }

    pub fn fill_polygon(&mut self, points: &[i32]) -> Result<()> {
        self.state.check_disposed()?;
        check_point_array(points)?;
        self.check_gc(GcState::FILL)?;
        let scaled = scale_up_points(points, self.zoom);
        self.backend.fill_polygon(&scaled);
        Ok(())
    }

    pub fn fill_path(&mut self, path: &Path) -> Result<()> {
        self.state.check_disposed()?;
        path.check_disposed()?;
        self.require_advanced()?;
        self.advanced = true;
        self.check_gc(GcState::FILL)?;
        let handle = path.handle_for_zoom(self.zoom)?;
        let data = path.data_for_zoom(self.zoom);
        self.backend.fill_path(handle, &data);
        Ok(())
    }

    /// Fills `rect` with a linear gradient from the foreground to the
    /// background color, left-to-right or top-to-bottom.
    pub fn fill_gradient_rectangle(&mut self, rect: Rectangle, vertical: bool) -> Result<()> {
        self.state.check_disposed()?;
        let rect = normalize(rect);
        if rect.is_empty() {
            return Ok(());
        }
        let mut start = self.foreground.rgba();
        let mut end = self.background.rgba();
        start.alpha = self.alpha;
        end.alpha = self.alpha;
        if start == end {
            return self.fill_rectangle_with(rect, self.background);
        }
        self.check_gc(GcState::FILL)?;
        let rect = scale_up_rect(rect, self.zoom);
        self.backend.fill_gradient_rect(rect, vertical, start, end);
        Ok(())
    }

    fn fill_rectangle_with(&mut self, rect: Rectangle, color: Color) -> Result<()> {
        let saved = self.background;
        self.set_background(color)?;
        let result = self.fill_rectangle(rect);
        self.set_background(saved)?;
        result
    }

    // ---- text ----------------------------------------------------------

    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, flags: TextFlags) -> Result<()> {
        self.state.check_disposed()?;
        self.check_gc(GcState::TEXT)?;
        let z = self.zoom;
        self.backend
            .draw_text(text, scale_up(x, z), scale_up(y, z), flags);
        Ok(())
    }

    /// Draws `text` honoring tabs and newlines, opaquely unless
    /// `transparent`.
    pub fn draw_string(&mut self, text: &str, x: i32, y: i32, transparent: bool) -> Result<()> {
        self.draw_text(
            text,
            x,
            y,
            TextFlags {
                transparent,
                expand_tabs: true,
                newlines: true,
                mnemonics: false,
            },
        )
    }

    /// Size of `text` under the current font, in logical points.
    pub fn text_extent(&mut self, text: &str, flags: TextFlags) -> Result<Point> {
        self.state.check_disposed()?;
        self.check_gc(GcState::FONT)?;
        let (w, h) = self.backend.text_extent(text, flags);
        Ok(Point::new(scale_down(w, self.zoom), scale_down(h, self.zoom)))
    }

    pub fn string_extent(&mut self, text: &str) -> Result<Point> {
        self.text_extent(
            text,
            TextFlags {
                transparent: true,
                expand_tabs: true,
                newlines: true,
                mnemonics: false,
            },
        )
    }

    /// Advance width of a single character in the current font, in points.
    pub fn char_width(&mut self, ch: char) -> Result<i32> {
        let mut buf = [0u8; 4];
        Ok(self.string_extent(ch.encode_utf8(&mut buf))?.x)
    }

    // ---- images and area transfer --------------------------------------

    pub fn draw_image(&mut self, image: &Image, x: i32, y: i32) -> Result<()> {
        let bounds = image.bounds()?;
        self.draw_image_scaled(
            image,
            bounds,
            Rectangle::new(x, y, bounds.width, bounds.height),
        )
    }

    /// Draws `src` (logical coordinates within the image) into `dest`.
    pub fn draw_image_scaled(
        &mut self,
        image: &Image,
        src: Rectangle,
        dest: Rectangle,
    ) -> Result<()> {
        self.state.check_disposed()?;
        if src.is_empty() || dest.is_empty() {
            return Err(GraphicsError::InvalidArgument("empty image rectangle"));
        }
        let bounds = image.bounds()?;
        if src.union(&bounds) != bounds {
            return Err(GraphicsError::InvalidArgument(
                "source rectangle outside image bounds",
            ));
        }
        let handle = image.handle(self.zoom)?;
        let z = self.zoom;
        self.backend.draw_image(
            handle,
            scale_up_rect(src, z),
            scale_up_rect(dest, z),
            image.background_rgba(),
        );
        Ok(())
    }

    /// Copies `src` to `(dest_x, dest_y)` on the same target; `paint`
    /// requests an exposure repaint of the vacated area.
    pub fn copy_area(
        &mut self,
        src: Rectangle,
        dest_x: i32,
        dest_y: i32,
        paint: bool,
    ) -> Result<()> {
        self.state.check_disposed()?;
        let z = self.zoom;
        self.backend.copy_area(
            scale_up_rect(normalize(src), z),
            scale_up(dest_x, z),
            scale_up(dest_y, z),
            paint,
        );
        Ok(())
    }

    /// Copies the target's contents starting at `(x, y)` into `image`.
    pub fn copy_area_to_image(&mut self, image: &Image, x: i32, y: i32) -> Result<()> {
        self.state.check_disposed()?;
        let handle = image.handle(self.zoom)?;
        let z = self.zoom;
        self.backend
            .copy_area_to_image(handle, scale_up(x, z), scale_up(y, z));
        Ok(())
    }
}

impl Drop for Gc {
    fn drop(&mut self) {
        if !self.state.is_disposed() {
            tracing::warn!("graphics context dropped without dispose");
        }
    }
}

fn normalize(rect: Rectangle) -> Rectangle {
    let mut r = rect;
    if r.width < 0 {
        r.x += r.width;
        r.width = -r.width;
    }
    if r.height < 0 {
        r.y += r.height;
        r.height = -r.height;
    }
    r
}

fn check_point_array(points: &[i32]) -> Result<()> {
    if points.len() % 2 != 0 {
        return Err(GraphicsError::InvalidArgument(
            "point array must hold x/y pairs",
        ));
    }
    Ok(())
}
