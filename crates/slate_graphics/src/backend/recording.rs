//! Recording surface
//!
//! A headless [`NativeSurface`] that allocates fake handles and records every
//! call. It backs the test suite (call counters, applied-state inspection)
//! and doubles as a null backend for environments without a platform surface.

use std::cell::{Cell, RefCell};

use rustc_hash::FxHashMap;

use slate_bridge::{BrushSpec, FontSpec, PenSpec, TextFlags};
use slate_core::geometry::{PathData, Rectangle, Rgba};
use slate_core::Result;

use super::native::{GcTarget, NativeSurface};
use super::{BackendHandle, ClipSpec};
use crate::image::ImageData;

#[derive(Default)]
pub struct RecordingSurface {
    next: Cell<u64>,
    calls: RefCell<Vec<&'static str>>,
    pens: RefCell<Vec<PenSpec>>,
    brushes: RefCell<Vec<BrushSpec>>,
    offsets: RefCell<Vec<(f32, f32)>>,
    images: RefCell<FxHashMap<BackendHandle, ImageData>>,
    image_backgrounds: RefCell<Vec<Option<Rgba>>>,
    fonts: RefCell<FxHashMap<BackendHandle, FontSpec>>,
    /// Set to false to model a backend without the advanced subsystem.
    no_advanced: Cell<bool>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that reports no advanced-graphics support.
    pub fn without_advanced() -> Self {
        let s = Self::default();
        s.no_advanced.set(true);
        s
    }

    fn record(&self, call: &'static str) -> BackendHandle {
        self.calls.borrow_mut().push(call);
        let id = self.next.get() + 1;
        self.next.set(id);
        id
    }

    fn log(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    /// Number of times `call` was invoked.
    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    /// Call names in invocation order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Specs of every pen created so far.
    pub fn created_pens(&self) -> Vec<PenSpec> {
        self.pens.borrow().clone()
    }

    pub fn created_brushes(&self) -> Vec<BrushSpec> {
        self.brushes.borrow().clone()
    }

    /// Transparency substitution color of every image draw, in order.
    pub fn image_backgrounds(&self) -> Vec<Option<Rgba>> {
        self.image_backgrounds.borrow().clone()
    }

    /// Draw offsets applied, in order.
    pub fn draw_offsets(&self) -> Vec<(f32, f32)> {
        self.offsets.borrow().clone()
    }

    pub fn live_image_count(&self) -> usize {
        self.images.borrow().len()
    }

    /// Pixels of the most recently created image still alive. Handles are
    /// monotonic, so the highest key is the newest.
    pub fn image_data_for_last_created(&self) -> Option<ImageData> {
        let images = self.images.borrow();
        images
            .keys()
            .max()
            .and_then(|handle| images.get(handle).cloned())
    }
}

impl NativeSurface for RecordingSurface {
    fn create_pen(&self, pen: &PenSpec) -> Result<BackendHandle> {
        self.pens.borrow_mut().push(pen.clone());
        Ok(self.record("create_pen"))
    }

    fn destroy_pen(&self, _handle: BackendHandle) {
        self.log("destroy_pen");
    }

    fn create_brush(&self, brush: &BrushSpec) -> Result<BackendHandle> {
        self.brushes.borrow_mut().push(brush.clone());
        Ok(self.record("create_brush"))
    }

    fn destroy_brush(&self, _handle: BackendHandle) {
        self.log("destroy_brush");
    }

    fn create_font(&self, font: &FontSpec) -> Result<BackendHandle> {
        let handle = self.record("create_font");
        self.fonts.borrow_mut().insert(handle, font.clone());
        Ok(handle)
    }

    fn destroy_font(&self, handle: BackendHandle) {
        self.log("destroy_font");
        self.fonts.borrow_mut().remove(&handle);
    }

    fn create_image(&self, data: &ImageData, _zoom: u32) -> Result<BackendHandle> {
        let handle = self.record("create_image");
        self.images.borrow_mut().insert(handle, data.clone());
        Ok(handle)
    }

    fn create_blank_image(
        &self,
        width_px: i32,
        height_px: i32,
        _zoom: u32,
    ) -> Result<BackendHandle> {
        let handle = self.record("create_blank_image");
        self.images
            .borrow_mut()
            .insert(handle, ImageData::blank(width_px, height_px));
        Ok(handle)
    }

    fn read_image(&self, handle: BackendHandle) -> Option<ImageData> {
        self.log("read_image");
        self.images.borrow().get(&handle).cloned()
    }

    fn destroy_image(&self, handle: BackendHandle) {
        self.log("destroy_image");
        self.images.borrow_mut().remove(&handle);
    }

    fn create_path(&self, _data: &PathData) -> Result<BackendHandle> {
        Ok(self.record("create_path"))
    }

    fn destroy_path(&self, _handle: BackendHandle) {
        self.log("destroy_path");
    }

    fn create_region(&self) -> Result<BackendHandle> {
        Ok(self.record("create_region"))
    }

    fn region_set(&self, _handle: BackendHandle, _rects: &[Rectangle]) {
        self.log("region_set");
    }

    fn destroy_region(&self, _handle: BackendHandle) {
        self.log("destroy_region");
    }

    fn create_transform(&self, _elements: [f32; 6]) -> Result<BackendHandle> {
        Ok(self.record("create_transform"))
    }

    fn transform_set(&self, _handle: BackendHandle, _elements: [f32; 6]) {
        self.log("transform_set");
    }

    fn destroy_transform(&self, _handle: BackendHandle) {
        self.log("destroy_transform");
    }

    fn new_gc(&self, _target: GcTarget) -> Result<BackendHandle> {
        Ok(self.record("new_gc"))
    }

    fn destroy_gc(&self, _gc: BackendHandle) {
        self.log("destroy_gc");
    }

    fn select_pen(&self, _gc: BackendHandle, _pen: Option<BackendHandle>) {
        self.log("select_pen");
    }

    fn select_brush(&self, _gc: BackendHandle, _brush: Option<BackendHandle>) {
        self.log("select_brush");
    }

    fn select_font(&self, _gc: BackendHandle, _font: BackendHandle) {
        self.log("select_font");
    }

    fn set_text_colors(&self, _gc: BackendHandle, _fg: Rgba, _bg: Option<Rgba>) {
        self.log("set_text_colors");
    }

    fn set_draw_offset(&self, _gc: BackendHandle, x: f32, y: f32) {
        self.offsets.borrow_mut().push((x, y));
        self.log("set_draw_offset");
    }

    fn set_alpha(&self, _gc: BackendHandle, _alpha: u8) {
        self.log("set_alpha");
    }

    fn set_antialias(&self, _gc: BackendHandle, _on: bool) {
        self.log("set_antialias");
    }

    fn set_text_antialias(&self, _gc: BackendHandle, _on: bool) {
        self.log("set_text_antialias");
    }

    fn set_interpolation(&self, _gc: BackendHandle, _level: i8) {
        self.log("set_interpolation");
    }

    fn set_fill_rule(&self, _gc: BackendHandle, _even_odd: bool) {
        self.log("set_fill_rule");
    }

    fn set_xor(&self, _gc: BackendHandle, _xor: bool) {
        self.log("set_xor");
    }

    fn set_clip(&self, _gc: BackendHandle, _clip: &ClipSpec) {
        self.log("set_clip");
    }

    fn set_transform(&self, _gc: BackendHandle, _elements: Option<[f32; 6]>) {
        self.log("set_transform");
    }

    fn draw_line(&self, _gc: BackendHandle, _x1: i32, _y1: i32, _x2: i32, _y2: i32) {
        self.log("draw_line");
    }

    fn draw_point(&self, _gc: BackendHandle, _x: i32, _y: i32) {
        self.log("draw_point");
    }

    fn draw_rect(&self, _gc: BackendHandle, _rect: Rectangle) {
        self.log("draw_rect");
    }

    fn fill_rect(&self, _gc: BackendHandle, _rect: Rectangle) {
        self.log("fill_rect");
    }

    fn draw_round_rect(&self, _gc: BackendHandle, _rect: Rectangle, _aw: i32, _ah: i32) {
        self.log("draw_round_rect");
    }

    fn fill_round_rect(&self, _gc: BackendHandle, _rect: Rectangle, _aw: i32, _ah: i32) {
        self.log("fill_round_rect");
    }

    fn draw_oval(&self, _gc: BackendHandle, _rect: Rectangle) {
        self.log("draw_oval");
    }

    fn fill_oval(&self, _gc: BackendHandle, _rect: Rectangle) {
        self.log("fill_oval");
    }

    fn draw_arc(&self, _gc: BackendHandle, _rect: Rectangle, _start: i32, _arc: i32) {
        self.log("draw_arc");
    }

    fn fill_arc(&self, _gc: BackendHandle, _rect: Rectangle, _start: i32, _arc: i32) {
        self.log("fill_arc");
    }

    fn draw_polyline(&self, _gc: BackendHandle, _points: &[i32]) {
        self.log("draw_polyline");
    }

    fn draw_polygon(&self, _gc: BackendHandle, _points: &[i32]) {
        self.log("draw_polygon");
    }

    fn fill_polygon(&self, _gc: BackendHandle, _points: &[i32]) {
        self.log("fill_polygon");
    }

    fn draw_path(&self, _gc: BackendHandle, _path: BackendHandle) {
        self.log("draw_path");
    }

    fn fill_path(&self, _gc: BackendHandle, _path: BackendHandle) {
        self.log("fill_path");
    }

    fn draw_focus(&self, _gc: BackendHandle, _rect: Rectangle) {
        self.log("draw_focus");
    }

    fn fill_gradient_rect(
        &self,
        _gc: BackendHandle,
        _rect: Rectangle,
        _vertical: bool,
        _start: Rgba,
        _end: Rgba,
    ) {
        self.log("fill_gradient_rect");
    }

    fn draw_text(&self, _gc: BackendHandle, _text: &str, _x: i32, _y: i32, _flags: TextFlags) {
        self.log("draw_text");
    }

    fn draw_image(
        &self,
        _gc: BackendHandle,
        _image: BackendHandle,
        _src: Rectangle,
        _dest: Rectangle,
        background: Option<Rgba>,
    ) {
        self.image_backgrounds.borrow_mut().push(background);
        self.log("draw_image");
    }

    fn copy_area(&self, _gc: BackendHandle, _src: Rectangle, _dx: i32, _dy: i32, _paint: bool) {
        self.log("copy_area");
    }

    fn copy_area_to_image(&self, _gc: BackendHandle, _image: BackendHandle, _x: i32, _y: i32) {
        self.log("copy_area_to_image");
    }

    fn text_extent(&self, font: BackendHandle, text: &str, _flags: TextFlags) -> (i32, i32) {
        self.log("text_extent");
        let height_px = self
            .fonts
            .borrow()
            .get(&font)
            .map(|f| (f.height * f.zoom as f32 / 100.0).round() as i32)
            .unwrap_or(0);
        // Fixed-advance estimate; real metrics come from the platform.
        (text.chars().count() as i32 * (height_px / 2).max(1), height_px)
    }

    fn supports_advanced(&self) -> bool {
        !self.no_advanced.get()
    }
}
