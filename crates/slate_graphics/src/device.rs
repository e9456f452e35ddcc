//! Device
//!
//! A device owns the backend chosen at construction, the current display
//! zoom, the font-handle cache, and the resource-tracking registries. All
//! graphics resources hold a cloned device facade (an `Rc` share of the same
//! device state); the model is single-threaded and cooperative, so there is
//! no locking anywhere in here.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use slate_bridge::{DrawOp, TextFlags, DEVICE_SCOPE};
use slate_core::geometry::{PathData, Rectangle, Rgb};
use slate_core::Result;

use crate::backend::bridge::BridgeGc;
use crate::backend::native::{GcTarget, NativeGc};
use crate::backend::{BackendHandle, BackendKind, GcBackend};
use crate::font::FontData;
use crate::image::ImageData;

/// Palette of colors the system supplies for derived-image rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemColor {
    Black,
    WidgetNormalShadow,
    WidgetBackground,
}

/// Resources holding zoom-keyed handle caches register here so an external
/// zoom-set change can evict stale variants device-wide.
pub(crate) trait ZoomPrunable {
    fn prune_zoom_levels(&self, keep: &[u32]);
}

struct DeviceInner {
    backend: BackendKind,
    zoom: Cell<u32>,
    next_id: Cell<u64>,
    /// Leak-detection registry: id -> resource kind.
    tracked: RefCell<FxHashMap<u64, &'static str>>,
    zoom_aware: RefCell<Vec<Weak<dyn ZoomPrunable>>>,
    font_cache: RefCell<FxHashMap<(FontData, u32), BackendHandle>>,
    system_font: FontData,
    disposed: Cell<bool>,
}

/// Shared facade over the device state.
#[derive(Clone)]
pub struct Device {
    inner: Rc<DeviceInner>,
}

impl Device {
    /// Creates a device over the given backend at the given display zoom.
    pub fn new(backend: BackendKind, zoom: u32) -> Self {
        assert!(zoom > 0, "zoom must be positive");
        Self {
            inner: Rc::new(DeviceInner {
                backend,
                zoom: Cell::new(zoom),
                next_id: Cell::new(1),
                tracked: RefCell::new(FxHashMap::default()),
                zoom_aware: RefCell::new(Vec::new()),
                font_cache: RefCell::new(FxHashMap::default()),
                system_font: FontData::new("System", 9),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Current display zoom in percent of the 100%-DPI baseline.
    pub fn zoom(&self) -> u32 {
        self.inner.zoom.get()
    }

    /// Updates the display zoom (monitor change, scale-factor change).
    pub fn set_zoom(&self, zoom: u32) {
        assert!(zoom > 0, "zoom must be positive");
        self.inner.zoom.set(zoom);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Releases the device. Live tracked resources at this point are leaks;
    /// they are reported as diagnostics, never as failures.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let tracked = self.inner.tracked.borrow();
        if !tracked.is_empty() {
            let mut kinds: Vec<&str> = tracked.values().copied().collect();
            kinds.sort_unstable();
            warn!(count = tracked.len(), ?kinds, "device disposed with undisposed resources");
        }
    }

    pub fn system_font(&self) -> FontData {
        self.inner.system_font.clone()
    }

    pub fn system_color(&self, which: SystemColor) -> Rgb {
        match which {
            SystemColor::Black => Rgb::new(0, 0, 0),
            SystemColor::WidgetNormalShadow => Rgb::new(160, 160, 160),
            SystemColor::WidgetBackground => Rgb::new(240, 240, 240),
        }
    }

    pub(crate) fn next_id(&self) -> u64 {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        id
    }

    // ---- leak tracking ------------------------------------------------

    pub(crate) fn track(&self, kind: &'static str) -> u64 {
        let id = self.next_id();
        self.inner.tracked.borrow_mut().insert(id, kind);
        id
    }

    pub(crate) fn untrack(&self, id: u64) {
        self.inner.tracked.borrow_mut().remove(&id);
    }

    /// Number of live tracked resources (diagnostic).
    pub fn tracked_resource_count(&self) -> usize {
        self.inner.tracked.borrow().len()
    }

    // ---- zoom-aware registry ------------------------------------------

    pub(crate) fn register_zoom_aware(&self, resource: Weak<dyn ZoomPrunable>) {
        self.inner.zoom_aware.borrow_mut().push(resource);
    }

    /// Signals that only the given zoom levels remain in use; every
    /// registered resource evicts handle variants outside the set.
    pub fn prune_zoom_levels(&self, keep: &[u32]) {
        debug!(?keep, "pruning zoom-level handle caches");
        let mut registry = self.inner.zoom_aware.borrow_mut();
        registry.retain(|weak| match weak.upgrade() {
            Some(resource) => {
                resource.prune_zoom_levels(keep);
                true
            }
            None => false,
        });
    }

    // ---- backend facade ------------------------------------------------

    pub(crate) fn new_gc_backend(&self, target: GcTarget) -> Result<(Box<dyn GcBackend>, u64)> {
        match &self.inner.backend {
            BackendKind::Native(surface) => {
                let gc = NativeGc::new(Rc::clone(surface), target)?;
                Ok((Box::new(gc), self.next_id()))
            }
            BackendKind::Bridge(sink) => {
                let id = self.next_id();
                Ok((Box::new(BridgeGc::new(Rc::clone(sink), id)), id))
            }
        }
    }

    pub(crate) fn image_from_data(&self, data: &ImageData, zoom: u32) -> Result<BackendHandle> {
        match &self.inner.backend {
            BackendKind::Native(surface) => surface.create_image(data, zoom),
            BackendKind::Bridge(sink) => {
                let handle = self.next_id();
                sink.submit(
                    DEVICE_SCOPE,
                    DrawOp::RegisterImage {
                        image: handle,
                        width: data.width,
                        height: data.height,
                        zoom,
                    },
                );
                Ok(handle)
            }
        }
    }

    pub(crate) fn blank_image(
        &self,
        width_px: i32,
        height_px: i32,
        zoom: u32,
    ) -> Result<BackendHandle> {
        match &self.inner.backend {
            BackendKind::Native(surface) => surface.create_blank_image(width_px, height_px, zoom),
            BackendKind::Bridge(sink) => {
                let handle = self.next_id();
                sink.submit(
                    DEVICE_SCOPE,
                    DrawOp::RegisterImage {
                        image: handle,
                        width: width_px,
                        height: height_px,
                        zoom,
                    },
                );
                Ok(handle)
            }
        }
    }

    /// Decodes the current pixel contents of an image handle, when the
    /// backend can read back (the bridge cannot).
    pub(crate) fn read_image(&self, handle: BackendHandle) -> Option<ImageData> {
        match &self.inner.backend {
            BackendKind::Native(surface) => surface.read_image(handle),
            BackendKind::Bridge(_) => None,
        }
    }

    pub(crate) fn destroy_image(&self, handle: BackendHandle) {
        match &self.inner.backend {
            BackendKind::Native(surface) => surface.destroy_image(handle),
            BackendKind::Bridge(sink) => {
                sink.submit(DEVICE_SCOPE, DrawOp::DestroyImage { image: handle });
            }
        }
    }

    pub(crate) fn font_handle(&self, data: &FontData, zoom: u32) -> Result<BackendHandle> {
        let key = (data.clone(), zoom);
        if let Some(&handle) = self.inner.font_cache.borrow().get(&key) {
            return Ok(handle);
        }
        let handle = match &self.inner.backend {
            BackendKind::Native(surface) => surface.create_font(&data.to_spec(zoom))?,
            BackendKind::Bridge(_) => self.next_id(),
        };
        self.inner.font_cache.borrow_mut().insert(key, handle);
        Ok(handle)
    }

    pub(crate) fn path_handle(&self, data: &PathData) -> Result<BackendHandle> {
        match &self.inner.backend {
            BackendKind::Native(surface) => surface.create_path(data),
            BackendKind::Bridge(_) => Ok(self.next_id()),
        }
    }

    pub(crate) fn destroy_path(&self, handle: BackendHandle) {
        if let BackendKind::Native(surface) = &self.inner.backend {
            surface.destroy_path(handle);
        }
    }

    pub(crate) fn region_handle(&self) -> Result<BackendHandle> {
        match &self.inner.backend {
            BackendKind::Native(surface) => surface.create_region(),
            BackendKind::Bridge(_) => Ok(self.next_id()),
        }
    }

    pub(crate) fn region_set(&self, handle: BackendHandle, rects: &[Rectangle]) {
        if let BackendKind::Native(surface) = &self.inner.backend {
            surface.region_set(handle, rects);
        }
    }

    pub(crate) fn destroy_region(&self, handle: BackendHandle) {
        if let BackendKind::Native(surface) = &self.inner.backend {
            surface.destroy_region(handle);
        }
    }

    pub(crate) fn transform_handle(&self, elements: [f32; 6]) -> Result<BackendHandle> {
        match &self.inner.backend {
            BackendKind::Native(surface) => surface.create_transform(elements),
            BackendKind::Bridge(_) => Ok(self.next_id()),
        }
    }

    pub(crate) fn transform_set(&self, handle: BackendHandle, elements: [f32; 6]) {
        if let BackendKind::Native(surface) = &self.inner.backend {
            surface.transform_set(handle, elements);
        }
    }

    pub(crate) fn destroy_transform(&self, handle: BackendHandle) {
        if let BackendKind::Native(surface) = &self.inner.backend {
            surface.destroy_transform(handle);
        }
    }

    /// Text extent in pixels under the given font identity at `zoom`. The
    /// font handle comes from the interning cache, never a one-off.
    pub(crate) fn text_extent(&self, font: &FontData, zoom: u32, text: &str) -> Result<(i32, i32)> {
        match &self.inner.backend {
            BackendKind::Native(surface) => {
                let handle = self.font_handle(font, zoom)?;
                Ok(surface.text_extent(handle, text, TextFlags::default()))
            }
            BackendKind::Bridge(_) => {
                let spec = font.to_spec(zoom);
                let height_px = (spec.height * zoom as f32 / 100.0).round() as i32;
                Ok((
                    text.chars().count() as i32 * (height_px / 2).max(1),
                    height_px,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingSurface;

    fn native_device() -> (Device, Rc<RecordingSurface>) {
        let surface = Rc::new(RecordingSurface::new());
        let device = Device::new(BackendKind::Native(surface.clone()), 100);
        (device, surface)
    }

    #[test]
    fn test_font_cache_interns_per_zoom() {
        let (device, surface) = native_device();
        let data = FontData::new("Sans", 12);
        let a = device.font_handle(&data, 100).unwrap();
        let b = device.font_handle(&data, 100).unwrap();
        let c = device.font_handle(&data, 150).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(surface.count("create_font"), 2);
    }

    #[test]
    fn test_tracking_registry() {
        let (device, _surface) = native_device();
        let id = device.track("image");
        assert_eq!(device.tracked_resource_count(), 1);
        device.untrack(id);
        assert_eq!(device.tracked_resource_count(), 0);
    }

    #[test]
    fn test_dispose_with_leaks_does_not_panic() {
        let (device, _surface) = native_device();
        device.track("font");
        device.dispose();
        assert!(device.is_disposed());
        // idempotent
        device.dispose();
    }
}
