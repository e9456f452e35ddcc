//! Images with per-zoom backend handles
//!
//! An [`Image`] owns no pixels directly. It holds a provider (the pixel
//! source) and a cache of backend handles keyed by zoom percentage; handles
//! are materialized lazily the first time a zoom is requested and evicted
//! when the display's zoom set changes.

pub mod codec;
pub mod data;
mod provider;

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use slate_core::geometry::{Rectangle, Rgb, Rgba};
use slate_core::scale::scale_up;
use slate_core::zoom_cache::ZoomCache;
use slate_core::{GraphicsError, Result};

use crate::backend::BackendHandle;
use crate::color::Color;
use crate::device::{Device, SystemColor, ZoomPrunable};
use crate::resource::ResourceState;

pub use data::{ImageData, PaletteData};
pub use provider::{DataForZoom, FileForZoom, ImageDrawer};

use provider::{ImageProvider, ImageSource};

/// Transformation applied when deriving one image from another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeriveStyle {
    Copy,
    Gray,
    Disable,
}

/// Whether the image carries a transparency plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Bitmap,
    Icon,
}

pub(crate) struct ImageInner {
    state: ResourceState,
    provider: ImageProvider,
    handles: RefCell<ZoomCache<BackendHandle>>,
    kind: ImageKind,
    style: DeriveStyle,
    /// Zoom targeted by the active graphics context; at most one may target
    /// an image at a time, and its handle must survive pruning.
    gc_zoom: Cell<Option<u32>>,
    /// Color substituted for the transparent pixel when drawn, if any.
    background: Cell<Option<Rgb>>,
    /// Device zoom at construction; this handle is never pruned.
    base_zoom: u32,
    width: i32,
    height: i32,
}

/// A drawable, backend-resident image. Cloning shares the handle cache.
#[derive(Clone)]
pub struct Image {
    inner: Rc<ImageInner>,
}

impl Image {
    fn from_provider(
        device: &Device,
        provider: ImageProvider,
        kind: ImageKind,
        style: DeriveStyle,
    ) -> Result<Self> {
        let (width, height) = provider.logical_size()?;
        let inner = Rc::new(ImageInner {
            state: ResourceState::new(device, "image"),
            provider,
            handles: RefCell::new(ZoomCache::new()),
            kind,
            style,
            gc_zoom: Cell::new(None),
            background: Cell::new(None),
            base_zoom: device.zoom(),
            width,
            height,
        });
        let weak = Rc::downgrade(&inner) as Weak<dyn ZoomPrunable>;
        device.register_zoom_aware(weak);
        Ok(Image { inner })
    }

    /// Blank image of `width` x `height` points, drawable through a
    /// graphics context.
    pub fn new(device: &Device, width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(GraphicsError::InvalidArgument(
                "image dimensions must be positive",
            ));
        }
        let zoom = device.zoom();
        let data = ImageData::blank(scale_up(width, zoom), scale_up(height, zoom));
        Self::from_provider(
            device,
            ImageProvider::new(ImageSource::Plain { data, zoom }),
            ImageKind::Bitmap,
            DeriveStyle::Copy,
        )
    }

    /// Image from decoded pixels, interpreted at 100% zoom.
    pub fn from_data(device: &Device, data: ImageData) -> Result<Self> {
        Self::from_provider(
            device,
            ImageProvider::new(ImageSource::Plain { data, zoom: 100 }),
            ImageKind::Bitmap,
            DeriveStyle::Copy,
        )
    }

    /// Icon-style image: `data` gives the color plane, `mask` the
    /// transparency plane.
    pub fn from_data_with_mask(device: &Device, data: ImageData, mask: &ImageData) -> Result<Self> {
        if data.width != mask.width || data.height != mask.height {
            return Err(GraphicsError::InvalidArgument(
                "mask size does not match image size",
            ));
        }
        let mut data = data;
        apply_mask(&mut data, mask)?;
        Self::from_provider(
            device,
            ImageProvider::new(ImageSource::Plain { data, zoom: 100 }),
            ImageKind::Icon,
            DeriveStyle::Copy,
        )
    }

    /// Decodes a file at 100% zoom.
    pub fn from_file(device: &Device, path: &Path) -> Result<Self> {
        let data = codec::load_file(path)?;
        Self::from_data(device, data)
    }

    /// Decodes an in-memory encoded image at 100% zoom.
    pub fn from_bytes(device: &Device, bytes: &[u8]) -> Result<Self> {
        let data = codec::load_bytes(bytes)?;
        Self::from_data(device, data)
    }

    /// Application supplies decoded pixels per zoom.
    pub fn with_data_source(device: &Device, source: Rc<dyn DataForZoom>) -> Result<Self> {
        Self::from_provider(
            device,
            ImageProvider::new(ImageSource::DataByZoom(source)),
            ImageKind::Bitmap,
            DeriveStyle::Copy,
        )
    }

    /// Application supplies file paths per zoom.
    pub fn with_file_source(device: &Device, source: Rc<dyn FileForZoom>) -> Result<Self> {
        Self::from_provider(
            device,
            ImageProvider::new(ImageSource::FileByZoom(source)),
            ImageKind::Bitmap,
            DeriveStyle::Copy,
        )
    }

    /// Application paints the content on demand; the callback runs once per
    /// zoom level and its output is never rescaled.
    pub fn with_drawer(
        device: &Device,
        drawer: Rc<dyn ImageDrawer>,
        width: i32,
        height: i32,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(GraphicsError::InvalidArgument(
                "image dimensions must be positive",
            ));
        }
        Self::from_provider(
            device,
            ImageProvider::new(ImageSource::Drawer {
                drawer,
                width,
                height,
            }),
            ImageKind::Bitmap,
            DeriveStyle::Copy,
        )
    }

    /// Derives a copied, grayed, or disabled rendition of `source`.
    pub fn derived(device: &Device, source: &Image, style: DeriveStyle) -> Result<Self> {
        source.inner.state.check_disposed()?;
        let mut zooms = source.inner.handles.borrow().zooms();
        for z in [100, device.zoom()] {
            if !zooms.contains(&z) {
                zooms.push(z);
            }
        }
        let mut renditions: FxHashMap<u32, ImageData> = FxHashMap::default();
        for zoom in zooms {
            let data = source.image_data(zoom)?;
            let data = match style {
                DeriveStyle::Copy => data,
                DeriveStyle::Gray => to_gray(&data)?,
                DeriveStyle::Disable => to_disabled(device, &data)?,
            };
            renditions.insert(zoom, data);
        }
        let kind = source.inner.kind;
        let source = move |zoom: u32| renditions.get(&zoom).cloned();
        Self::from_provider(
            device,
            ImageProvider::new(ImageSource::DataByZoom(Rc::new(source))),
            kind,
            style,
        )
    }

    pub fn device(&self) -> Device {
        self.inner.state.device().clone()
    }

    /// Logical size in points, zoom-independent.
    pub fn bounds(&self) -> Result<Rectangle> {
        self.inner.state.check_disposed()?;
        Ok(Rectangle::new(0, 0, self.inner.width, self.inner.height))
    }

    pub fn kind(&self) -> ImageKind {
        self.inner.kind
    }

    /// How these pixels were derived from their source image.
    pub fn derive_style(&self) -> DeriveStyle {
        self.inner.style
    }

    /// Color substituted for the transparent pixel when the image is drawn.
    pub fn background(&self) -> Result<Option<Color>> {
        self.inner.state.check_disposed()?;
        Ok(self.inner.background.get().map(Color::from))
    }

    pub(crate) fn background_rgba(&self) -> Option<Rgba> {
        self.inner.background.get().map(|rgb| Rgba { rgb, alpha: 255 })
    }

    pub fn set_background(&self, color: Color) -> Result<()> {
        self.inner.state.check_disposed()?;
        self.inner.background.set(Some(color.rgb()));
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.is_disposed()
    }

    /// Backend handle for `zoom`, materializing it on first use.
    pub fn handle(&self, zoom: u32) -> Result<BackendHandle> {
        self.inner.state.check_disposed()?;
        if let Some(&handle) = self.inner.handles.borrow().get(zoom) {
            return Ok(handle);
        }
        let device = self.device();
        if let Some((drawer, width, height)) = self.inner.provider.drawer() {
            // The handle must be visible in the cache before the callback
            // runs, or a reentrant lookup would materialize a second one.
            let (w_px, h_px) = provider::drawer_extent(width, height, zoom);
            let handle = device.blank_image(w_px, h_px, zoom)?;
            self.inner.handles.borrow_mut().insert(zoom, handle);
            let mut gc = crate::gc::Gc::for_image_handle(&device, handle, zoom)?;
            let drawn = drawer.draw(&mut gc, width, height);
            gc.dispose();
            if let Err(err) = drawn {
                self.inner.handles.borrow_mut().remove(zoom);
                device.destroy_image(handle);
                return Err(err);
            }
            return Ok(handle);
        }
        let (data, produced) = self.inner.provider.data_for_zoom(zoom)?;
        let data = if produced == zoom {
            data
        } else {
            let w_px = scale_up(self.inner.width, zoom).max(1);
            let h_px = scale_up(self.inner.height, zoom).max(1);
            data.scaled_to(w_px, h_px)?
        };
        let handle = device.image_from_data(&data, zoom)?;
        self.inner.handles.borrow_mut().insert(zoom, handle);
        Ok(handle)
    }

    /// Decoded pixels for `zoom`. Prefers backend readback so drawing done
    /// through a graphics context is visible; falls back to the provider.
    pub fn image_data(&self, zoom: u32) -> Result<ImageData> {
        self.inner.state.check_disposed()?;
        let device = self.device();
        let cached = {
            let handles = self.inner.handles.borrow();
            handles
                .nearest_zoom(zoom)
                .and_then(|near| handles.get(near).map(|&h| (near, h)))
        };
        if let Some((near, handle)) = cached {
            if let Some(data) = device.read_image(handle) {
                if near == zoom {
                    return Ok(data);
                }
                let w_px = scale_up(self.inner.width, zoom).max(1);
                let h_px = scale_up(self.inner.height, zoom).max(1);
                return data.scaled_to(w_px, h_px);
            }
        }
        if self.inner.provider.drawer().is_some() {
            // Materialize through the callback, then read back.
            let handle = self.handle(zoom)?;
            return device.read_image(handle).ok_or(GraphicsError::InvalidImage);
        }
        let (data, produced) = self.inner.provider.data_for_zoom(zoom)?;
        if produced == zoom {
            return Ok(data);
        }
        let w_px = scale_up(self.inner.width, zoom).max(1);
        let h_px = scale_up(self.inner.height, zoom).max(1);
        data.scaled_to(w_px, h_px)
    }

    /// Drops every cached handle not in `keep`. The construction-zoom handle
    /// and the handle an active graphics context is drawing into always
    /// survive.
    pub fn destroy_handles_except(&self, keep: &[u32]) {
        self.inner.evict_handles(keep);
    }

    /// Zoom levels with a live backend handle.
    pub fn cached_zooms(&self) -> Vec<u32> {
        self.inner.handles.borrow().zooms()
    }

    pub fn dispose(&self) {
        if !self.inner.state.mark_disposed() {
            return;
        }
        let device = self.device();
        self.inner
            .handles
            .borrow_mut()
            .clear(|handle| device.destroy_image(handle));
    }

    pub(crate) fn begin_gc(&self, zoom: u32) -> Result<()> {
        self.inner.state.check_disposed()?;
        if self.inner.gc_zoom.get().is_some() {
            return Err(GraphicsError::InvalidArgument(
                "image already targeted by a graphics context",
            ));
        }
        self.inner.gc_zoom.set(Some(zoom));
        Ok(())
    }

    pub(crate) fn gc_guard(&self) -> Rc<ImageInner> {
        Rc::clone(&self.inner)
    }
}

impl ImageInner {
    pub(crate) fn end_gc(&self) {
        self.gc_zoom.set(None);
    }

    fn evict_handles(&self, keep: &[u32]) {
        let device = self.state.device();
        let mut retain = keep.to_vec();
        retain.push(self.base_zoom);
        if let Some(zoom) = self.gc_zoom.get() {
            retain.push(zoom);
        }
        self.handles
            .borrow_mut()
            .retain_only(&retain, |handle| device.destroy_image(handle));
    }
}

impl ZoomPrunable for ImageInner {
    fn prune_zoom_levels(&self, keep: &[u32]) {
        if self.state.is_disposed() {
            return;
        }
        self.evict_handles(keep);
    }
}

/// Images sharing a pixel source compare equal, provided they classify and
/// derive the pixels the same way.
impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.inner.provider.id == other.inner.provider.id
            && self.inner.kind == other.inner.kind
            && self.inner.style == other.inner.style
    }
}

impl Eq for Image {}

impl std::hash::Hash for Image {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.provider.id.hash(state);
        self.inner.kind.hash(state);
        self.inner.style.hash(state);
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("disposed", &self.inner.state.is_disposed())
            .finish()
    }
}

/// Paints `image` black wherever `mask` is zero and records the mask plane.
/// When an indexed palette has no black entry and no room to grow one, the
/// mask is dropped rather than corrupting existing entries.
fn apply_mask(image: &mut ImageData, mask: &ImageData) -> Result<()> {
    let mask = ImageData::convert_mask(mask)?;
    let black = match &mut image.palette {
        PaletteData::Direct { .. } => image.palette.pixel_for(Rgb::new(0, 0, 0))?,
        PaletteData::Indexed(colors) => {
            match colors.iter().position(|c| *c == Rgb::new(0, 0, 0)) {
                Some(i) => i as u32,
                None => {
                    let capacity = 1usize << image.depth.min(8);
                    if colors.len() >= capacity {
                        tracing::debug!("palette full, transparency mask dropped");
                        return Ok(());
                    }
                    colors.push(Rgb::new(0, 0, 0));
                    (colors.len() - 1) as u32
                }
            }
        }
    };
    for y in 0..image.height {
        for x in 0..image.width {
            if mask.get_pixel(x, y)? == 0 {
                image.set_pixel(x, y, black)?;
            }
        }
    }
    image.mask_pad = mask.scanline_pad;
    image.mask_data = Some(mask.data);
    Ok(())
}

/// Luminance weighting used for gray renditions.
fn luminance(rgb: Rgb) -> u8 {
    ((rgb.red as u32 * 2 + rgb.green as u32 * 5 + rgb.blue as u32) >> 3) as u8
}

/// Gray rendition. Indexed palettes are grayed entry by entry; direct images
/// become 8-bit indexed over a 256-step ramp, reserving 254 for the
/// transparent pixel (collisions move to 255).
fn to_gray(data: &ImageData) -> Result<ImageData> {
    if let PaletteData::Indexed(colors) = &data.palette {
        let mut out = data.clone();
        let grayed = colors
            .iter()
            .enumerate()
            .map(|(i, &rgb)| {
                if i as i32 == data.transparent_pixel {
                    rgb
                } else {
                    let v = luminance(rgb);
                    Rgb::new(v, v, v)
                }
            })
            .collect();
        out.palette = PaletteData::Indexed(grayed);
        return Ok(out);
    }
    let ramp: Vec<Rgb> = (0..=255u8).map(|v| Rgb::new(v, v, v)).collect();
    let mut out = ImageData::new(data.width, data.height, 8, PaletteData::Indexed(ramp))?;
    out.alpha = data.alpha;
    out.alpha_data = data.alpha_data.clone();
    out.mask_data = data.mask_data.clone();
    out.mask_pad = data.mask_pad;
    for y in 0..data.height {
        for x in 0..data.width {
            let pixel = data.get_pixel(x, y)?;
            let value = if data.transparent_pixel >= 0 && pixel == data.transparent_pixel as u32 {
                254
            } else {
                match luminance(data.palette.rgb_for(pixel)?) {
                    254 => 255,
                    v => v,
                }
            };
            out.set_pixel(x, y, value as u32)?;
        }
    }
    if data.transparent_pixel >= 0 {
        out.transparent_pixel = 254;
    }
    Ok(out)
}

/// Threshold on r^2 + g^2 + b^2 separating dark from light pixels in
/// disabled renditions.
const DISABLE_INTENSITY_CUTOFF: u32 = 98304;

/// Disabled (embossed) rendition: dark pixels become the widget shadow
/// color, light pixels the widget background, over an 8-bit palette whose
/// entry 0 is black and doubles as the transparent pixel.
fn to_disabled(device: &Device, data: &ImageData) -> Result<ImageData> {
    let shadow = device.system_color(SystemColor::WidgetNormalShadow);
    let background = device.system_color(SystemColor::WidgetBackground);
    let palette = PaletteData::Indexed(vec![Rgb::new(0, 0, 0), shadow, background]);
    let mut out = ImageData::new(data.width, data.height, 8, palette)?;
    out.alpha = data.alpha;
    out.alpha_data = data.alpha_data.clone();
    out.mask_data = data.mask_data.clone();
    out.mask_pad = data.mask_pad;
    for y in 0..data.height {
        for x in 0..data.width {
            let pixel = data.get_pixel(x, y)?;
            let value = if data.transparent_pixel >= 0 && pixel == data.transparent_pixel as u32 {
                0
            } else {
                let rgb = data.palette.rgb_for(pixel)?;
                let intensity = rgb.red as u32 * rgb.red as u32
                    + rgb.green as u32 * rgb.green as u32
                    + rgb.blue as u32 * rgb.blue as u32;
                if intensity < DISABLE_INTENSITY_CUTOFF {
                    1
                } else {
                    2
                }
            };
            out.set_pixel(x, y, value)?;
        }
    }
    if data.transparent_pixel >= 0 {
        out.transparent_pixel = 0;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::RecordingSurface;
    use crate::backend::{BackendKind, NativeSurface};

    fn device_at(zoom: u32) -> (Device, Rc<RecordingSurface>) {
        let surface = Rc::new(RecordingSurface::new());
        let device = Device::new(BackendKind::Native(Rc::clone(&surface) as Rc<dyn NativeSurface>), zoom);
        (device, surface)
    }

    fn red_pixels(w: i32, h: i32) -> ImageData {
        let mut data = ImageData::blank(w, h);
        for y in 0..h {
            for x in 0..w {
                data.set_pixel(x, y, 0xFF0000).unwrap();
            }
        }
        data
    }

    #[test]
    fn test_background_unset_until_assigned() {
        let (device, _s) = device_at(100);
        let image = Image::from_data(&device, red_pixels(2, 2)).unwrap();
        assert_eq!(image.background().unwrap(), None);
        let green = Color::new(0, 255, 0).unwrap();
        image.set_background(green).unwrap();
        assert_eq!(image.background().unwrap(), Some(green));
        image.dispose();
        assert!(image.background().is_err());
    }

    #[test]
    fn test_handle_materialized_once_per_zoom() {
        let (device, surface) = device_at(100);
        let image = Image::from_data(&device, red_pixels(4, 4)).unwrap();
        let h100 = image.handle(100).unwrap();
        assert_eq!(image.handle(100).unwrap(), h100);
        let h200 = image.handle(200).unwrap();
        assert_ne!(h100, h200);
        assert_eq!(surface.count("create_image"), 2);
        assert_eq!(image.cached_zooms().len(), 2);
    }

    #[test]
    fn test_plain_data_rescaled_for_other_zooms() {
        let (device, surface) = device_at(100);
        let image = Image::from_data(&device, red_pixels(10, 4)).unwrap();
        image.handle(150).unwrap();
        let stored = surface.image_data_for_last_created().unwrap();
        assert_eq!((stored.width, stored.height), (15, 6));
        let _ = device;
    }

    #[test]
    fn test_bounds_are_zoom_independent() {
        let (device, _surface) = device_at(200);
        let image = Image::new(&device, 10, 8).unwrap();
        assert_eq!(image.bounds().unwrap(), Rectangle::new(0, 0, 10, 8));
        device.set_zoom(100);
        assert_eq!(image.bounds().unwrap(), Rectangle::new(0, 0, 10, 8));
    }

    #[test]
    fn test_prune_keeps_only_live_zooms() {
        let (device, surface) = device_at(100);
        let image = Image::from_data(&device, red_pixels(4, 4)).unwrap();
        image.handle(100).unwrap();
        image.handle(150).unwrap();
        image.handle(200).unwrap();
        device.prune_zoom_levels(&[100, 200]);
        assert_eq!(image.cached_zooms(), vec![100, 200]);
        assert_eq!(surface.live_image_count(), 2);
    }

    #[test]
    fn test_prune_spares_gc_target_zoom() {
        let (device, _surface) = device_at(100);
        let image = Image::new(&device, 8, 8).unwrap();
        device.set_zoom(150);
        let mut gc = crate::gc::Gc::on_image(&image).unwrap();
        let bound = image.handle(150).unwrap();
        device.prune_zoom_levels(&[200]);
        // the zoom the open context draws into survives pruning
        assert_eq!(image.cached_zooms(), vec![150]);
        assert_eq!(image.handle(150).unwrap(), bound);
        gc.dispose();
        device.prune_zoom_levels(&[200]);
        assert_eq!(image.cached_zooms(), Vec::<u32>::new());
        image.dispose();
    }

    #[test]
    fn test_prune_spares_construction_zoom() {
        let (device, _surface) = device_at(100);
        let image = Image::from_data(&device, red_pixels(4, 4)).unwrap();
        let base = image.handle(100).unwrap();
        image.handle(150).unwrap();
        device.prune_zoom_levels(&[200]);
        assert_eq!(image.cached_zooms(), vec![100]);
        assert_eq!(image.handle(100).unwrap(), base);
        image.dispose();
    }

    #[test]
    fn test_destroy_handles_except_regenerates_evicted_zooms() {
        let (device, _surface) = device_at(100);
        let image = Image::from_data(&device, red_pixels(4, 4)).unwrap();
        let kept = image.handle(100).unwrap();
        let old = image.handle(150).unwrap();
        image.handle(200).unwrap();
        image.destroy_handles_except(&[100]);
        assert_eq!(image.cached_zooms(), vec![100]);
        assert_eq!(image.handle(100).unwrap(), kept);
        assert_ne!(image.handle(150).unwrap(), old);
        image.dispose();
    }

    #[test]
    fn test_kind_and_style_participate_in_equality() {
        let (device, _surface) = device_at(100);
        let bitmap = Image::from_data(&device, red_pixels(2, 2)).unwrap();
        assert_eq!(bitmap.kind(), ImageKind::Bitmap);
        let mask = ImageData::new(2, 2, 1, data::bw_palette()).unwrap();
        let icon = Image::from_data_with_mask(&device, red_pixels(2, 2), &mask).unwrap();
        assert_eq!(icon.kind(), ImageKind::Icon);
        assert_ne!(icon, bitmap);
        let gray = Image::derived(&device, &bitmap, DeriveStyle::Gray).unwrap();
        assert_eq!(gray.derive_style(), DeriveStyle::Gray);
        assert_ne!(gray, bitmap);
        assert_eq!(gray, gray.clone());
    }

    #[test]
    fn test_dispose_destroys_all_handles() {
        let (device, surface) = device_at(100);
        let image = Image::from_data(&device, red_pixels(4, 4)).unwrap();
        image.handle(100).unwrap();
        image.handle(200).unwrap();
        image.dispose();
        assert!(image.is_disposed());
        assert_eq!(surface.live_image_count(), 0);
        assert!(image.handle(100).is_err());
        // idempotent
        image.dispose();
    }

    #[test]
    fn test_derived_gray_indexed_palette_grayed_in_place() {
        let (device, _surface) = device_at(100);
        let palette = PaletteData::Indexed(vec![Rgb::new(200, 100, 40), Rgb::new(0, 0, 255)]);
        let data = ImageData::new(2, 2, 8, palette).unwrap();
        let source = Image::from_data(&device, data).unwrap();
        let gray = Image::derived(&device, &source, DeriveStyle::Gray).unwrap();
        let out = gray.image_data(100).unwrap();
        let colors = out.palette.colors().unwrap();
        let g0 = (200u32 * 2 + 100 * 5 + 40) >> 3;
        assert_eq!(colors[0], Rgb::new(g0 as u8, g0 as u8, g0 as u8));
        let g1 = (255u32) >> 3;
        assert_eq!(colors[1], Rgb::new(g1 as u8, g1 as u8, g1 as u8));
    }

    #[test]
    fn test_gray_direct_reserves_transparent_sentinel() {
        let mut data = red_pixels(2, 1);
        data.transparent_pixel = 0xFF0000;
        let gray = to_gray(&data).unwrap();
        assert_eq!(gray.depth, 8);
        assert_eq!(gray.transparent_pixel, 254);
        assert_eq!(gray.get_pixel(0, 0).unwrap(), 254);
    }

    #[test]
    fn test_disable_splits_on_intensity() {
        let (device, _surface) = device_at(100);
        let mut data = ImageData::blank(2, 1);
        data.set_pixel(0, 0, 0x202020).unwrap();
        data.set_pixel(1, 0, 0xF0F0F0).unwrap();
        let disabled = to_disabled(&device, &data).unwrap();
        assert_eq!(disabled.get_pixel(0, 0).unwrap(), 1);
        assert_eq!(disabled.get_pixel(1, 0).unwrap(), 2);
        let colors = disabled.palette.colors().unwrap();
        assert_eq!(colors[0], Rgb::new(0, 0, 0));
        assert_eq!(colors[1], device.system_color(SystemColor::WidgetNormalShadow));
    }

    #[test]
    fn test_apply_mask_grows_indexed_palette() {
        let palette = PaletteData::Indexed(vec![Rgb::new(255, 255, 255)]);
        let mut data = ImageData::new(2, 1, 8, palette).unwrap();
        let mut mask = ImageData::new(2, 1, 1, data::bw_palette()).unwrap();
        mask.set_pixel(1, 0, 1).unwrap();
        apply_mask(&mut data, &mask).unwrap();
        // black grown at index 1, substituted where the mask is clear
        assert_eq!(data.get_pixel(0, 0).unwrap(), 1);
        assert_eq!(data.get_pixel(1, 0).unwrap(), 0);
        assert_eq!(data.palette.colors().unwrap()[1], Rgb::new(0, 0, 0));
        assert!(data.mask_data.is_some());
    }

    #[test]
    fn test_apply_mask_dropped_when_palette_full() {
        let colors: Vec<Rgb> = (1..=2).map(|v| Rgb::new(v, v, v)).collect();
        let palette = PaletteData::Indexed(colors);
        let mut data = ImageData::new(2, 1, 1, palette).unwrap();
        let mask = ImageData::new(2, 1, 1, data::bw_palette()).unwrap();
        apply_mask(&mut data, &mask).unwrap();
        assert!(data.mask_data.is_none());
        assert_eq!(data.palette.colors().unwrap().len(), 2);
    }

    #[test]
    fn test_images_sharing_provider_compare_equal() {
        let (device, _surface) = device_at(100);
        let image = Image::from_data(&device, red_pixels(2, 2)).unwrap();
        let alias = image.clone();
        let other = Image::from_data(&device, red_pixels(2, 2)).unwrap();
        assert_eq!(image, alias);
        assert_ne!(image, other);
    }
}
