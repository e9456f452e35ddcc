//! Fonts
//!
//! A native font handle bakes in a pixel height, so a font is only correct
//! for the zoom it was rasterized at. Rather than mutating a font when the
//! zoom changes, handles are interned in the device cache keyed by
//! (FontData, zoom) and re-derived per surface zoom. Like colors, disposal
//! is advisory and never invalidates the font.

use slate_bridge::FontSpec;
use slate_core::Result;

use crate::backend::BackendHandle;
use crate::device::Device;

/// Portable font description: face name, height in points, style.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontData {
    pub name: String,
    pub height: i32,
    pub bold: bool,
    pub italic: bool,
}

impl FontData {
    pub fn new(name: impl Into<String>, height: i32) -> Self {
        Self {
            name: name.into(),
            height,
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub(crate) fn to_spec(&self, zoom: u32) -> FontSpec {
        FontSpec {
            name: self.name.clone(),
            height: self.height as f32,
            bold: self.bold,
            italic: self.italic,
            zoom,
        }
    }
}

/// A font bound to the resolution context it was created for.
#[derive(Clone)]
pub struct Font {
    device: Device,
    data: FontData,
    zoom: u32,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("data", &self.data)
            .field("zoom", &self.zoom)
            .finish()
    }
}

impl Font {
    /// Creates a font at the device's current zoom.
    pub fn new(device: &Device, data: FontData) -> Self {
        let zoom = device.zoom();
        Self {
            device: device.clone(),
            data,
            zoom,
        }
    }

    pub fn font_data(&self) -> &FontData {
        &self.data
    }

    /// The zoom this font's metrics are valid for.
    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Interned native handle at this font's own zoom.
    pub fn handle(&self) -> Result<BackendHandle> {
        self.device.font_handle(&self.data, self.zoom)
    }

    /// Interned native handle re-derived for a different surface zoom.
    pub(crate) fn handle_for_zoom(&self, zoom: u32) -> Result<BackendHandle> {
        self.device.font_handle(&self.data, zoom)
    }

    pub(crate) fn spec_for_zoom(&self, zoom: u32) -> FontSpec {
        self.data.to_spec(zoom)
    }

    /// Advisory only: fonts stay usable after disposal.
    pub fn dispose(&self) {}

    /// Always false; see [`Font::dispose`].
    pub fn is_disposed(&self) -> bool {
        false
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.zoom == other.zoom
    }
}

impl Eq for Font {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, RecordingSurface};
    use std::rc::Rc;

    #[test]
    fn test_font_carries_creation_zoom() {
        let device = Device::new(BackendKind::Native(Rc::new(RecordingSurface::new())), 150);
        let font = Font::new(&device, FontData::new("Sans", 12));
        assert_eq!(font.zoom(), 150);
        device.set_zoom(200);
        // existing font keeps its rasterization context
        assert_eq!(font.zoom(), 150);
    }

    #[test]
    fn test_same_data_shares_handle() {
        let device = Device::new(BackendKind::Native(Rc::new(RecordingSurface::new())), 100);
        let a = Font::new(&device, FontData::new("Sans", 12));
        let b = Font::new(&device, FontData::new("Sans", 12));
        assert_eq!(a.handle().unwrap(), b.handle().unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_dispose_is_advisory() {
        let device = Device::new(BackendKind::Native(Rc::new(RecordingSurface::new())), 100);
        let font = Font::new(&device, FontData::new("Sans", 12).bold());
        font.dispose();
        assert!(!font.is_disposed());
        assert!(font.handle().is_ok());
    }
}
