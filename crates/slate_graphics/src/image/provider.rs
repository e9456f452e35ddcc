//! Image pixel sources
//!
//! A provider answers "give me pixels for zoom Z" and reports which zoom the
//! returned pixels were actually produced at. The caller rescales when those
//! differ; draw-callback output is used as-is.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use slate_core::scale::scale_up;
use slate_core::{GraphicsError, Result};

use super::data::ImageData;

/// Callback that paints image content at a given zoom. Receives a painting
/// context sized `width` x `height` in logical points.
pub trait ImageDrawer {
    fn draw(&self, gc: &mut crate::gc::Gc, width: i32, height: i32) -> Result<()>;
}

impl<F> ImageDrawer for F
where
    F: Fn(&mut crate::gc::Gc, i32, i32) -> Result<()>,
{
    fn draw(&self, gc: &mut crate::gc::Gc, width: i32, height: i32) -> Result<()> {
        self(gc, width, height)
    }
}

/// Maps a zoom percentage to a file path, e.g. `icon.png` / `icon@2x.png`.
pub trait FileForZoom {
    fn path_for(&self, zoom: u32) -> Option<PathBuf>;
}

impl<F> FileForZoom for F
where
    F: Fn(u32) -> Option<PathBuf>,
{
    fn path_for(&self, zoom: u32) -> Option<PathBuf> {
        self(zoom)
    }
}

/// Maps a zoom percentage to decoded pixels.
pub trait DataForZoom {
    fn data_for(&self, zoom: u32) -> Option<ImageData>;
}

impl<F> DataForZoom for F
where
    F: Fn(u32) -> Option<ImageData>,
{
    fn data_for(&self, zoom: u32) -> Option<ImageData> {
        self(zoom)
    }
}

fn next_provider_id() -> u64 {
    thread_local! {
        static NEXT: Cell<u64> = const { Cell::new(1) };
    }
    NEXT.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    })
}

/// Where an image's pixels come from.
pub(crate) enum ImageSource {
    /// One fixed buffer, stamped with the zoom it was captured at.
    Plain { data: ImageData, zoom: u32 },
    /// Per-zoom decoded buffers from the application.
    DataByZoom(Rc<dyn DataForZoom>),
    /// Per-zoom files decoded on demand.
    FileByZoom(Rc<dyn FileForZoom>),
    /// Application paints the content with a graphics context.
    Drawer {
        drawer: Rc<dyn ImageDrawer>,
        width: i32,
        height: i32,
    },
}

/// An image source plus the identity used for equality between images that
/// share a provider.
pub(crate) struct ImageProvider {
    pub(crate) id: u64,
    pub(crate) source: ImageSource,
}

impl ImageProvider {
    pub(crate) fn new(source: ImageSource) -> Self {
        Self {
            id: next_provider_id(),
            source,
        }
    }

    /// Logical size in points, independent of zoom. Zoom-dependent sources
    /// are measured at 100%.
    pub(crate) fn logical_size(&self) -> Result<(i32, i32)> {
        match &self.source {
            ImageSource::Plain { data, zoom } => {
                let w = (data.width as i64 * 100 / *zoom as i64) as i32;
                let h = (data.height as i64 * 100 / *zoom as i64) as i32;
                Ok((w.max(1), h.max(1)))
            }
            ImageSource::Drawer { width, height, .. } => Ok((*width, *height)),
            ImageSource::DataByZoom(source) => {
                let data = source
                    .data_for(100)
                    .ok_or(GraphicsError::InvalidImage)?;
                Ok((data.width, data.height))
            }
            ImageSource::FileByZoom(source) => {
                let data = decode_for(source.as_ref(), 100)?;
                Ok((data.width, data.height))
            }
        }
    }

    /// Pixels for `zoom`, together with the zoom they were produced at.
    /// Drawer sources are handled by the image cache itself and never
    /// answered here.
    pub(crate) fn data_for_zoom(&self, zoom: u32) -> Result<(ImageData, u32)> {
        match &self.source {
            ImageSource::Plain { data, zoom: produced } => Ok((data.clone(), *produced)),
            ImageSource::DataByZoom(source) => {
                if let Some(data) = source.data_for(zoom) {
                    return Ok((data, zoom));
                }
                // fall back to 100% and let the caller rescale
                source
                    .data_for(100)
                    .map(|data| (data, 100))
                    .ok_or(GraphicsError::InvalidImage)
            }
            ImageSource::FileByZoom(source) => {
                if source.path_for(zoom).is_some() {
                    return Ok((decode_for(source.as_ref(), zoom)?, zoom));
                }
                Ok((decode_for(source.as_ref(), 100)?, 100))
            }
            ImageSource::Drawer { .. } => Err(GraphicsError::InvalidImage),
        }
    }

    pub(crate) fn drawer(&self) -> Option<(Rc<dyn ImageDrawer>, i32, i32)> {
        match &self.source {
            ImageSource::Drawer {
                drawer,
                width,
                height,
            } => Some((Rc::clone(drawer), *width, *height)),
            _ => None,
        }
    }
}

/// Scaled pixel extent of a drawer-backed image at `zoom`.
pub(crate) fn drawer_extent(width: i32, height: i32, zoom: u32) -> (i32, i32) {
    (scale_up(width, zoom), scale_up(height, zoom))
}

fn decode_for(source: &dyn FileForZoom, zoom: u32) -> Result<ImageData> {
    let path = source.path_for(zoom).ok_or(GraphicsError::InvalidImage)?;
    super::codec::load_file(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::geometry::Rgb;
    use crate::image::data::PaletteData;

    fn pixels(w: i32, h: i32) -> ImageData {
        ImageData::new(w, h, 24, PaletteData::direct_rgb24()).unwrap()
    }

    #[test]
    fn test_plain_source_reports_produced_zoom() {
        let provider = ImageProvider::new(ImageSource::Plain {
            data: pixels(20, 10),
            zoom: 200,
        });
        let (data, produced) = provider.data_for_zoom(150).unwrap();
        assert_eq!(produced, 200);
        assert_eq!((data.width, data.height), (20, 10));
        assert_eq!(provider.logical_size().unwrap(), (10, 5));
    }

    #[test]
    fn test_data_by_zoom_falls_back_to_base() {
        let source = Rc::new(|zoom: u32| -> Option<ImageData> {
            match zoom {
                100 => Some(pixels(8, 8)),
                200 => Some(pixels(16, 16)),
                _ => None,
            }
        });
        let provider = ImageProvider::new(ImageSource::DataByZoom(source));
        let (data, produced) = provider.data_for_zoom(200).unwrap();
        assert_eq!((data.width, produced), (16, 200));
        let (data, produced) = provider.data_for_zoom(150).unwrap();
        assert_eq!((data.width, produced), (8, 100));
    }

    #[test]
    fn test_provider_ids_are_distinct() {
        let a = ImageProvider::new(ImageSource::Plain {
            data: pixels(1, 1),
            zoom: 100,
        });
        let b = ImageProvider::new(ImageSource::Plain {
            data: pixels(1, 1),
            zoom: 100,
        });
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_indexed_palette_survives_plain_round_trip() {
        let palette = PaletteData::indexed(vec![Rgb::new(0, 0, 0), Rgb::new(9, 9, 9)]);
        let data = ImageData::new(4, 4, 8, palette).unwrap();
        let provider = ImageProvider::new(ImageSource::Plain { data, zoom: 100 });
        let (out, _) = provider.data_for_zoom(100).unwrap();
        assert!(!out.palette.is_direct());
    }
}
