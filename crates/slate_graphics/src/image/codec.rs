//! File decoding into [`ImageData`]
//!
//! Gated behind the `codec` feature; without it every load reports
//! [`GraphicsError::UnsupportedFormat`].

use std::path::Path;

use slate_core::{GraphicsError, Result};

use super::data::ImageData;

#[cfg(feature = "codec")]
pub fn load_file(path: &Path) -> Result<ImageData> {
    let dynamic = image::open(path).map_err(|err| match err {
        image::ImageError::IoError(io) => GraphicsError::Io(io.to_string()),
        other => {
            tracing::debug!(path = %path.display(), error = %other, "image decode failed");
            GraphicsError::UnsupportedFormat
        }
    })?;
    Ok(from_rgba(&dynamic.to_rgba8()))
}

#[cfg(feature = "codec")]
fn from_rgba(rgba: &image::RgbaImage) -> ImageData {
    use super::data::PaletteData;

    let width = rgba.width() as i32;
    let height = rgba.height() as i32;
    let mut data = ImageData::blank(width, height);
    let mut alpha = vec![255u8; (width * height) as usize];
    let mut opaque = true;
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let pixel = (r as u32) << 16 | (g as u32) << 8 | b as u32;
        // blank() is always large enough for its own extent
        let _ = data.set_pixel(x as i32, y as i32, pixel);
        alpha[(y as i32 * width + x as i32) as usize] = a;
        opaque &= a == 255;
    }
    data.palette = PaletteData::direct_rgb24();
    if !opaque {
        data.alpha_data = Some(alpha);
    }
    data
}

#[cfg(feature = "codec")]
pub fn load_bytes(bytes: &[u8]) -> Result<ImageData> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| {
        tracing::debug!(error = %err, "image decode failed");
        GraphicsError::UnsupportedFormat
    })?;
    Ok(from_rgba(&dynamic.to_rgba8()))
}

#[cfg(not(feature = "codec"))]
pub fn load_file(path: &Path) -> Result<ImageData> {
    let _ = path;
    Err(GraphicsError::UnsupportedFormat)
}

#[cfg(not(feature = "codec"))]
pub fn load_bytes(bytes: &[u8]) -> Result<ImageData> {
    let _ = bytes;
    Err(GraphicsError::UnsupportedFormat)
}

#[cfg(all(test, feature = "codec"))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_file(Path::new("/nonexistent/image.png")).unwrap_err();
        assert!(matches!(err, GraphicsError::Io(_)));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = load_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, GraphicsError::UnsupportedFormat));
    }
}
