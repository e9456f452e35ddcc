//! Portable image data
//!
//! A decoded pixel buffer plus palette and transparency info, independent of
//! any native handle. This is the only representation the subsystem exchanges
//! with image decoders and providers.

use slate_core::geometry::Rgb;
use slate_core::{GraphicsError, Result};

/// Color organization of an [`ImageData`] buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum PaletteData {
    /// Pixel values encode components through masks and shifts.
    Direct {
        red_mask: u32,
        green_mask: u32,
        blue_mask: u32,
        red_shift: i8,
        green_shift: i8,
        blue_shift: i8,
    },
    /// Pixel values index into an RGB table.
    Indexed(Vec<Rgb>),
}

/// Shift that moves a masked component into the 0..=255 range: negative
/// means shift right.
fn shift_for_mask(mask: u32) -> i8 {
    if mask == 0 {
        return 0;
    }
    7 - (31 - mask.leading_zeros() as i8)
}

fn apply_shift(value: u32, shift: i8) -> u32 {
    if shift < 0 {
        value >> (-shift) as u32
    } else {
        value << shift as u32
    }
}

fn unapply_shift(value: u32, shift: i8) -> u32 {
    if shift < 0 {
        value << (-shift) as u32
    } else {
        value >> shift as u32
    }
}

impl PaletteData {
    pub fn direct(red_mask: u32, green_mask: u32, blue_mask: u32) -> Self {
        PaletteData::Direct {
            red_mask,
            green_mask,
            blue_mask,
            red_shift: shift_for_mask(red_mask),
            green_shift: shift_for_mask(green_mask),
            blue_shift: shift_for_mask(blue_mask),
        }
    }

    /// The standard 24-bit 0xRRGGBB layout.
    pub fn direct_rgb24() -> Self {
        Self::direct(0xFF0000, 0x00FF00, 0x0000FF)
    }

    pub fn indexed(colors: Vec<Rgb>) -> Self {
        PaletteData::Indexed(colors)
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, PaletteData::Direct { .. })
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        match self {
            PaletteData::Indexed(colors) => Some(colors),
            PaletteData::Direct { .. } => None,
        }
    }

    /// Decodes a pixel value to RGB.
    pub fn rgb_for(&self, pixel: u32) -> Result<Rgb> {
        match self {
            PaletteData::Direct {
                red_mask,
                green_mask,
                blue_mask,
                red_shift,
                green_shift,
                blue_shift,
            } => Ok(Rgb::new(
                apply_shift(pixel & red_mask, *red_shift) as u8,
                apply_shift(pixel & green_mask, *green_shift) as u8,
                apply_shift(pixel & blue_mask, *blue_shift) as u8,
            )),
            PaletteData::Indexed(colors) => colors
                .get(pixel as usize)
                .copied()
                .ok_or(GraphicsError::InvalidArgument("pixel outside palette")),
        }
    }

    /// Encodes RGB to a pixel value. Indexed palettes require an exact entry.
    pub fn pixel_for(&self, rgb: Rgb) -> Result<u32> {
        match self {
            PaletteData::Direct {
                red_mask,
                green_mask,
                blue_mask,
                red_shift,
                green_shift,
                blue_shift,
            } => Ok((unapply_shift(rgb.red as u32, *red_shift) & red_mask)
                | (unapply_shift(rgb.green as u32, *green_shift) & green_mask)
                | (unapply_shift(rgb.blue as u32, *blue_shift) & blue_mask)),
            PaletteData::Indexed(colors) => colors
                .iter()
                .position(|c| *c == rgb)
                .map(|i| i as u32)
                .ok_or(GraphicsError::InvalidArgument("color not in palette")),
        }
    }
}

/// Default scanline padding in bytes.
const DEFAULT_SCANLINE_PAD: i32 = 4;

fn bytes_per_line(width: i32, depth: u8, pad: i32) -> i32 {
    let bits = depth as i32 * width;
    let bytes = (bits + 7) / 8;
    (bytes + pad - 1) / pad * pad
}

/// Decoded pixel buffer with palette and transparency information.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: i32,
    pub height: i32,
    pub depth: u8,
    pub scanline_pad: i32,
    pub bytes_per_line: i32,
    pub data: Vec<u8>,
    pub palette: PaletteData,
    /// Palette index treated as transparent, or -1.
    pub transparent_pixel: i32,
    /// Global alpha 0-255, or -1 when per-pixel/absent.
    pub alpha: i32,
    pub alpha_data: Option<Vec<u8>>,
    pub mask_data: Option<Vec<u8>>,
    pub mask_pad: i32,
}

impl ImageData {
    pub fn new(width: i32, height: i32, depth: u8, palette: PaletteData) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(GraphicsError::InvalidArgument(
                "image dimensions must be positive",
            ));
        }
        match depth {
            1 | 2 | 4 | 8 | 16 | 24 | 32 => {}
            _ => return Err(GraphicsError::UnsupportedDepth),
        }
        let bpl = bytes_per_line(width, depth, DEFAULT_SCANLINE_PAD);
        Ok(Self {
            width,
            height,
            depth,
            scanline_pad: DEFAULT_SCANLINE_PAD,
            bytes_per_line: bpl,
            data: vec![0; (bpl * height) as usize],
            palette,
            transparent_pixel: -1,
            alpha: -1,
            alpha_data: None,
            mask_data: None,
            mask_pad: 0,
        })
    }

    /// Zeroed 24-bit direct-palette buffer. Degenerate sizes clamp to 1x1.
    pub fn blank(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let bpl = bytes_per_line(width, 24, DEFAULT_SCANLINE_PAD);
        Self {
            width,
            height,
            depth: 24,
            scanline_pad: DEFAULT_SCANLINE_PAD,
            bytes_per_line: bpl,
            data: vec![0; (bpl * height) as usize],
            palette: PaletteData::direct_rgb24(),
            transparent_pixel: -1,
            alpha: -1,
            alpha_data: None,
            mask_data: None,
            mask_pad: 0,
        }
    }

    fn check_bounds(&self, x: i32, y: i32) -> Result<()> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return Err(GraphicsError::InvalidArgument("coordinate outside image"));
        }
        Ok(())
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Result<u32> {
        self.check_bounds(x, y)?;
        let row = (y * self.bytes_per_line) as usize;
        let d = &self.data;
        Ok(match self.depth {
            32 => {
                let i = row + (x as usize) * 4;
                (d[i] as u32) << 24 | (d[i + 1] as u32) << 16 | (d[i + 2] as u32) << 8
                    | d[i + 3] as u32
            }
            24 => {
                let i = row + (x as usize) * 3;
                (d[i] as u32) << 16 | (d[i + 1] as u32) << 8 | d[i + 2] as u32
            }
            16 => {
                let i = row + (x as usize) * 2;
                (d[i + 1] as u32) << 8 | d[i] as u32
            }
            8 => d[row + x as usize] as u32,
            4 => {
                let byte = d[row + (x as usize >> 1)];
                if x & 1 == 0 {
                    (byte >> 4) as u32
                } else {
                    (byte & 0x0F) as u32
                }
            }
            2 => {
                let byte = d[row + (x as usize >> 2)];
                let shift = 6 - 2 * (x & 3);
                ((byte >> shift) & 0x3) as u32
            }
            1 => {
                let byte = d[row + (x as usize >> 3)];
                let bit = 7 - (x & 7);
                ((byte >> bit) & 0x1) as u32
            }
            _ => return Err(GraphicsError::UnsupportedDepth),
        })
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, value: u32) -> Result<()> {
        self.check_bounds(x, y)?;
        let row = (y * self.bytes_per_line) as usize;
        let depth = self.depth;
        let d = &mut self.data;
        match depth {
            32 => {
                let i = row + (x as usize) * 4;
                d[i] = (value >> 24) as u8;
                d[i + 1] = (value >> 16) as u8;
                d[i + 2] = (value >> 8) as u8;
                d[i + 3] = value as u8;
            }
            24 => {
                let i = row + (x as usize) * 3;
                d[i] = (value >> 16) as u8;
                d[i + 1] = (value >> 8) as u8;
                d[i + 2] = value as u8;
            }
            16 => {
                let i = row + (x as usize) * 2;
                d[i] = value as u8;
                d[i + 1] = (value >> 8) as u8;
            }
            8 => d[row + x as usize] = value as u8,
            4 => {
                let i = row + (x as usize >> 1);
                if x & 1 == 0 {
                    d[i] = (d[i] & 0x0F) | ((value as u8 & 0x0F) << 4);
                } else {
                    d[i] = (d[i] & 0xF0) | (value as u8 & 0x0F);
                }
            }
            2 => {
                let i = row + (x as usize >> 2);
                let shift = 6 - 2 * (x & 3);
                d[i] = (d[i] & !(0x3 << shift)) | (((value as u8) & 0x3) << shift);
            }
            1 => {
                let i = row + (x as usize >> 3);
                let bit = 7 - (x & 7);
                if value & 1 != 0 {
                    d[i] |= 1 << bit;
                } else {
                    d[i] &= !(1 << bit);
                }
            }
            _ => return Err(GraphicsError::UnsupportedDepth),
        }
        Ok(())
    }

    pub fn get_row(&self, y: i32) -> Result<Vec<u32>> {
        (0..self.width).map(|x| self.get_pixel(x, y)).collect()
    }

    /// RGB of a pixel through this buffer's palette.
    pub fn rgb_at(&self, x: i32, y: i32) -> Result<Rgb> {
        self.palette.rgb_for(self.get_pixel(x, y)?)
    }

    /// 1-bit transparency mask: 1 = visible, 0 = transparent.
    pub fn transparency_mask(&self) -> Result<ImageData> {
        let mut mask = ImageData::new(self.width, self.height, 1, bw_palette())?;
        if let Some(bytes) = &self.mask_data {
            let pad = if self.mask_pad > 0 {
                self.mask_pad
            } else {
                DEFAULT_SCANLINE_PAD
            };
            let src_bpl = bytes_per_line(self.width, 1, pad);
            for y in 0..self.height {
                for x in 0..self.width {
                    let i = (y * src_bpl) as usize + (x as usize >> 3);
                    let bit = 7 - (x & 7);
                    let visible = bytes
                        .get(i)
                        .map(|b| (b >> bit) & 1 != 0)
                        .unwrap_or(false);
                    mask.set_pixel(x, y, visible as u32)?;
                }
            }
        } else if self.transparent_pixel >= 0 {
            for y in 0..self.height {
                for x in 0..self.width {
                    let visible = self.get_pixel(x, y)? != self.transparent_pixel as u32;
                    mask.set_pixel(x, y, visible as u32)?;
                }
            }
        } else if let Some(alpha) = &self.alpha_data {
            for y in 0..self.height {
                for x in 0..self.width {
                    let a = alpha[(y * self.width + x) as usize];
                    mask.set_pixel(x, y, (a != 0) as u32)?;
                }
            }
        } else {
            for y in 0..self.height {
                for x in 0..self.width {
                    mask.set_pixel(x, y, 1)?;
                }
            }
        }
        Ok(mask)
    }

    /// Normalizes arbitrary-depth mask data to 1-bit (nonzero = visible).
    pub fn convert_mask(mask: &ImageData) -> Result<ImageData> {
        if mask.depth == 1 {
            return Ok(mask.clone());
        }
        let mut out = ImageData::new(mask.width, mask.height, 1, bw_palette())?;
        for y in 0..mask.height {
            for x in 0..mask.width {
                out.set_pixel(x, y, (mask.get_pixel(x, y)? != 0) as u32)?;
            }
        }
        Ok(out)
    }

    /// Nearest-neighbor rescale preserving depth, palette, and transparency.
    pub fn scaled_to(&self, width: i32, height: i32) -> Result<ImageData> {
        if width <= 0 || height <= 0 {
            return Err(GraphicsError::InvalidArgument(
                "scaled dimensions must be positive",
            ));
        }
        let mut out = ImageData::new(width, height, self.depth, self.palette.clone())?;
        out.transparent_pixel = self.transparent_pixel;
        out.alpha = self.alpha;
        let sample =
            |v: i32, out_extent: i32, src_extent: i32| (v as i64 * src_extent as i64 / out_extent as i64) as i32;
        for y in 0..height {
            let sy = sample(y, height, self.height);
            for x in 0..width {
                let sx = sample(x, width, self.width);
                out.set_pixel(x, y, self.get_pixel(sx, sy)?)?;
            }
        }
        if let Some(alpha) = &self.alpha_data {
            let mut scaled = vec![0u8; (width * height) as usize];
            for y in 0..height {
                let sy = sample(y, height, self.height);
                for x in 0..width {
                    let sx = sample(x, width, self.width);
                    scaled[(y * width + x) as usize] = alpha[(sy * self.width + sx) as usize];
                }
            }
            out.alpha_data = Some(scaled);
        }
        if self.mask_data.is_some() {
            let src_mask = self.transparency_mask()?;
            let scaled_mask = src_mask.scaled_to(width, height)?;
            out.mask_pad = scaled_mask.scanline_pad;
            out.mask_data = Some(scaled_mask.data);
        }
        Ok(out)
    }
}

/// Two-entry black/white palette used for 1-bit masks.
pub(crate) fn bw_palette() -> PaletteData {
    PaletteData::indexed(vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_palette_rgb_round_trip() {
        let palette = PaletteData::direct_rgb24();
        let rgb = Rgb::new(200, 100, 50);
        let pixel = palette.pixel_for(rgb).unwrap();
        assert_eq!(pixel, 0xC86432);
        assert_eq!(palette.rgb_for(pixel).unwrap(), rgb);
    }

    #[test]
    fn test_indexed_palette_lookup() {
        let palette = PaletteData::indexed(vec![Rgb::new(0, 0, 0), Rgb::new(255, 0, 0)]);
        assert_eq!(palette.pixel_for(Rgb::new(255, 0, 0)).unwrap(), 1);
        assert_eq!(palette.rgb_for(0).unwrap(), Rgb::new(0, 0, 0));
        assert!(palette.rgb_for(9).is_err());
        assert!(palette.pixel_for(Rgb::new(1, 2, 3)).is_err());
    }

    #[test]
    fn test_pixel_round_trip_across_depths() {
        for &depth in &[1u8, 2, 4, 8, 16, 24, 32] {
            let palette = if depth <= 8 {
                PaletteData::indexed(vec![Rgb::new(0, 0, 0); 1 << depth.min(8)])
            } else {
                PaletteData::direct_rgb24()
            };
            let mut data = ImageData::new(5, 3, depth, palette).unwrap();
            let max = if depth >= 32 { u32::MAX } else { (1u32 << depth) - 1 };
            data.set_pixel(3, 1, max).unwrap();
            data.set_pixel(4, 2, 1).unwrap();
            assert_eq!(data.get_pixel(3, 1).unwrap(), max, "depth {depth}");
            assert_eq!(data.get_pixel(4, 2).unwrap(), 1, "depth {depth}");
            assert_eq!(data.get_pixel(0, 0).unwrap(), 0, "depth {depth}");
        }
    }

    #[test]
    fn test_rejects_invalid_construction() {
        assert!(ImageData::new(0, 4, 8, bw_palette()).is_err());
        assert!(ImageData::new(4, -1, 8, bw_palette()).is_err());
        assert_eq!(
            ImageData::new(4, 4, 13, bw_palette()).unwrap_err(),
            GraphicsError::UnsupportedDepth
        );
    }

    #[test]
    fn test_out_of_bounds_pixel_access() {
        let data = ImageData::new(4, 4, 8, bw_palette()).unwrap();
        assert!(data.get_pixel(4, 0).is_err());
        assert!(data.get_pixel(0, -1).is_err());
    }

    #[test]
    fn test_transparency_mask_from_transparent_pixel() {
        let mut data = ImageData::new(2, 1, 8, bw_palette()).unwrap();
        data.transparent_pixel = 0;
        data.set_pixel(1, 0, 1).unwrap();
        let mask = data.transparency_mask().unwrap();
        assert_eq!(mask.get_pixel(0, 0).unwrap(), 0);
        assert_eq!(mask.get_pixel(1, 0).unwrap(), 1);
    }

    #[test]
    fn test_scaled_to_doubles_pixels() {
        let mut data = ImageData::new(2, 2, 24, PaletteData::direct_rgb24()).unwrap();
        data.set_pixel(1, 1, 0xFF0000).unwrap();
        let scaled = data.scaled_to(4, 4).unwrap();
        assert_eq!(scaled.get_pixel(0, 0).unwrap(), 0);
        assert_eq!(scaled.get_pixel(3, 3).unwrap(), 0xFF0000);
        assert_eq!(scaled.get_pixel(2, 2).unwrap(), 0xFF0000);
        assert_eq!(scaled.get_pixel(1, 1).unwrap(), 0);
    }
}
