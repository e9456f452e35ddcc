//! Color
//!
//! A color is a packed 0xBBGGRR native value plus an out-of-band alpha; the
//! native palette format has no alpha channel of its own. Colors are
//! immutable, compare structurally, and — as a long-standing compatibility
//! contract — disposing one is a successful no-op that never invalidates it.

use slate_core::geometry::{Rgb, Rgba};
use slate_core::{GraphicsError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl Color {
    /// Constructs an opaque color. Components outside 0..=255 are rejected.
    pub fn new(red: i32, green: i32, blue: i32) -> Result<Self> {
        Self::with_alpha(red, green, blue, 255)
    }

    pub fn with_alpha(red: i32, green: i32, blue: i32, alpha: i32) -> Result<Self> {
        let component = |v: i32| -> Result<u8> {
            u8::try_from(v).map_err(|_| GraphicsError::InvalidArgument("color component out of range"))
        };
        Ok(Self {
            red: component(red)?,
            green: component(green)?,
            blue: component(blue)?,
            alpha: component(alpha)?,
        })
    }

    pub fn from_rgb(rgb: Rgb) -> Self {
        Self {
            red: rgb.red,
            green: rgb.green,
            blue: rgb.blue,
            alpha: 255,
        }
    }

    pub fn from_rgba(rgba: Rgba) -> Self {
        Self {
            red: rgba.rgb.red,
            green: rgba.rgb.green,
            blue: rgba.rgb.blue,
            alpha: rgba.alpha,
        }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.red, self.green, self.blue)
    }

    pub fn rgba(&self) -> Rgba {
        Rgba::new(self.red, self.green, self.blue, self.alpha)
    }

    /// The packed 0xBBGGRR native value. Alpha is not part of the handle.
    pub fn handle(&self) -> u32 {
        (self.blue as u32) << 16 | (self.green as u32) << 8 | self.red as u32
    }

    /// Advisory only: colors stay usable after disposal.
    pub fn dispose(&self) {}

    /// Always false; see [`Color::dispose`].
    pub fn is_disposed(&self) -> bool {
        false
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::from_rgb(rgb)
    }
}

impl From<Rgba> for Color {
    fn from(rgba: Rgba) -> Self {
        Color::from_rgba(rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_round_trip() {
        for &(r, g, b, a) in &[(0, 0, 0, 0), (255, 255, 255, 255), (10, 20, 30, 40)] {
            let c = Color::with_alpha(r, g, b, a).unwrap();
            assert_eq!(c.red() as i32, r);
            assert_eq!(c.green() as i32, g);
            assert_eq!(c.blue() as i32, b);
            assert_eq!(c.alpha() as i32, a);
        }
    }

    #[test]
    fn test_out_of_range_components_rejected() {
        assert!(Color::new(-1, 0, 0).is_err());
        assert!(Color::new(0, 256, 0).is_err());
        assert!(Color::with_alpha(0, 0, 0, 300).is_err());
    }

    #[test]
    fn test_handle_packs_bbggrr() {
        let c = Color::new(0x11, 0x22, 0x33).unwrap();
        assert_eq!(c.handle(), 0x33_22_11);
    }

    #[test]
    fn test_structural_equality_includes_alpha() {
        let a = Color::with_alpha(1, 2, 3, 255).unwrap();
        let b = Color::with_alpha(1, 2, 3, 255).unwrap();
        let c = Color::with_alpha(1, 2, 3, 128).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_dispose_is_advisory() {
        // Scenario: construct, read, dispose, read again.
        let c = Color::new(10, 20, 30).unwrap();
        assert_eq!(c.rgb(), Rgb::new(10, 20, 30));
        assert_eq!(c.alpha(), 255);
        c.dispose();
        assert!(!c.is_disposed());
        assert_eq!(c.red(), 10);
    }
}
