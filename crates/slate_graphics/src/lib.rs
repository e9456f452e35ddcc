//! Slate graphics
//!
//! Resolution-aware 2D graphics resources over a swappable backend:
//!
//! - A [`Device`] owning the backend choice (native surface or serialized
//!   bridge), display zoom, and resource bookkeeping
//! - Drawing resources: [`Color`], [`Font`], [`Image`], [`Path`],
//!   [`Pattern`], [`Region`], [`Transform`]
//! - The [`Gc`] graphics context with dirty-bit state batching
//! - [`TextLayout`] for line breaking and measurement
//!
//! All public APIs take logical coordinates; conversion to physical pixels
//! happens once, at the backend boundary, per the device zoom.

pub mod backend;
pub mod color;
pub mod device;
pub mod font;
pub mod gc;
pub mod image;
pub mod path;
pub mod pattern;
pub mod region;
mod resource;
pub mod text_layout;
pub mod transform;

pub use backend::{BackendKind, NativeSurface, RecordingSurface};
pub use color::Color;
pub use device::{Device, SystemColor};
pub use font::{Font, FontData};
pub use gc::Gc;
pub use image::{DeriveStyle, Image, ImageData, ImageKind, PaletteData};
pub use path::Path;
pub use pattern::Pattern;
pub use region::Region;
pub use text_layout::TextLayout;
pub use transform::Transform;

pub use slate_core::{GraphicsError, Result};
