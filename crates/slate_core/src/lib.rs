//! Slate core
//!
//! Shared foundation for the Slate graphics subsystem:
//! - Geometry value types (points, rectangles, colors-as-values, path data)
//! - Logical/physical coordinate scaling for display zoom levels
//! - The generic zoom-indexed resource variant cache
//! - The graphics error taxonomy

pub mod error;
pub mod geometry;
pub mod scale;
pub mod zoom_cache;

pub use error::{GraphicsError, Result};
pub use geometry::{LineAttributes, PathData, PathOp, Point, Rectangle, Rgb, Rgba};
pub use zoom_cache::ZoomCache;
