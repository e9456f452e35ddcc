//! Patterns
//!
//! A pattern is a fill description: a two-stop linear gradient or a tiled
//! image. Patterns carry no pixel state of their own; they resolve to a
//! brush spec at a concrete zoom when the GC flushes.

use std::rc::Rc;

use slate_bridge::BrushSpec;
use slate_core::geometry::Rgba;
use slate_core::scale::scale_up;
use slate_core::Result;

use crate::color::Color;
use crate::device::Device;
use crate::image::Image;
use crate::resource::ResourceState;

enum PatternKind {
    LinearGradient {
        from: (i32, i32),
        to: (i32, i32),
        start: Rgba,
        end: Rgba,
    },
    Image(Image),
}

struct PatternInner {
    state: ResourceState,
    kind: PatternKind,
}

/// A fill pattern. Cloning shares the underlying description.
#[derive(Clone)]
pub struct Pattern {
    inner: Rc<PatternInner>,
}

impl Pattern {
    /// Linear gradient from `start` at `(x1, y1)` to `end` at `(x2, y2)`,
    /// in logical coordinates.
    pub fn linear_gradient(
        device: &Device,
        x1: i32,
        y1: i32,
        start: Color,
        x2: i32,
        y2: i32,
        end: Color,
    ) -> Self {
        Self {
            inner: Rc::new(PatternInner {
                state: ResourceState::new(device, "pattern"),
                kind: PatternKind::LinearGradient {
                    from: (x1, y1),
                    to: (x2, y2),
                    start: start.rgba(),
                    end: end.rgba(),
                },
            }),
        }
    }

    /// Tiling pattern over `image`. The image must outlive the pattern's use.
    pub fn from_image(device: &Device, image: Image) -> Self {
        Self {
            inner: Rc::new(PatternInner {
                state: ResourceState::new(device, "pattern"),
                kind: PatternKind::Image(image),
            }),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.is_disposed()
    }

    /// Brush description at `zoom`, with gradient geometry scaled to pixels
    /// and the image handle materialized for that zoom.
    pub(crate) fn brush_spec(&self, zoom: u32) -> Result<BrushSpec> {
        self.inner.state.check_disposed()?;
        match &self.inner.kind {
            PatternKind::LinearGradient {
                from,
                to,
                start,
                end,
            } => Ok(BrushSpec::LinearGradient {
                from: (scale_up(from.0, zoom), scale_up(from.1, zoom)),
                to: (scale_up(to.0, zoom), scale_up(to.1, zoom)),
                start: *start,
                end: *end,
            }),
            PatternKind::Image(image) => Ok(BrushSpec::Image {
                handle: image.handle(zoom)?,
            }),
        }
    }

    pub fn dispose(&self) {
        self.inner.state.mark_disposed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, RecordingSurface};
    use crate::image::ImageData;
    use slate_core::GraphicsError;

    fn device() -> Device {
        Device::new(BackendKind::Native(Rc::new(RecordingSurface::new())), 100)
    }

    #[test]
    fn test_gradient_geometry_scales_with_zoom() {
        let device = device();
        let start = Color::new(255, 0, 0).unwrap();
        let end = Color::new(0, 0, 255).unwrap();
        let pattern = Pattern::linear_gradient(&device, 0, 0, start, 10, 20, end);
        match pattern.brush_spec(150).unwrap() {
            BrushSpec::LinearGradient { from, to, .. } => {
                assert_eq!(from, (0, 0));
                assert_eq!(to, (15, 30));
            }
            other => panic!("unexpected brush: {other:?}"),
        }
        pattern.dispose();
    }

    #[test]
    fn test_image_pattern_uses_zoom_handle() {
        let device = device();
        let image = Image::from_data(&device, ImageData::blank(4, 4)).unwrap();
        let pattern = Pattern::from_image(&device, image.clone());
        let spec_100 = pattern.brush_spec(100).unwrap();
        let spec_200 = pattern.brush_spec(200).unwrap();
        assert_ne!(spec_100, spec_200);
        assert_eq!(
            spec_100,
            BrushSpec::Image {
                handle: image.handle(100).unwrap()
            }
        );
        pattern.dispose();
        image.dispose();
    }

    #[test]
    fn test_disposed_pattern_rejected_at_flush() {
        let device = device();
        let start = Color::new(0, 0, 0).unwrap();
        let pattern = Pattern::linear_gradient(&device, 0, 0, start, 1, 1, start);
        pattern.dispose();
        assert!(pattern.is_disposed());
        assert_eq!(
            pattern.brush_spec(100).unwrap_err(),
            GraphicsError::Disposed
        );
    }
}
