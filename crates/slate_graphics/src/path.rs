//! Paths
//!
//! A path accumulates segments in logical coordinates and replays them into a
//! backend handle per zoom level on demand. Quadratic segments are elevated
//! to cubics at build time, since native path objects only carry cubics.

use std::cell::RefCell;

use smallvec::SmallVec;

use slate_core::geometry::{PathData, PathOp, Rectangle};
use slate_core::scale::scale_up_f32;
use slate_core::zoom_cache::ZoomCache;
use slate_core::{GraphicsError, Result};

use crate::backend::BackendHandle;
use crate::device::Device;
use crate::resource::ResourceState;

/// A drawable path outline.
pub struct Path {
    state: ResourceState,
    ops: SmallVec<[PathOp; 16]>,
    points: Vec<f32>,
    /// Current pen position; `None` before the first segment.
    current: Option<(f32, f32)>,
    /// First point of the open subpath; closing returns the pen here.
    start: Option<(f32, f32)>,
    handles: RefCell<ZoomCache<BackendHandle>>,
}

impl Path {
    pub fn new(device: &Device) -> Self {
        Self {
            state: ResourceState::new(device, "path"),
            ops: SmallVec::new(),
            points: Vec::new(),
            current: None,
            start: None,
            handles: RefCell::new(ZoomCache::new()),
        }
    }

    /// Rebuilds a path from portable data, accepting quadratic segments.
    pub fn from_data(device: &Device, data: &PathData) -> Result<Self> {
        let mut path = Self::new(device);
        let mut i = 0;
        for op in &data.ops {
            let take = op.point_count() * 2;
            let coords = data
                .points
                .get(i..i + take)
                .ok_or(GraphicsError::InvalidArgument("path data truncated"))?;
            i += take;
            match op {
                PathOp::MoveTo => path.move_to(coords[0], coords[1])?,
                PathOp::LineTo => path.line_to(coords[0], coords[1])?,
                PathOp::QuadTo => path.quad_to(coords[0], coords[1], coords[2], coords[3])?,
                PathOp::CubicTo => path.cubic_to(
                    coords[0], coords[1], coords[2], coords[3], coords[4], coords[5],
                )?,
                PathOp::Close => path.close()?,
            }
        }
        Ok(path)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    pub(crate) fn check_disposed(&self) -> Result<()> {
        self.state.check_disposed()
    }

    fn invalidate_handles(&self) {
        let device = self.state.device().clone();
        self.handles
            .borrow_mut()
            .clear(|handle| device.destroy_path(handle));
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> Result<()> {
        self.state.check_disposed()?;
        self.ops.push(PathOp::MoveTo);
        self.points.extend_from_slice(&[x, y]);
        self.current = Some((x, y));
        self.start = Some((x, y));
        self.invalidate_handles();
        Ok(())
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> Result<()> {
        self.state.check_disposed()?;
        self.ensure_open(x, y);
        self.ops.push(PathOp::LineTo);
        self.points.extend_from_slice(&[x, y]);
        self.current = Some((x, y));
        self.invalidate_handles();
        Ok(())
    }

    /// Quadratic segment, stored as the equivalent cubic (control points at
    /// two thirds of the way toward the quadratic control point).
    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> Result<()> {
        self.state.check_disposed()?;
        self.ensure_open(cx, cy);
        let (px, py) = self.current.unwrap_or((cx, cy));
        let c1 = (px + 2.0 / 3.0 * (cx - px), py + 2.0 / 3.0 * (cy - py));
        let c2 = (x + 2.0 / 3.0 * (cx - x), y + 2.0 / 3.0 * (cy - y));
        self.ops.push(PathOp::CubicTo);
        self.points
            .extend_from_slice(&[c1.0, c1.1, c2.0, c2.1, x, y]);
        self.current = Some((x, y));
        self.invalidate_handles();
        Ok(())
    }

    pub fn cubic_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> Result<()> {
        self.state.check_disposed()?;
        self.ensure_open(c1x, c1y);
        self.ops.push(PathOp::CubicTo);
        self.points
            .extend_from_slice(&[c1x, c1y, c2x, c2y, x, y]);
        self.current = Some((x, y));
        self.invalidate_handles();
        Ok(())
    }

    /// Closes the open subpath; the pen returns to the subpath's start.
    pub fn close(&mut self) -> Result<()> {
        self.state.check_disposed()?;
        self.ops.push(PathOp::Close);
        self.current = self.start;
        self.invalidate_handles();
        Ok(())
    }

    pub fn add_rectangle(&mut self, rect: Rectangle) -> Result<()> {
        let (x, y) = (rect.x as f32, rect.y as f32);
        let (w, h) = (rect.width as f32, rect.height as f32);
        self.move_to(x, y)?;
        self.line_to(x + w, y)?;
        self.line_to(x + w, y + h)?;
        self.line_to(x, y + h)?;
        self.close()
    }

    /// Elliptical arc inside `rect`, from `start_angle` spanning `arc_angle`
    /// degrees counterclockwise, approximated with one cubic per quadrant.
    pub fn add_arc(&mut self, rect: Rectangle, start_angle: f32, arc_angle: f32) -> Result<()> {
        self.state.check_disposed()?;
        let cx = rect.x as f32 + rect.width as f32 / 2.0;
        let cy = rect.y as f32 + rect.height as f32 / 2.0;
        let rx = rect.width as f32 / 2.0;
        let ry = rect.height as f32 / 2.0;
        let steps = (arc_angle.abs() / 90.0).ceil().max(1.0) as usize;
        let step = (arc_angle / steps as f32).to_radians();
        // y is negated: positive angles run counterclockwise on a y-down
        // surface
        let point = |a: f32| (cx + rx * a.cos(), cy - ry * a.sin());
        let mut a = start_angle.to_radians();
        let (sx, sy) = point(a);
        if self.current.is_some() {
            self.line_to(sx, sy)?;
        } else {
            self.move_to(sx, sy)?;
        }
        for _ in 0..steps {
            let a0 = a;
            a += step;
            let a1 = a;
            let k = 4.0 / 3.0 * ((a1 - a0) / 4.0).tan();
            let (x0, y0) = point(a0);
            let (x1, y1) = point(a1);
            // tangent of (cos, -sin) is (-sin, -cos)
            let c1 = (x0 - k * rx * a0.sin(), y0 - k * ry * a0.cos());
            let c2 = (x1 + k * rx * a1.sin(), y1 + k * ry * a1.cos());
            self.cubic_to(c1.0, c1.1, c2.0, c2.1, x1, y1)?;
        }
        Ok(())
    }

    /// Appends every segment of `other`; the pen moves to its end position.
    pub fn add_path(&mut self, other: &Path) -> Result<()> {
        self.state.check_disposed()?;
        other.state.check_disposed()?;
        self.ops.extend(other.ops.iter().copied());
        self.points.extend_from_slice(&other.points);
        self.current = other.current;
        self.start = other.start;
        self.invalidate_handles();
        Ok(())
    }

    /// Current pen position, if any segment has been added.
    pub fn current_point(&self) -> Option<(f32, f32)> {
        self.current
    }

    /// Portable copy of the accumulated segments, in logical coordinates.
    pub fn path_data(&self) -> PathData {
        PathData {
            ops: self.ops.to_vec(),
            points: self.points.clone(),
        }
    }

    /// Bounding rectangle of all control points, in logical coordinates.
    pub fn bounds(&self) -> Rectangle {
        if self.points.is_empty() {
            return Rectangle::default();
        }
        let mut min = (f32::MAX, f32::MAX);
        let mut max = (f32::MIN, f32::MIN);
        for pair in self.points.chunks_exact(2) {
            min.0 = min.0.min(pair[0]);
            min.1 = min.1.min(pair[1]);
            max.0 = max.0.max(pair[0]);
            max.1 = max.1.max(pair[1]);
        }
        Rectangle::new(
            min.0.floor() as i32,
            min.1.floor() as i32,
            (max.0 - min.0).ceil() as i32,
            (max.1 - min.1).ceil() as i32,
        )
    }

    pub(crate) fn data_for_zoom(&self, zoom: u32) -> PathData {
        PathData {
            ops: self.ops.to_vec(),
            points: self
                .points
                .iter()
                .map(|p| scale_up_f32(*p, zoom))
                .collect(),
        }
    }

    /// Backend handle at `zoom`, replaying the segments on first use.
    pub(crate) fn handle_for_zoom(&self, zoom: u32) -> Result<BackendHandle> {
        self.state.check_disposed()?;
        let device = self.state.device().clone();
        let data = self.data_for_zoom(zoom);
        self.handles
            .borrow_mut()
            .get_or_try_insert(zoom, || device.path_handle(&data))
            .map(|h| *h)
    }

    pub fn dispose(&self) {
        if !self.state.mark_disposed() {
            return;
        }
        self.invalidate_handles();
    }
}

impl Drop for Path {
    fn drop(&mut self) {
        if !self.state.is_disposed() {
            self.state.mark_disposed();
            self.invalidate_handles();
        }
    }
}

impl Path {
    /// Implicit move keeps a leading line/curve well formed.
    fn ensure_open(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.ops.push(PathOp::MoveTo);
            self.points.extend_from_slice(&[x, y]);
            self.current = Some((x, y));
            self.start = Some((x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, NativeSurface, RecordingSurface};
    use std::rc::Rc;

    fn device() -> (Device, Rc<RecordingSurface>) {
        let surface = Rc::new(RecordingSurface::new());
        (
            Device::new(BackendKind::Native(Rc::clone(&surface) as Rc<dyn NativeSurface>), 100),
            surface,
        )
    }

    #[test]
    fn test_close_returns_pen_to_subpath_start() {
        let (device, _s) = device();
        let mut path = Path::new(&device);
        path.move_to(10.0, 20.0).unwrap();
        path.line_to(30.0, 20.0).unwrap();
        path.line_to(30.0, 40.0).unwrap();
        path.close().unwrap();
        assert_eq!(path.current_point(), Some((10.0, 20.0)));
        // a segment after close continues from the start point
        path.line_to(50.0, 50.0).unwrap();
        let data = path.path_data();
        assert_eq!(*data.ops.last().unwrap(), PathOp::LineTo);
        path.dispose();
    }

    #[test]
    fn test_add_path_appends_segments() {
        let (device, _s) = device();
        let mut a = Path::new(&device);
        a.move_to(0.0, 0.0).unwrap();
        a.line_to(5.0, 0.0).unwrap();
        let mut b = Path::new(&device);
        b.move_to(10.0, 10.0).unwrap();
        b.line_to(10.0, 20.0).unwrap();
        a.add_path(&b).unwrap();
        let data = a.path_data();
        assert_eq!(data.ops.len(), 4);
        assert_eq!(a.current_point(), Some((10.0, 20.0)));
    }

    #[test]
    fn test_quad_elevated_to_cubic() {
        let (device, _s) = device();
        let mut path = Path::new(&device);
        path.move_to(0.0, 0.0).unwrap();
        path.quad_to(30.0, 0.0, 30.0, 30.0).unwrap();
        let data = path.path_data();
        assert_eq!(data.ops, vec![PathOp::MoveTo, PathOp::CubicTo]);
        // c1 = p0 + 2/3 (q - p0), c2 = p2 + 2/3 (q - p2)
        assert_eq!(&data.points[2..], &[20.0, 0.0, 30.0, 10.0, 30.0, 30.0]);
        path.dispose();
    }

    #[test]
    fn test_handle_replayed_per_zoom_and_invalidated_on_edit() {
        let (device, surface) = device();
        let mut path = Path::new(&device);
        path.add_rectangle(Rectangle::new(0, 0, 10, 10)).unwrap();
        let h100 = path.handle_for_zoom(100).unwrap();
        assert_eq!(path.handle_for_zoom(100).unwrap(), h100);
        let h200 = path.handle_for_zoom(200).unwrap();
        assert_ne!(h100, h200);
        assert_eq!(surface.count("create_path"), 2);
        // editing drops the materialized handles
        path.line_to(20.0, 20.0).unwrap();
        path.handle_for_zoom(100).unwrap();
        assert_eq!(surface.count("create_path"), 3);
        assert_eq!(surface.count("destroy_path"), 2);
        path.dispose();
    }

    #[test]
    fn test_scaled_data_for_zoom() {
        let (device, _s) = device();
        let mut path = Path::new(&device);
        path.move_to(10.0, 10.0).unwrap();
        path.line_to(20.0, 30.0).unwrap();
        let data = path.data_for_zoom(150);
        assert_eq!(data.points, vec![15.0, 15.0, 30.0, 45.0]);
        path.dispose();
    }

    #[test]
    fn test_bounds_cover_all_points() {
        let (device, _s) = device();
        let mut path = Path::new(&device);
        path.move_to(5.0, 5.0).unwrap();
        path.line_to(-3.0, 12.0).unwrap();
        assert_eq!(path.bounds(), Rectangle::new(-3, 5, 8, 7));
        path.dispose();
    }

    #[test]
    fn test_from_data_round_trip() {
        let (device, _s) = device();
        let source = PathData {
            ops: vec![PathOp::MoveTo, PathOp::LineTo, PathOp::Close],
            points: vec![0.0, 0.0, 10.0, 0.0],
        };
        let path = Path::from_data(&device, &source).unwrap();
        assert_eq!(path.path_data().ops, source.ops);
        let truncated = PathData {
            ops: vec![PathOp::MoveTo],
            points: vec![0.0],
        };
        assert!(Path::from_data(&device, &truncated).is_err());
        path.dispose();
    }

    #[test]
    fn test_disposed_path_rejects_edits() {
        let (device, _s) = device();
        let mut path = Path::new(&device);
        path.move_to(0.0, 0.0).unwrap();
        path.dispose();
        assert!(path.is_disposed());
        assert!(path.line_to(1.0, 1.0).is_err());
        assert!(path.handle_for_zoom(100).is_err());
    }
}
