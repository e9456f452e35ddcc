//! Affine transforms
//!
//! A 2x3 matrix `[m11, m12, m21, m22, dx, dy]` mapping (x, y) to
//! (m11*x + m21*y + dx, m12*x + m22*y + dy). The math lives here; the
//! backend handle mirrors the elements for targets that consume native
//! transform objects.

use std::cell::{Cell, RefCell};

use slate_core::{GraphicsError, Result};

use crate::backend::BackendHandle;
use crate::device::Device;
use crate::resource::ResourceState;

/// Determinants below this are treated as singular.
const DET_EPSILON: f32 = 1e-10;

pub struct Transform {
    state: ResourceState,
    elements: RefCell<[f32; 6]>,
    handle: Cell<BackendHandle>,
}

impl Transform {
    /// The identity transform.
    pub fn new(device: &Device) -> Result<Self> {
        Self::from_elements_checked(device, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    pub fn with_elements(
        device: &Device,
        m11: f32,
        m12: f32,
        m21: f32,
        m22: f32,
        dx: f32,
        dy: f32,
    ) -> Result<Self> {
        Self::from_elements_checked(device, [m11, m12, m21, m22, dx, dy])
    }

    fn from_elements_checked(device: &Device, elements: [f32; 6]) -> Result<Self> {
        if elements.iter().any(|e| !e.is_finite()) {
            return Err(GraphicsError::InvalidArgument(
                "transform elements must be finite",
            ));
        }
        let handle = device.transform_handle(elements)?;
        Ok(Self {
            state: ResourceState::new(device, "transform"),
            elements: RefCell::new(elements),
            handle: Cell::new(handle),
        })
    }

    /// Detached copy used when reading a transform back out of a GC.
    pub(crate) fn from_elements(device: &Device, elements: [f32; 6]) -> Transform {
        match Self::from_elements_checked(device, elements) {
            Ok(t) => t,
            // elements already lived in a transform, so they are finite;
            // handle exhaustion degrades to an unmirrored transform
            Err(_) => Transform {
                state: ResourceState::new(device, "transform"),
                elements: RefCell::new(elements),
                handle: Cell::new(0),
            },
        }
    }

    pub fn elements(&self) -> [f32; 6] {
        *self.elements.borrow()
    }

    pub fn is_identity(&self) -> bool {
        self.elements() == [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    pub(crate) fn check_disposed(&self) -> Result<()> {
        self.state.check_disposed()
    }

    fn update(&self, elements: [f32; 6]) {
        *self.elements.borrow_mut() = elements;
        let handle = self.handle.get();
        if handle != 0 {
            self.state.device().transform_set(handle, elements);
        }
    }

    pub fn set_elements(
        &self,
        m11: f32,
        m12: f32,
        m21: f32,
        m22: f32,
        dx: f32,
        dy: f32,
    ) -> Result<()> {
        self.state.check_disposed()?;
        let elements = [m11, m12, m21, m22, dx, dy];
        if elements.iter().any(|e| !e.is_finite()) {
            return Err(GraphicsError::InvalidArgument(
                "transform elements must be finite",
            ));
        }
        self.update(elements);
        Ok(())
    }

    pub fn identity(&self) -> Result<()> {
        self.set_elements(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Result<()> {
        self.state.check_disposed()?;
        let [m11, m12, m21, m22, tx, ty] = self.elements();
        self.update([
            m11,
            m12,
            m21,
            m22,
            tx + m11 * dx + m21 * dy,
            ty + m12 * dx + m22 * dy,
        ]);
        Ok(())
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Result<()> {
        self.state.check_disposed()?;
        let [m11, m12, m21, m22, dx, dy] = self.elements();
        self.update([m11 * sx, m12 * sx, m21 * sy, m22 * sy, dx, dy]);
        Ok(())
    }

    /// Rotates by `angle` degrees clockwise (y grows downward).
    pub fn rotate(&self, angle: f32) -> Result<()> {
        self.state.check_disposed()?;
        let (sin, cos) = angle.to_radians().sin_cos();
        self.concat([cos, sin, -sin, cos, 0.0, 0.0]);
        Ok(())
    }

    pub fn shear(&self, shear_x: f32, shear_y: f32) -> Result<()> {
        self.state.check_disposed()?;
        self.concat([1.0, shear_y, shear_x, 1.0, 0.0, 0.0]);
        Ok(())
    }

    /// Prepends `other`: the resulting transform applies `other` first.
    pub fn multiply(&self, other: &Transform) -> Result<()> {
        self.state.check_disposed()?;
        other.check_disposed()?;
        self.concat(other.elements());
        Ok(())
    }

    fn concat(&self, rhs: [f32; 6]) {
        let [a11, a12, a21, a22, adx, ady] = self.elements();
        let [b11, b12, b21, b22, bdx, bdy] = rhs;
        self.update([
            a11 * b11 + a21 * b12,
            a12 * b11 + a22 * b12,
            a11 * b21 + a21 * b22,
            a12 * b21 + a22 * b22,
            a11 * bdx + a21 * bdy + adx,
            a12 * bdx + a22 * bdy + ady,
        ]);
    }

    pub fn invert(&self) -> Result<()> {
        self.state.check_disposed()?;
        let [m11, m12, m21, m22, dx, dy] = self.elements();
        let det = m11 * m22 - m12 * m21;
        if det.abs() < DET_EPSILON {
            return Err(GraphicsError::InvalidArgument("transform is not invertible"));
        }
        self.update([
            m22 / det,
            -m12 / det,
            -m21 / det,
            m11 / det,
            (m21 * dy - m22 * dx) / det,
            (m12 * dx - m11 * dy) / det,
        ]);
        Ok(())
    }

    /// Maps `(x, y)` pairs in place.
    pub fn transform_points(&self, points: &mut [f32]) -> Result<()> {
        self.state.check_disposed()?;
        if points.len() % 2 != 0 {
            return Err(GraphicsError::InvalidArgument(
                "point array must hold x/y pairs",
            ));
        }
        let [m11, m12, m21, m22, dx, dy] = self.elements();
        for pair in points.chunks_exact_mut(2) {
            let (x, y) = (pair[0], pair[1]);
            pair[0] = m11 * x + m21 * y + dx;
            pair[1] = m12 * x + m22 * y + dy;
        }
        Ok(())
    }

    pub fn dispose(&self) {
        if !self.state.mark_disposed() {
            return;
        }
        let handle = self.handle.replace(0);
        if handle != 0 {
            self.state.device().destroy_transform(handle);
        }
    }
}

impl Drop for Transform {
    fn drop(&mut self) {
        if !self.state.is_disposed() {
            self.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, RecordingSurface};
    use std::rc::Rc;

    fn device() -> Device {
        Device::new(BackendKind::Native(Rc::new(RecordingSurface::new())), 100)
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_identity_and_translation() {
        let device = device();
        let t = Transform::new(&device).unwrap();
        assert!(t.is_identity());
        t.translate(10.0, 5.0).unwrap();
        let mut p = [0.0, 0.0, 1.0, 1.0];
        t.transform_points(&mut p).unwrap();
        assert_close(&p, &[10.0, 5.0, 11.0, 6.0]);
        t.dispose();
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let device = device();
        let t = Transform::new(&device).unwrap();
        t.rotate(90.0).unwrap();
        let mut p = [1.0, 0.0];
        t.transform_points(&mut p).unwrap();
        // clockwise on a y-down surface: +x maps to +y
        assert_close(&p, &[0.0, 1.0]);
        t.dispose();
    }

    #[test]
    fn test_scale_then_translate_order() {
        let device = device();
        let t = Transform::new(&device).unwrap();
        t.scale(2.0, 2.0).unwrap();
        t.translate(3.0, 0.0).unwrap();
        let mut p = [1.0, 0.0];
        t.transform_points(&mut p).unwrap();
        // translate is prepended: (1+3)*2
        assert_close(&p, &[8.0, 0.0]);
        t.dispose();
    }

    #[test]
    fn test_invert_round_trips() {
        let device = device();
        let t = Transform::with_elements(&device, 2.0, 0.0, 0.0, 4.0, 10.0, -6.0).unwrap();
        let mut p = [5.0, 5.0];
        t.transform_points(&mut p).unwrap();
        t.invert().unwrap();
        t.transform_points(&mut p).unwrap();
        assert_close(&p, &[5.0, 5.0]);
        t.dispose();
    }

    #[test]
    fn test_singular_matrix_rejected() {
        let device = device();
        let t = Transform::with_elements(&device, 1.0, 2.0, 2.0, 4.0, 0.0, 0.0).unwrap();
        assert!(t.invert().is_err());
        // the failed invert leaves the elements untouched
        assert_eq!(t.elements(), [1.0, 2.0, 2.0, 4.0, 0.0, 0.0]);
        t.dispose();
    }

    #[test]
    fn test_multiply_prepends() {
        let device = device();
        let a = Transform::new(&device).unwrap();
        a.translate(10.0, 0.0).unwrap();
        let b = Transform::new(&device).unwrap();
        b.scale(3.0, 3.0).unwrap();
        a.multiply(&b).unwrap();
        let mut p = [1.0, 1.0];
        a.transform_points(&mut p).unwrap();
        // scale first, then translate
        assert_close(&p, &[13.0, 3.0]);
        a.dispose();
        b.dispose();
    }

    #[test]
    fn test_disposed_transform_rejects_use() {
        let device = device();
        let t = Transform::new(&device).unwrap();
        t.dispose();
        assert!(t.is_disposed());
        assert!(t.translate(1.0, 1.0).is_err());
        assert!(t.transform_points(&mut [0.0, 0.0]).is_err());
    }
}
