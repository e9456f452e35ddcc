//! Regions
//!
//! A region is a set of points kept as disjoint rectangles. All set algebra
//! happens here in logical coordinates; the backend handle is a mirror that
//! is rewritten after every mutation, so clipping by region needs no backend
//! round trips.

use std::cell::{Cell, RefCell};

use slate_core::geometry::{Point, Rectangle};
use slate_core::Result;

use crate::backend::BackendHandle;
use crate::device::Device;
use crate::resource::ResourceState;

pub struct Region {
    state: ResourceState,
    rects: RefCell<Vec<Rectangle>>,
    handle: Cell<BackendHandle>,
}

impl Region {
    pub fn new(device: &Device) -> Result<Self> {
        let handle = device.region_handle()?;
        Ok(Self {
            state: ResourceState::new(device, "region"),
            rects: RefCell::new(Vec::new()),
            handle: Cell::new(handle),
        })
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    pub(crate) fn check_disposed(&self) -> Result<()> {
        self.state.check_disposed()
    }

    fn sync_handle(&self) {
        let rects = self.rects.borrow();
        self.state.device().region_set(self.handle.get(), &rects);
    }

    pub fn is_empty(&self) -> bool {
        self.rects.borrow().is_empty()
    }

    /// The disjoint rectangles covering this region.
    pub fn rects(&self) -> Vec<Rectangle> {
        self.rects.borrow().clone()
    }

    pub fn bounds(&self) -> Rectangle {
        self.rects
            .borrow()
            .iter()
            .fold(Rectangle::default(), |acc, r| acc.union(r))
    }

    pub fn contains(&self, p: Point) -> bool {
        self.rects.borrow().iter().any(|r| r.contains(p.x, p.y))
    }

    pub fn intersects(&self, rect: Rectangle) -> bool {
        self.rects.borrow().iter().any(|r| r.intersects(&rect))
    }

    pub fn add_rect(&self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        if rect.is_empty() {
            return Ok(());
        }
        {
            let mut rects = self.rects.borrow_mut();
            // add the parts of `rect` not already covered
            let mut pieces = vec![rect];
            for existing in rects.iter() {
                let mut next = Vec::new();
                for piece in pieces {
                    next.extend(subtract_rect(piece, *existing));
                }
                pieces = next;
            }
            rects.extend(pieces);
        }
        self.sync_handle();
        Ok(())
    }

    pub fn add_region(&self, other: &Region) -> Result<()> {
        other.check_disposed()?;
        for rect in other.rects() {
            self.add_rect(rect)?;
        }
        Ok(())
    }

    pub fn subtract_rect(&self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        {
            let mut rects = self.rects.borrow_mut();
            let old = std::mem::take(&mut *rects);
            for r in old {
                rects.extend(subtract_rect(r, rect));
            }
        }
        self.sync_handle();
        Ok(())
    }

    pub fn subtract_region(&self, other: &Region) -> Result<()> {
        other.check_disposed()?;
        for rect in other.rects() {
            self.subtract_rect(rect)?;
        }
        Ok(())
    }

    pub fn intersect_rect(&self, rect: Rectangle) -> Result<()> {
        self.state.check_disposed()?;
        {
            let mut rects = self.rects.borrow_mut();
            let old = std::mem::take(&mut *rects);
            for r in old {
                let clipped = r.intersection(&rect);
                if !clipped.is_empty() {
                    rects.push(clipped);
                }
            }
        }
        self.sync_handle();
        Ok(())
    }

    pub fn intersect_region(&self, other: &Region) -> Result<()> {
        self.state.check_disposed()?;
        other.check_disposed()?;
        {
            let mut rects = self.rects.borrow_mut();
            let old = std::mem::take(&mut *rects);
            let theirs = other.rects.borrow();
            for r in old {
                for o in theirs.iter() {
                    let clipped = r.intersection(o);
                    if !clipped.is_empty() {
                        rects.push(clipped);
                    }
                }
            }
        }
        self.sync_handle();
        Ok(())
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Result<()> {
        self.state.check_disposed()?;
        for r in self.rects.borrow_mut().iter_mut() {
            r.x += dx;
            r.y += dy;
        }
        self.sync_handle();
        Ok(())
    }

    pub fn dispose(&self) {
        if !self.state.mark_disposed() {
            return;
        }
        self.state.device().destroy_region(self.handle.replace(0));
        self.rects.borrow_mut().clear();
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if !self.state.is_disposed() {
            self.dispose();
        }
    }
}

/// The up-to-four rectangles of `a` not covered by `b`.
fn subtract_rect(a: Rectangle, b: Rectangle) -> Vec<Rectangle> {
    let overlap = a.intersection(&b);
    if overlap.is_empty() {
        return vec![a];
    }
    let mut out = Vec::new();
    // band above the overlap
    if overlap.y > a.y {
        out.push(Rectangle::new(a.x, a.y, a.width, overlap.y - a.y));
    }
    // band below
    let a_bottom = a.y + a.height;
    let o_bottom = overlap.y + overlap.height;
    if o_bottom < a_bottom {
        out.push(Rectangle::new(a.x, o_bottom, a.width, a_bottom - o_bottom));
    }
    // left and right slivers, limited to the overlap's vertical band
    if overlap.x > a.x {
        out.push(Rectangle::new(
            a.x,
            overlap.y,
            overlap.x - a.x,
            overlap.height,
        ));
    }
    let a_right = a.x + a.width;
    let o_right = overlap.x + overlap.width;
    if o_right < a_right {
        out.push(Rectangle::new(
            o_right,
            overlap.y,
            a_right - o_right,
            overlap.height,
        ));
    }
    out
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

    fn area(region: &Region) -> i64 {
        region
            .rects()
            .iter()
            .map(|r| r.width as i64 * r.height as i64)
            .sum()
    }

    fn rects_disjoint(region: &Region) -> bool {
        let rects = region.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                if a.intersects(b) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_add_overlapping_rects_stays_disjoint() {
        let (device, _s) = device();
        let region = Region::new(&device).unwrap();
        region.add_rect(Rectangle::new(0, 0, 10, 10)).unwrap();
        region.add_rect(Rectangle::new(5, 5, 10, 10)).unwrap();
        assert!(rects_disjoint(&region));
        // union area: 100 + 100 - 25 overlap
        assert_eq!(area(&region), 175);
        assert_eq!(region.bounds(), Rectangle::new(0, 0, 15, 15));
        region.dispose();
    }

    #[test]
    fn test_subtract_punches_hole() {
        let (device, _s) = device();
        let region = Region::new(&device).unwrap();
        region.add_rect(Rectangle::new(0, 0, 10, 10)).unwrap();
        region.subtract_rect(Rectangle::new(2, 2, 6, 6)).unwrap();
        assert!(rects_disjoint(&region));
        assert_eq!(area(&region), 100 - 36);
        assert!(region.contains(Point::new(0, 0)));
        assert!(!region.contains(Point::new(5, 5)));
        region.dispose();
    }

    #[test]
    fn test_intersect_clips_to_rect() {
        let (device, _s) = device();
        let region = Region::new(&device).unwrap();
        region.add_rect(Rectangle::new(0, 0, 10, 10)).unwrap();
        region.add_rect(Rectangle::new(20, 0, 10, 10)).unwrap();
        region.intersect_rect(Rectangle::new(5, 0, 20, 10)).unwrap();
        assert_eq!(area(&region), 5 * 10 + 5 * 10);
        assert!(!region.contains(Point::new(0, 0)));
        assert!(region.contains(Point::new(6, 1)));
        region.dispose();
    }

    #[test]
    fn test_intersect_regions() {
        let (device, _s) = device();
        let a = Region::new(&device).unwrap();
        a.add_rect(Rectangle::new(0, 0, 10, 10)).unwrap();
        let b = Region::new(&device).unwrap();
        b.add_rect(Rectangle::new(5, 5, 10, 10)).unwrap();
        a.intersect_region(&b).unwrap();
        assert_eq!(a.rects(), vec![Rectangle::new(5, 5, 5, 5)]);
        a.dispose();
        b.dispose();
    }

    #[test]
    fn test_translate_moves_everything() {
        let (device, _s) = device();
        let region = Region::new(&device).unwrap();
        region.add_rect(Rectangle::new(0, 0, 4, 4)).unwrap();
        region.translate(10, -2).unwrap();
        assert_eq!(region.bounds(), Rectangle::new(10, -2, 4, 4));
        region.dispose();
    }

    #[test]
    fn test_handle_mirror_updated_on_mutation() {
        let (device, surface) = device();
        let region = Region::new(&device).unwrap();
        region.add_rect(Rectangle::new(0, 0, 4, 4)).unwrap();
        region.subtract_rect(Rectangle::new(1, 1, 1, 1)).unwrap();
        assert_eq!(surface.count("region_set"), 2);
        region.dispose();
        assert_eq!(surface.count("destroy_region"), 1);
        assert!(region.add_rect(Rectangle::new(0, 0, 1, 1)).is_err());
    }
}
