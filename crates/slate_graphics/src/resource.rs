//! Common resource lifecycle
//!
//! Every graphics resource moves Live -> Disposed exactly once; all public
//! operations except dispose/is_disposed check disposal first. Colors and
//! fonts are the documented exception: their dispose is advisory only and
//! never invalidates the value.

use slate_core::{GraphicsError, Result};
use std::cell::Cell;

use crate::device::Device;

/// Lifecycle state embedded in each device-bound resource.
pub(crate) struct ResourceState {
    device: Device,
    disposed: Cell<bool>,
    tracking_id: Cell<Option<u64>>,
}

impl ResourceState {
    /// Creates live state and registers the resource in the device's
    /// leak-detection registry under `kind`.
    pub(crate) fn new(device: &Device, kind: &'static str) -> Self {
        let id = device.track(kind);
        Self {
            device: device.clone(),
            disposed: Cell::new(false),
            tracking_id: Cell::new(Some(id)),
        }
    }

    pub(crate) fn device(&self) -> &Device {
        &self.device
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn check_disposed(&self) -> Result<()> {
        if self.disposed.get() {
            Err(GraphicsError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Transitions to Disposed. Returns true the first time, so the
    /// backend-specific destroy hook runs exactly once.
    pub(crate) fn mark_disposed(&self) -> bool {
        if self.disposed.replace(true) {
            return false;
        }
        if let Some(id) = self.tracking_id.take() {
            self.device.untrack(id);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, RecordingSurface};
    use std::rc::Rc;

    #[test]
    fn test_mark_disposed_runs_once() {
        let device = Device::new(BackendKind::Native(Rc::new(RecordingSurface::new())), 100);
        let state = ResourceState::new(&device, "test");
        assert_eq!(device.tracked_resource_count(), 1);
        assert!(state.check_disposed().is_ok());
        assert!(state.mark_disposed());
        assert!(!state.mark_disposed());
        assert!(state.is_disposed());
        assert_eq!(state.check_disposed(), Err(GraphicsError::Disposed));
        assert_eq!(device.tracked_resource_count(), 0);
    }
}
