//! Slate bridge transport
//!
//! The bridge backend realizes drawing by building small serializable
//! draw-operation records and handing them to a [`DrawOpSink`] that forwards
//! them to an external renderer. The sink is fire-and-forget: no return value
//! ever flows back into graphics-context logic.
//!
//! All coordinates inside a [`DrawOp`] are physical pixels; the graphics
//! context scales before the record is built, so the external renderer and
//! the native backend see identical geometry.

mod ops;
mod sink;

pub use ops::{BrushSpec, DrawOp, FontSpec, PenSpec, TextFlags};
pub use sink::{ChannelSink, DrawOpSink, RecordingSink};

/// Sink id used for device-scoped operations that are not bound to a GC
/// (image registration and destruction).
pub const DEVICE_SCOPE: u64 = 0;
