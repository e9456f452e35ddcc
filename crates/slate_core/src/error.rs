//! Graphics error taxonomy
//!
//! Every failure in the subsystem is synchronous and immediate; nothing is
//! retried, queued, or degraded. The caller decides recovery.

use thiserror::Error;

/// Errors raised by graphics resources and the graphics context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Operation attempted on a disposed resource
    #[error("graphic is disposed")]
    Disposed,

    /// A required argument was absent
    #[error("null argument: {0}")]
    NullArgument(&'static str),

    /// An argument was present but unusable
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Backend could not allocate a native handle (pen, brush, font, bitmap, path)
    #[error("no more handles")]
    NoHandles,

    /// Advanced-graphics operation on a backend/mode without that subsystem
    #[error("no graphics library available")]
    NoGraphicsLibrary,

    /// Image is not a bitmap or icon, or is otherwise in an invalid state
    #[error("invalid image")]
    InvalidImage,

    /// Image data has a depth this subsystem does not support
    #[error("unsupported color depth")]
    UnsupportedDepth,

    /// I/O failure while loading image bytes
    #[error("i/o error: {0}")]
    Io(String),

    /// Image bytes are not in a recognized format
    #[error("unsupported or unrecognized image format")]
    UnsupportedFormat,
}

pub type Result<T> = std::result::Result<T, GraphicsError>;
