//! Common utilities and data structures

pub mod buffer;
pub mod pixfmt;
pub mod timestamp;

pub use buffer::{Buffer, BufferMut};
pub use pixfmt::PixelFormat;
pub use timestamp::Timestamp;
