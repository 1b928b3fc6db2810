//! Plane storage for frame data

use bytes::{Bytes, BytesMut};
use std::ops::Range;

/// A reference-counted, immutable plane of frame data
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Bytes,
}

impl Buffer {
    /// Create a buffer from a vector
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Buffer {
            data: Bytes::from(vec),
        }
    }

    /// Get the length of the buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a slice of the buffer data
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Share a sub-range of the buffer without copying
    pub fn slice(&self, range: Range<usize>) -> Buffer {
        Buffer {
            data: self.data.slice(range),
        }
    }

    /// Copy the contents into a writable buffer
    pub fn to_mut(&self) -> BufferMut {
        BufferMut {
            data: BytesMut::from(self.as_slice()),
        }
    }
}

/// A writable plane, used when a filter draws into a frame
pub struct BufferMut {
    data: BytesMut,
}

impl BufferMut {
    /// Create a zero-filled buffer of `len` bytes
    pub fn zeroed(len: usize) -> Self {
        BufferMut {
            data: BytesMut::zeroed(len),
        }
    }

    /// Get the length of the buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get mutable access to the buffer
    pub fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Freeze the buffer into an immutable Buffer
    pub fn freeze(self) -> Buffer {
        Buffer {
            data: self.data.freeze(),
        }
    }
}
