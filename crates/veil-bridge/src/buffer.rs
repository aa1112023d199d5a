//! Ownership of engine-allocated output buffers.
//!
//! Encrypt and decrypt hand back memory allocated by the engine. That memory
//! must go back through the engine's paired free symbol — never through
//! Rust's allocator — so the owned wrapper here is deliberately not
//! constructible from, or convertible into, `Vec<u8>`. Copy out with
//! [`CipherBuffer::to_vec`] when an owned Rust buffer is needed.

use std::fmt;
use std::ops::Deref;
use std::ptr;
use std::slice;

use crate::raw;

/// The C-layout (pointer, length) pair the engine populates.
///
/// Starts empty; the bridge re-empties it before every native call so a
/// failing call never leaves a stale buffer visible.
#[repr(C)]
#[derive(Debug)]
pub struct RawBuffer {
    pub data: *mut u8,
    pub len: usize,
}

impl RawBuffer {
    /// The empty state: null pointer, zero length.
    pub const fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
        }
    }

    /// True when there is nothing to release.
    pub fn is_empty(&self) -> bool {
        self.data.is_null() || self.len == 0
    }

    pub(crate) fn reset(&mut self) {
        self.data = ptr::null_mut();
        self.len = 0;
    }
}

impl Default for RawBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

/// An engine-allocated byte span owned by the caller.
///
/// Dropping it releases the memory through the engine's buffer-free symbol.
/// If the module has been unloaded by then the release is a no-op, as there
/// is no longer a paired free to call.
pub struct CipherBuffer {
    inner: RawBuffer,
}

impl CipherBuffer {
    pub(crate) fn from_raw(inner: RawBuffer) -> Self {
        Self { inner }
    }

    /// The bytes the engine produced. Empty for an empty buffer.
    pub fn as_bytes(&self) -> &[u8] {
        if self.inner.is_empty() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.inner.data, self.inner.len) }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copies the bytes into a Rust-owned vector. The engine's allocation
    /// stays owned by `self` and is still released on drop.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Deref for CipherBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for CipherBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for CipherBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherBuffer")
            .field("len", &self.inner.len)
            .finish_non_exhaustive()
    }
}

impl Drop for CipherBuffer {
    fn drop(&mut self) {
        raw::buffer_free(&mut self.inner);
    }
}

// Safety: the engine allocates these buffers on its heap with no thread
// affinity; the wrapper only ever reads through the pointer and releases it
// once, by move.
unsafe impl Send for CipherBuffer {}
unsafe impl Sync for CipherBuffer {}
