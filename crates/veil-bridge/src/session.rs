//! Owning session handle and the encrypt/decrypt operations.

use std::mem;

use crate::buffer::{CipherBuffer, RawBuffer};
use crate::error::BridgeResult;
use crate::raw::{self, RawSession};

/// A live engine session, scoped to the partition identifier it was derived
/// with.
///
/// Move-only like [`Factory`](crate::Factory): always holds a non-null
/// token, retired exactly once. A session may outlive the bridge's knowledge
/// of its factory token but not the factory resource itself — retire
/// sessions first.
#[derive(Debug)]
pub struct Session {
    token: RawSession,
}

impl Session {
    pub(crate) fn from_raw(token: RawSession) -> Self {
        Self { token }
    }

    /// Encrypts `plaintext` under this session's key context. The returned
    /// buffer is engine-allocated and owned by the caller.
    pub fn encrypt(&self, plaintext: &[u8]) -> BridgeResult<CipherBuffer> {
        let mut out = RawBuffer::empty();
        raw::encrypt(self.token, plaintext, &mut out)?;
        Ok(CipherBuffer::from_raw(out))
    }

    /// Decrypts a payload previously produced by [`Session::encrypt`] (or by
    /// another session on the same partition).
    pub fn decrypt(&self, payload: &[u8]) -> BridgeResult<CipherBuffer> {
        let mut out = RawBuffer::empty();
        raw::decrypt(self.token, payload, &mut out)?;
        Ok(CipherBuffer::from_raw(out))
    }

    /// The underlying token. Stays owned by `self`.
    pub fn as_raw(&self) -> RawSession {
        self.token
    }

    /// Releases ownership of the token without retiring it.
    pub fn into_raw(self) -> RawSession {
        let token = self.token;
        mem::forget(self);
        token
    }

    /// Retires the session now instead of at end of scope.
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        raw::session_free(self.token);
    }
}
