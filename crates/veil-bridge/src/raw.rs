//! Token-level operation surface.
//!
//! This is the boundary contract as the engine defines it: factories and
//! sessions are opaque address-sized tokens, freeing a null token is a silent
//! no-op, and nothing here tracks token liveness — passing a token after it
//! has been freed is a caller error the bridge cannot detect. The owning
//! [`Factory`](crate::Factory) and [`Session`](crate::Session) wrappers are
//! built on this module and rule that misuse out by construction; reach for
//! the raw layer only when tokens must cross another boundary of your own.

use std::ffi::CString;
use std::os::raw::c_void;

use crate::buffer::RawBuffer;
use crate::error::{self, BridgeError, BridgeResult};
use crate::loader;
use crate::symbols::{CryptFn, SymbolTable};

/// Opaque token for an engine factory. Zero is the null token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFactory(usize);

/// Opaque token for an engine session. Zero is the null token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSession(usize);

impl RawFactory {
    pub const NULL: Self = Self(0);

    pub const fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    pub const fn addr(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

impl RawSession {
    pub const NULL: Self = Self(0);

    pub const fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    pub const fn addr(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

/// Hands a configuration document to the engine's apply-config entry point.
pub fn apply_config(config_json: &str) -> BridgeResult<()> {
    let json = to_c_string(config_json)?;
    loader::with_module(|module| {
        let status = unsafe { (module.symbols.apply_config)(json.as_ptr()) };
        if status != 0 {
            return Err(BridgeError::Native {
                operation: "apply_config",
                status,
                detail: module.detail(),
            });
        }
        Ok(())
    })
}

/// Builds a factory from a configuration document. Returns a non-null token
/// or reports the engine's diagnostic.
pub fn factory_new_with_config(config_json: &str) -> BridgeResult<RawFactory> {
    let json = to_c_string(config_json)?;
    loader::with_module(|module| {
        let ptr = unsafe { (module.symbols.factory_new_with_config)(json.as_ptr()) };
        if ptr.is_null() {
            return Err(BridgeError::ConstructFailed {
                operation: "factory_new_with_config",
                detail: module.detail(),
            });
        }
        Ok(RawFactory(ptr as usize))
    })
}

/// Builds a factory from the engine's ambient environment configuration.
pub fn factory_new_from_env() -> BridgeResult<RawFactory> {
    loader::with_module(|module| {
        let ptr = unsafe { (module.symbols.factory_new_from_env)() };
        if ptr.is_null() {
            return Err(BridgeError::ConstructFailed {
                operation: "factory_new_from_env",
                detail: module.detail(),
            });
        }
        Ok(RawFactory(ptr as usize))
    })
}

/// Retires a factory token. No-op on the null token or when no module is
/// loaded; the native free is assumed infallible, so nothing is returned.
pub fn factory_free(factory: RawFactory) {
    if factory.is_null() {
        return;
    }
    let _ = loader::try_with_module(|module| unsafe {
        (module.symbols.factory_free)(factory.as_ptr())
    });
}

/// Derives a session for `partition_id` from a live factory.
///
/// Repeated calls with the same partition identifier may mint distinct
/// sessions; the engine makes no interning promise.
pub fn factory_get_session(factory: RawFactory, partition_id: &str) -> BridgeResult<RawSession> {
    let partition = to_c_string(partition_id)?;
    loader::with_module(|module| {
        if factory.is_null() {
            return Err(error::record(BridgeError::NullFactory));
        }
        let ptr =
            unsafe { (module.symbols.factory_get_session)(factory.as_ptr(), partition.as_ptr()) };
        if ptr.is_null() {
            return Err(BridgeError::ConstructFailed {
                operation: "factory_get_session",
                detail: module.detail(),
            });
        }
        Ok(RawSession(ptr as usize))
    })
}

/// Retires a session token. Mirrors [`factory_free`].
pub fn session_free(session: RawSession) {
    if session.is_null() {
        return;
    }
    let _ = loader::try_with_module(|module| unsafe {
        (module.symbols.session_free)(session.as_ptr())
    });
}

/// Encrypts `plaintext` under the session's partition key context. On
/// success `out` holds an engine-allocated buffer the caller now owns.
pub fn encrypt(session: RawSession, plaintext: &[u8], out: &mut RawBuffer) -> BridgeResult<()> {
    crypt("encrypt", |symbols| symbols.encrypt, session, plaintext, out)
}

/// Decrypts an encrypted payload. Ownership of `out` mirrors [`encrypt`].
pub fn decrypt(session: RawSession, payload: &[u8], out: &mut RawBuffer) -> BridgeResult<()> {
    crypt("decrypt", |symbols| symbols.decrypt, session, payload, out)
}

/// Releases an engine-allocated buffer and leaves the slot empty. No-op on
/// an already-empty buffer or when the module (and with it the paired free
/// symbol) is gone.
pub fn buffer_free(buffer: &mut RawBuffer) {
    if buffer.is_empty() {
        buffer.reset();
        return;
    }
    let _ = loader::try_with_module(|module| {
        let ptr: *mut RawBuffer = buffer;
        unsafe { (module.symbols.buffer_free)(ptr) }
    });
    buffer.reset();
}

fn crypt(
    operation: &'static str,
    select: fn(&SymbolTable) -> CryptFn,
    session: RawSession,
    input: &[u8],
    out: &mut RawBuffer,
) -> BridgeResult<()> {
    // Empty the output slot up front so no failure path can leave a stale
    // buffer visible.
    out.reset();
    loader::with_module(|module| {
        if session.is_null() {
            return Err(error::record(BridgeError::NullSession));
        }
        let status =
            unsafe { select(&module.symbols)(session.as_ptr(), input.as_ptr(), input.len(), out) };
        if status != 0 {
            return Err(BridgeError::Native {
                operation,
                status,
                detail: module.detail(),
            });
        }
        Ok(())
    })
}

fn to_c_string(value: &str) -> BridgeResult<CString> {
    CString::new(value).map_err(|err| error::record(BridgeError::from(err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn operations_require_a_loaded_module() {
        loader::unload();
        assert!(matches!(
            apply_config("{}").unwrap_err(),
            BridgeError::NotLoaded
        ));
        assert!(matches!(
            factory_new_from_env().unwrap_err(),
            BridgeError::NotLoaded
        ));
        assert!(matches!(
            factory_new_with_config("{}").unwrap_err(),
            BridgeError::NotLoaded
        ));
        assert!(matches!(
            factory_get_session(RawFactory::from_addr(1), "p").unwrap_err(),
            BridgeError::NotLoaded
        ));
    }

    #[test]
    #[serial]
    fn failed_crypt_leaves_the_output_slot_empty() {
        loader::unload();
        let mut backing = [7u8; 3];
        let mut out = RawBuffer {
            data: backing.as_mut_ptr(),
            len: backing.len(),
        };
        assert!(encrypt(RawSession::NULL, b"secret", &mut out).is_err());
        assert!(out.data.is_null());
        assert_eq!(out.len, 0);
    }

    #[test]
    #[serial]
    fn frees_on_null_tokens_are_no_ops() {
        loader::unload();
        factory_free(RawFactory::NULL);
        session_free(RawSession::NULL);
        let mut buffer = RawBuffer::empty();
        buffer_free(&mut buffer);
        assert!(buffer.is_empty());
    }

    #[test]
    #[serial]
    fn interior_nul_is_rejected_before_the_boundary() {
        loader::unload();
        let err = factory_new_with_config("{\"a\":\"b\0c\"}").unwrap_err();
        assert!(matches!(err, BridgeError::InteriorNul(_)));
    }

    #[test]
    fn null_tokens_report_null() {
        assert!(RawFactory::NULL.is_null());
        assert!(RawSession::NULL.is_null());
        assert!(!RawFactory::from_addr(0x1000).is_null());
        assert_eq!(RawSession::from_addr(0x2000).addr(), 0x2000);
    }
}
