//! Typed entry points the engine must export.
//!
//! The engine's C surface is a fixed set of ten symbols. Each has a typed
//! function-pointer alias here, and [`SymbolTable`] binds all of them at load
//! time. Resolution is all-or-nothing: the first missing name aborts with
//! [`BridgeError::MissingSymbol`] and no table is produced, so callers never
//! observe a partially-bound module.

use std::os::raw::{c_char, c_int, c_void};

use libloading::Library;

use crate::buffer::RawBuffer;
use crate::error::BridgeError;

/// `() -> *mut factory` — build a factory from ambient environment config.
pub type FactoryNewFromEnvFn = unsafe extern "C" fn() -> *mut c_void;
/// `(config_json) -> status` — hand a config document to the engine.
pub type ApplyConfigFn = unsafe extern "C" fn(*const c_char) -> c_int;
/// `(config_json) -> *mut factory` — build a factory from a config document.
pub type FactoryNewWithConfigFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
/// `(factory)` — retire a factory.
pub type FactoryFreeFn = unsafe extern "C" fn(*mut c_void);
/// `(factory, partition_id) -> *mut session` — derive a session.
pub type FactoryGetSessionFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_void;
/// `(session)` — retire a session.
pub type SessionFreeFn = unsafe extern "C" fn(*mut c_void);
/// `(session, input, input_len, out) -> status` — encrypt or decrypt.
pub type CryptFn = unsafe extern "C" fn(*mut c_void, *const u8, usize, *mut RawBuffer) -> c_int;
/// `(buffer)` — release an engine-allocated output buffer.
pub type BufferFreeFn = unsafe extern "C" fn(*mut RawBuffer);
/// `() -> *const c_char` — the engine's own last-error diagnostic.
pub type LastErrorMessageFn = unsafe extern "C" fn() -> *const c_char;

pub const SYM_FACTORY_NEW_FROM_ENV: &str = "veil_factory_new_from_env";
pub const SYM_APPLY_CONFIG: &str = "veil_apply_config";
pub const SYM_FACTORY_NEW_WITH_CONFIG: &str = "veil_factory_new_with_config";
pub const SYM_FACTORY_FREE: &str = "veil_factory_free";
pub const SYM_FACTORY_GET_SESSION: &str = "veil_factory_get_session";
pub const SYM_SESSION_FREE: &str = "veil_session_free";
pub const SYM_ENCRYPT: &str = "veil_encrypt";
pub const SYM_DECRYPT: &str = "veil_decrypt";
pub const SYM_BUFFER_FREE: &str = "veil_buffer_free";
pub const SYM_LAST_ERROR_MESSAGE: &str = "veil_last_error_message";

/// Every name the engine must export, in resolution order.
pub const REQUIRED_SYMBOLS: [&str; 10] = [
    SYM_FACTORY_NEW_FROM_ENV,
    SYM_APPLY_CONFIG,
    SYM_FACTORY_NEW_WITH_CONFIG,
    SYM_FACTORY_FREE,
    SYM_FACTORY_GET_SESSION,
    SYM_SESSION_FREE,
    SYM_ENCRYPT,
    SYM_DECRYPT,
    SYM_BUFFER_FREE,
    SYM_LAST_ERROR_MESSAGE,
];

/// The resolved entry points of a loaded module.
///
/// Function pointers are flattened out of their `libloading::Symbol` guards;
/// the owning `Library` is kept alive alongside this table by the loader, so
/// the pointers never outlive the mapped module.
pub(crate) struct SymbolTable {
    pub(crate) factory_new_from_env: FactoryNewFromEnvFn,
    pub(crate) apply_config: ApplyConfigFn,
    pub(crate) factory_new_with_config: FactoryNewWithConfigFn,
    pub(crate) factory_free: FactoryFreeFn,
    pub(crate) factory_get_session: FactoryGetSessionFn,
    pub(crate) session_free: SessionFreeFn,
    pub(crate) encrypt: CryptFn,
    pub(crate) decrypt: CryptFn,
    pub(crate) buffer_free: BufferFreeFn,
    pub(crate) last_error_message: LastErrorMessageFn,
}

impl SymbolTable {
    /// Binds all ten entry points, short-circuiting on the first failure.
    ///
    /// # Safety
    ///
    /// The caller must ensure the module actually exports these names with
    /// the documented signatures; a signature mismatch is undefined behavior
    /// at call time, not at resolution time.
    pub(crate) unsafe fn resolve(lib: &Library) -> Result<Self, BridgeError> {
        Ok(Self {
            factory_new_from_env: resolve(lib, SYM_FACTORY_NEW_FROM_ENV)?,
            apply_config: resolve(lib, SYM_APPLY_CONFIG)?,
            factory_new_with_config: resolve(lib, SYM_FACTORY_NEW_WITH_CONFIG)?,
            factory_free: resolve(lib, SYM_FACTORY_FREE)?,
            factory_get_session: resolve(lib, SYM_FACTORY_GET_SESSION)?,
            session_free: resolve(lib, SYM_SESSION_FREE)?,
            encrypt: resolve(lib, SYM_ENCRYPT)?,
            decrypt: resolve(lib, SYM_DECRYPT)?,
            buffer_free: resolve(lib, SYM_BUFFER_FREE)?,
            last_error_message: resolve(lib, SYM_LAST_ERROR_MESSAGE)?,
        })
    }
}

unsafe fn resolve<T: Copy>(lib: &Library, name: &'static str) -> Result<T, BridgeError> {
    match lib.get::<T>(name.as_bytes()) {
        Ok(symbol) => Ok(*symbol),
        Err(_) => Err(BridgeError::MissingSymbol { symbol: name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn required_symbols_are_distinct() {
        let unique: HashSet<_> = REQUIRED_SYMBOLS.iter().collect();
        assert_eq!(unique.len(), REQUIRED_SYMBOLS.len());
    }

    #[test]
    fn required_symbols_share_the_engine_prefix() {
        assert!(REQUIRED_SYMBOLS.iter().all(|s| s.starts_with("veil_")));
    }
}
