//! Process-wide loader for the native engine module.
//!
//! Dynamic loading is a process-level resource, so the loaded module lives in
//! a single slot behind an `RwLock`: [`load`] and [`unload`] are the only
//! writers, and every operation takes the read lock for the duration of its
//! native call. Unloading therefore waits for in-flight calls instead of
//! pulling the module out from under them, and [`unload`] still always
//! succeeds.

use std::ffi::CStr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use libloading::Library;

use crate::error::{self, BridgeError, BridgeResult};
use crate::symbols::SymbolTable;

/// A loaded module: the resolved entry points plus the library mapping that
/// keeps them valid. Exists only in the fully-resolved state.
pub(crate) struct NativeModule {
    pub(crate) symbols: SymbolTable,
    _lib: Library,
}

impl NativeModule {
    /// The engine's own diagnostic string, if it has one to offer.
    pub(crate) fn diagnostic(&self) -> Option<String> {
        let ptr = unsafe { (self.symbols.last_error_message)() };
        if ptr.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Like [`NativeModule::diagnostic`], with a placeholder when the engine
    /// has nothing to say. Used to fill the detail field of native errors.
    pub(crate) fn detail(&self) -> String {
        self.diagnostic()
            .unwrap_or_else(|| String::from("no diagnostic available"))
    }
}

static MODULE: RwLock<Option<NativeModule>> = RwLock::new(None);

/// Loads the engine module at `path` and binds its entry points.
///
/// Idempotent: if a module is already loaded this returns `Ok` immediately
/// without re-opening anything, and without switching modules — call
/// [`unload`] first to swap. On any failure the previous state is kept; a
/// first-time load that fails partway closes the module again, so the loader
/// is never half-open.
pub fn load(path: &str) -> BridgeResult<()> {
    let mut slot = write_lock();
    if slot.is_some() {
        return Ok(());
    }
    if path.is_empty() {
        return Err(error::record(BridgeError::EmptyPath));
    }
    let lib = match unsafe { Library::new(path) } {
        Ok(lib) => lib,
        Err(err) => {
            return Err(error::record(BridgeError::OpenFailed {
                path: path.to_string(),
                reason: err.to_string(),
            }));
        }
    };
    let symbols = match unsafe { SymbolTable::resolve(&lib) } {
        Ok(symbols) => symbols,
        Err(err) => {
            // Close the half-open module before reporting.
            drop(lib);
            return Err(error::record(err));
        }
    };
    *slot = Some(NativeModule { symbols, _lib: lib });
    error::clear_local();
    Ok(())
}

/// Closes the module and empties every symbol slot. No-op if nothing is
/// loaded; waits for in-flight native calls to drain first.
pub fn unload() {
    let mut slot = write_lock();
    *slot = None;
}

/// Whether a module is currently loaded.
pub fn is_loaded() -> bool {
    read_lock().is_some()
}

/// Runs `f` against the loaded module, or fails with `NotLoaded`. The read
/// lock is held for the duration of `f`, keeping the module mapped while its
/// entry points execute.
pub(crate) fn with_module<T>(f: impl FnOnce(&NativeModule) -> BridgeResult<T>) -> BridgeResult<T> {
    match try_with_module(f) {
        Some(result) => result,
        None => Err(error::record(BridgeError::NotLoaded)),
    }
}

/// Runs `f` against the loaded module if there is one. Used by the free
/// operations, which are defined as silent no-ops when nothing is loaded.
pub(crate) fn try_with_module<T>(f: impl FnOnce(&NativeModule) -> T) -> Option<T> {
    let slot = read_lock();
    slot.as_ref().map(f)
}

/// The engine diagnostic, read through the lock. `None` when unloaded or the
/// engine reports nothing.
pub(crate) fn module_diagnostic() -> Option<String> {
    let slot = read_lock();
    slot.as_ref().and_then(NativeModule::diagnostic)
}

fn read_lock() -> RwLockReadGuard<'static, Option<NativeModule>> {
    MODULE.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock() -> RwLockWriteGuard<'static, Option<NativeModule>> {
    MODULE.write().unwrap_or_else(PoisonError::into_inner)
}
