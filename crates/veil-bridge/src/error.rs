//! Error channel for the bridge.
//!
//! Failures surface through two tiers. The engine keeps its own diagnostic
//! string behind the `veil_last_error_message` symbol; the bridge keeps a
//! bounded, process-wide string for failures that happen on this side of the
//! boundary (load failures, precondition violations). [`last_error`] reads
//! the engine's diagnostic first and falls back to the local string, so the
//! most specific description available wins.
//!
//! Only bridge-local failures are recorded into the local string. Native
//! failures already speak through the engine's own channel and are carried
//! verbatim inside [`BridgeError::Native`] / [`BridgeError::ConstructFailed`].

use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Upper bound on the retained local error text, in bytes.
const LOCAL_ERROR_CAP: usize = 512;

/// Returned when neither tier has anything to report.
const FALLBACK_ERROR: &str = "veil-bridge: unknown error";

/// Most recent bridge-local failure description. Overwritten, never appended.
static LOCAL_ERROR: Mutex<String> = Mutex::new(String::new());

/// Errors produced by the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// `load` was called with an empty module path.
    #[error("module path was empty")]
    EmptyPath,

    /// The dynamic loader could not open the module file.
    #[error("failed to open native module `{path}`: {reason}")]
    OpenFailed { path: String, reason: String },

    /// A required entry point was absent from the module.
    #[error("native module is missing symbol `{symbol}`")]
    MissingSymbol { symbol: &'static str },

    /// An operation was invoked before a successful `load`.
    #[error("native module is not loaded")]
    NotLoaded,

    /// A factory token was null where a live factory was required.
    #[error("factory handle was null")]
    NullFactory,

    /// A session token was null where a live session was required.
    #[error("session handle was null")]
    NullSession,

    /// A string argument cannot cross the boundary as a C string.
    #[error("string argument contains an interior nul byte")]
    InteriorNul(#[from] std::ffi::NulError),

    /// Configuration could not be serialized to JSON.
    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] serde_json::Error),

    /// A native constructor returned a null handle.
    #[error("native {operation} returned a null handle: {detail}")]
    ConstructFailed {
        operation: &'static str,
        detail: String,
    },

    /// A native call reported failure through its status code.
    #[error("native {operation} failed with status {status}: {detail}")]
    Native {
        operation: &'static str,
        status: i32,
        detail: String,
    },
}

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Returns the most specific error description currently available.
///
/// Priority order: the engine's own diagnostic (if the module is loaded and
/// the string is non-empty), then the bridge-local error, then a generic
/// fallback. Never returns an empty string.
pub fn last_error() -> String {
    if let Some(native) = crate::loader::module_diagnostic() {
        return native;
    }
    let local = lock_local();
    if !local.is_empty() {
        return local.clone();
    }
    FALLBACK_ERROR.to_string()
}

/// Records a bridge-local failure into the bounded local slot and hands the
/// error back, so call sites can `return Err(record(..))` in one step.
pub(crate) fn record(err: BridgeError) -> BridgeError {
    *lock_local() = bounded(err.to_string());
    err
}

/// Empties the local slot. Done by a successful `load`.
pub(crate) fn clear_local() {
    lock_local().clear();
}

fn lock_local() -> std::sync::MutexGuard<'static, String> {
    LOCAL_ERROR.lock().unwrap_or_else(PoisonError::into_inner)
}

fn bounded(mut text: String) -> String {
    if text.len() > LOCAL_ERROR_CAP {
        let mut cut = LOCAL_ERROR_CAP;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
