//! Stand-in veil engine for integration tests.
//!
//! Exports the full ten-symbol C surface with a toy reversible transform in
//! place of real envelope encryption: payloads are framed with a magic tag
//! and the partition identifier, and the body is XOR-masked with a key
//! derived from configuration. Good enough to drive every bridge code path —
//! including native failures, whose diagnostics flow through
//! `veil_last_error_message` exactly like the real engine's.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::null_mut;

const MAGIC: &[u8; 4] = b"VEIL";
const KEY_ENV_VAR: &str = "VEIL_MASTER_KEY_HEX";

#[repr(C)]
pub struct VeilBuffer {
    pub data: *mut u8,
    pub len: usize,
}

struct Factory {
    key: u8,
}

struct Session {
    key: u8,
    partition: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_error(msg: impl Into<String>) {
    let text = CString::new(msg.into()).unwrap_or_else(|_| CString::new("error").unwrap());
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(text));
}

fn clear_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

fn fold_key(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0x5a, |acc, b| acc ^ b)
}

fn master_key_from_env() -> Result<u8, String> {
    let hex = std::env::var(KEY_ENV_VAR).map_err(|_| format!("{KEY_ENV_VAR} is not set"))?;
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("{KEY_ENV_VAR} is not valid hex"));
    }
    Ok(fold_key(hex.as_bytes()))
}

unsafe fn cstr_to_str<'a>(s: *const c_char) -> Result<&'a str, String> {
    if s.is_null() {
        return Err("null string argument".to_string());
    }
    CStr::from_ptr(s)
        .to_str()
        .map_err(|_| "string argument is not UTF-8".to_string())
}

fn take_vec_into_buffer(v: Vec<u8>, out: *mut VeilBuffer) -> c_int {
    let boxed = v.into_boxed_slice();
    let len = boxed.len();
    let data = Box::into_raw(boxed) as *mut u8;
    unsafe {
        *out = VeilBuffer { data, len };
    }
    0
}

#[no_mangle]
pub extern "C" fn veil_factory_new_from_env() -> *mut c_void {
    match master_key_from_env() {
        Ok(key) => {
            clear_error();
            Box::into_raw(Box::new(Factory { key })) as *mut c_void
        }
        Err(msg) => {
            set_error(msg);
            null_mut()
        }
    }
}

/// # Safety
/// `config_json` must be null or a valid, null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn veil_apply_config(config_json: *const c_char) -> c_int {
    match cstr_to_str(config_json) {
        Ok(cfg) if !cfg.is_empty() => {
            clear_error();
            0
        }
        Ok(_) => {
            set_error("config document was empty");
            -1
        }
        Err(msg) => {
            set_error(msg);
            -1
        }
    }
}

/// # Safety
/// `config_json` must be null or a valid, null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn veil_factory_new_with_config(config_json: *const c_char) -> *mut c_void {
    let cfg = match cstr_to_str(config_json) {
        Ok(cfg) => cfg,
        Err(msg) => {
            set_error(msg);
            return null_mut();
        }
    };
    if cfg.is_empty() {
        set_error("config document was empty");
        return null_mut();
    }
    clear_error();
    let key = fold_key(cfg.as_bytes());
    Box::into_raw(Box::new(Factory { key })) as *mut c_void
}

/// # Safety
/// `ptr` must be null or a factory pointer obtained from this module.
#[no_mangle]
pub unsafe extern "C" fn veil_factory_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    drop(Box::from_raw(ptr as *mut Factory));
}

/// # Safety
/// `factory` must be null or a live factory pointer; `partition_id` must be
/// null or a valid, null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn veil_factory_get_session(
    factory: *mut c_void,
    partition_id: *const c_char,
) -> *mut c_void {
    if factory.is_null() {
        set_error("null factory");
        return null_mut();
    }
    let partition = match cstr_to_str(partition_id) {
        Ok(p) => p,
        Err(msg) => {
            set_error(msg);
            return null_mut();
        }
    };
    if partition.is_empty() {
        set_error("partition id was empty");
        return null_mut();
    }
    clear_error();
    let factory = &*(factory as *mut Factory);
    Box::into_raw(Box::new(Session {
        key: factory.key,
        partition: partition.to_string(),
    })) as *mut c_void
}

/// # Safety
/// `ptr` must be null or a session pointer obtained from this module.
#[no_mangle]
pub unsafe extern "C" fn veil_session_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    drop(Box::from_raw(ptr as *mut Session));
}

/// # Safety
/// `session` must be a live session pointer, `data` must reference `len`
/// readable bytes, and `out` must be non-null.
#[no_mangle]
pub unsafe extern "C" fn veil_encrypt(
    session: *mut c_void,
    data: *const u8,
    len: usize,
    out: *mut VeilBuffer,
) -> c_int {
    if session.is_null() {
        set_error("null session");
        return -1;
    }
    if out.is_null() {
        set_error("null output buffer");
        return -1;
    }
    if data.is_null() && len > 0 {
        set_error("null data");
        return -1;
    }
    let session = &*(session as *mut Session);
    let plaintext = std::slice::from_raw_parts(data, len);

    let partition = session.partition.as_bytes();
    let mut framed = Vec::with_capacity(MAGIC.len() + 4 + partition.len() + plaintext.len());
    framed.extend_from_slice(MAGIC);
    framed.extend_from_slice(&(partition.len() as u32).to_le_bytes());
    framed.extend_from_slice(partition);
    framed.extend(plaintext.iter().map(|b| b ^ session.key));
    clear_error();
    take_vec_into_buffer(framed, out)
}

/// # Safety
/// Same contract as `veil_encrypt`, with `data` holding a framed payload.
#[no_mangle]
pub unsafe extern "C" fn veil_decrypt(
    session: *mut c_void,
    data: *const u8,
    len: usize,
    out: *mut VeilBuffer,
) -> c_int {
    if session.is_null() {
        set_error("null session");
        return -1;
    }
    if out.is_null() {
        set_error("null output buffer");
        return -1;
    }
    if data.is_null() && len > 0 {
        set_error("null data");
        return -1;
    }
    let session = &*(session as *mut Session);
    let payload = std::slice::from_raw_parts(data, len);

    if payload.len() < MAGIC.len() + 4 || &payload[..MAGIC.len()] != MAGIC {
        set_error("payload corrupt: bad magic");
        return -1;
    }
    let mut offset = MAGIC.len();
    let mut partition_len = [0u8; 4];
    partition_len.copy_from_slice(&payload[offset..offset + 4]);
    let partition_len = u32::from_le_bytes(partition_len) as usize;
    offset += 4;
    if payload.len() < offset + partition_len {
        set_error("payload corrupt: truncated partition");
        return -1;
    }
    let partition = &payload[offset..offset + partition_len];
    if partition != session.partition.as_bytes() {
        set_error(format!(
            "partition mismatch: payload was sealed for another partition than {}",
            session.partition
        ));
        return -1;
    }
    offset += partition_len;
    let plaintext: Vec<u8> = payload[offset..].iter().map(|b| b ^ session.key).collect();
    clear_error();
    take_vec_into_buffer(plaintext, out)
}

/// # Safety
/// `buf` must be null or point to a `VeilBuffer` populated by this module.
#[no_mangle]
pub unsafe extern "C" fn veil_buffer_free(buf: *mut VeilBuffer) {
    if buf.is_null() {
        return;
    }
    let buf = &mut *buf;
    if !buf.data.is_null() && buf.len > 0 {
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            buf.data, buf.len,
        )));
    }
    buf.data = null_mut();
    buf.len = 0;
}

#[no_mangle]
pub extern "C" fn veil_last_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|msg| msg.as_ptr())
            .unwrap_or(std::ptr::null())
    })
}
