//! Deliberately incomplete veil engine.
//!
//! Exports only the environment constructor and none of the other nine
//! entry points, so loading it must fail symbol resolution at
//! `veil_apply_config` and leave the loader empty.

use std::os::raw::c_void;
use std::ptr::null_mut;

#[no_mangle]
pub extern "C" fn veil_factory_new_from_env() -> *mut c_void {
    null_mut()
}
