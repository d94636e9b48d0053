//! msgslot-ffi: C-ABI host integration for msgslot devices.
//!
//! Mirrors a character-device surface: open a device id, select a channel
//! with a control call, read/write whole messages, close. Failures return
//! negative errno values; `msgslot_last_error` gives the message.

mod args;
mod device;
mod error;
mod types;

use std::panic::AssertUnwindSafe;

pub use device::{
    msgslot_close, msgslot_ioctl, msgslot_open, msgslot_read, msgslot_teardown, msgslot_write,
};
pub use types::{
    MsgSlotHandle, MSGSLOT_MAJOR, MSGSLOT_MAX_DEVICES, MSGSLOT_MAX_MSG_LEN, MSG_SLOT_CHANNEL,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[no_mangle]
pub extern "C" fn msgslot_init() -> std::os::raw::c_int {
    ffi_boundary(-libc::EFAULT, || {
        error::clear_error_state();
        0
    })
}

#[no_mangle]
pub extern "C" fn msgslot_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
