use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};

use msgslot_core::SlotError;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::new("").expect("empty CString should be valid"));
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new("").expect("empty CString should be valid");
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized)
            .unwrap_or_else(|_| CString::new("internal error").expect("literal is valid"));
    });
}

/// Record `message` and return `-EINVAL`.
pub(crate) fn set_invalid_argument(message: impl Into<String>) -> c_int {
    set_error_message(message);
    -libc::EINVAL
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

/// Positive errno for a core error.
pub(crate) fn errno_for(err: &SlotError) -> c_int {
    match err {
        SlotError::Busy(_) => libc::EBUSY,
        SlotError::InvalidChannel(_)
        | SlotError::DeviceOutOfRange { .. }
        | SlotError::NoChannelSelected => libc::EINVAL,
        SlotError::InvalidLength { .. } => libc::EMSGSIZE,
        SlotError::BufferTooSmall { .. } => libc::ENOSPC,
        SlotError::NotFound(_) => libc::EWOULDBLOCK,
        SlotError::InvalidState(_) => libc::EIO,
    }
}

/// Record `err` and return it as a negative errno.
pub(crate) fn map_slot_error(err: &SlotError) -> c_int {
    set_error_message(err.to_string());
    -errno_for(err)
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
