use std::os::raw::{c_int, c_long, c_uint, c_ulong};
use std::sync::LazyLock;

use msgslot_core::{DeviceRegistry, RegistryConfig};

use crate::args;
use crate::error;
use crate::types::{MsgSlotHandle, SessionHandle, MSGSLOT_MAX_DEVICES, MSG_SLOT_CHANNEL};

static REGISTRY: LazyLock<DeviceRegistry> = LazyLock::new(|| {
    DeviceRegistry::with_config(RegistryConfig::with_device_limit(MSGSLOT_MAX_DEVICES))
});

fn with_session<T>(
    handle: MsgSlotHandle,
    on_error: T,
    f: impl FnOnce(&mut SessionHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("session handle cannot be null");
        return on_error;
    }

    let session_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut SessionHandle) }
    };

    f(session_handle)
}

/// Open a session on `device_id` and store its handle in `out_handle`.
///
/// Returns 0, or a negative errno (`-EBUSY` when the device is already open).
///
/// # Safety
/// `out_handle` must be a non-null pointer writable for one handle.
#[no_mangle]
pub unsafe extern "C" fn msgslot_open(device_id: u32, out_handle: *mut MsgSlotHandle) -> c_int {
    crate::ffi_boundary(-libc::EFAULT, || {
        error::clear_error_state();

        if out_handle.is_null() {
            return error::set_invalid_argument("out_handle cannot be null");
        }

        match REGISTRY.open(device_id) {
            Ok(session) => {
                let handle = Box::into_raw(Box::new(SessionHandle { session })) as MsgSlotHandle;
                // SAFETY: Checked non-null above; caller guarantees it is writable.
                unsafe { *out_handle = handle };
                0
            }
            Err(err) => error::map_slot_error(&err),
        }
    })
}

/// Out-of-band control call. Only [`MSG_SLOT_CHANNEL`] is understood; its
/// parameter is the channel to select.
///
/// # Safety
/// `handle` must be a live handle returned by `msgslot_open`.
#[no_mangle]
pub unsafe extern "C" fn msgslot_ioctl(
    handle: MsgSlotHandle,
    command: c_uint,
    param: c_ulong,
) -> c_long {
    crate::ffi_boundary(-c_long::from(libc::EFAULT), || {
        error::clear_error_state();

        if command != MSG_SLOT_CHANNEL {
            tracing::debug!(command, "rejecting unknown control command");
            return c_long::from(error::set_invalid_argument(format!(
                "unknown control command {command:#x}"
            )));
        }

        let invalid = c_long::from(-libc::EINVAL);
        with_session(handle, invalid, |h| {
            let raw = match i64::try_from(param) {
                Ok(raw) => raw,
                Err(_) => {
                    return c_long::from(error::set_invalid_argument(format!(
                        "invalid channel id {param}"
                    )))
                }
            };
            match h.session.select_channel(raw) {
                Ok(()) => 0,
                Err(err) => c_long::from(error::map_slot_error(&err)),
            }
        })
    })
}

/// Replace the selected channel's message with `len` bytes from `data`.
///
/// Returns `len`, or a negative errno.
///
/// # Safety
/// `handle` must be a live handle. If `len > 0`, `data` must be readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn msgslot_write(
    handle: MsgSlotHandle,
    data: *const u8,
    len: usize,
) -> isize {
    crate::ffi_boundary(-(libc::EFAULT as isize), || {
        error::clear_error_state();

        let invalid = -(libc::EINVAL as isize);
        with_session(handle, invalid, |h| {
            let payload = {
                // SAFETY: We validate pointer/length pairing in helper.
                match unsafe { args::bytes_arg(data, len, "data") } {
                    Some(v) => v,
                    None => return invalid,
                }
            };

            match h.session.write(payload) {
                Ok(written) => written as isize,
                Err(err) => error::map_slot_error(&err) as isize,
            }
        })
    })
}

/// Copy the selected channel's message into `buf` (capacity `len`).
///
/// Returns the message length, or a negative errno. Nothing is written to
/// `buf` on failure.
///
/// # Safety
/// `handle` must be a live handle. If `len > 0`, `buf` must be writable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn msgslot_read(handle: MsgSlotHandle, buf: *mut u8, len: usize) -> isize {
    crate::ffi_boundary(-(libc::EFAULT as isize), || {
        error::clear_error_state();

        let invalid = -(libc::EINVAL as isize);
        with_session(handle, invalid, |h| {
            let out = {
                // SAFETY: We validate pointer/length pairing in helper.
                match unsafe { args::bytes_out_arg(buf, len, "buf") } {
                    Some(v) => v,
                    None => return invalid,
                }
            };

            match h.session.read_into(out) {
                Ok(read) => read as isize,
                Err(err) => error::map_slot_error(&err) as isize,
            }
        })
    })
}

/// Close a session and free its handle. Stored messages are kept.
///
/// # Safety
/// `handle` must be a handle returned by `msgslot_open` and not already closed.
#[no_mangle]
pub unsafe extern "C" fn msgslot_close(handle: MsgSlotHandle) -> c_int {
    crate::ffi_boundary(-libc::EFAULT, || {
        error::clear_error_state();

        if handle.is_null() {
            return error::set_invalid_argument("session handle cannot be null");
        }

        // SAFETY: Caller guarantees this handle was allocated by msgslot_open.
        let boxed = unsafe { Box::from_raw(handle as *mut SessionHandle) };
        match boxed.session.close() {
            Ok(()) => 0,
            Err(err) => error::map_slot_error(&err),
        }
    })
}

/// Release every device's messages. Call once at shutdown.
#[no_mangle]
pub extern "C" fn msgslot_teardown() {
    crate::ffi_boundary((), || {
        let released = REGISTRY.teardown();
        tracing::debug!(released, "host teardown");
    });
}
