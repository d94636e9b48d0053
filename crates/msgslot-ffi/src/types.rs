use std::ffi::c_void;
use std::os::raw::{c_uint, c_ulong};

use msgslot_core::{DeviceId, Session, MAX_MSG_LEN};

/// Major number the device range is registered under.
pub const MSGSLOT_MAJOR: c_uint = 240;

/// Number of addressable device ids (minor numbers).
pub const MSGSLOT_MAX_DEVICES: DeviceId = 1 << 20;

/// Maximum message size in bytes.
pub const MSGSLOT_MAX_MSG_LEN: usize = MAX_MSG_LEN;

/// Control command that selects the session's channel.
pub const MSG_SLOT_CHANNEL: c_uint =
    ioc_write(MSGSLOT_MAJOR, 0, std::mem::size_of::<c_ulong>() as c_uint);

const IOC_NRBITS: c_uint = 8;
const IOC_TYPEBITS: c_uint = 8;
const IOC_SIZEBITS: c_uint = 14;
const IOC_WRITE: c_uint = 1;

/// Linux `_IOW(ty, nr, size)` encoding.
const fn ioc_write(ty: c_uint, nr: c_uint, size: c_uint) -> c_uint {
    (IOC_WRITE << (IOC_NRBITS + IOC_TYPEBITS + IOC_SIZEBITS))
        | (size << (IOC_NRBITS + IOC_TYPEBITS))
        | (ty << IOC_NRBITS)
        | nr
}

pub type MsgSlotHandle = *mut c_void;

pub(crate) struct SessionHandle {
    pub(crate) session: Session,
}
