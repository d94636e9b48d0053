use std::fmt;
use std::io;

use msgslot_core::{ErrorKind, SlotError};

// Exit codes follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NO_INPUT: i32 = 66;
pub const UNAVAILABLE: i32 = 69;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => NO_INPUT,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Exit code for a failed slot operation.
pub fn slot_error_code(err: &SlotError) -> i32 {
    match err.kind() {
        ErrorKind::Busy => UNAVAILABLE,
        ErrorKind::NotFound => NO_INPUT,
        ErrorKind::NoChannelSelected => USAGE,
        ErrorKind::InvalidState => INTERNAL,
        ErrorKind::InvalidArgument => match err {
            SlotError::InvalidLength { .. } | SlotError::BufferTooSmall { .. } => DATA_INVALID,
            _ => USAGE,
        },
    }
}

pub fn slot_error(context: &str, err: &SlotError) -> CliError {
    CliError::new(slot_error_code(err), format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_errors_map_to_distinct_codes() {
        assert_eq!(slot_error_code(&SlotError::Busy(1)), UNAVAILABLE);
        assert_eq!(
            slot_error_code(&SlotError::InvalidLength { len: 0, max: 128 }),
            DATA_INVALID
        );
        assert_eq!(slot_error_code(&SlotError::InvalidChannel(0)), USAGE);
        assert_eq!(slot_error_code(&SlotError::NoChannelSelected), USAGE);
        assert_eq!(slot_error_code(&SlotError::InvalidState(2)), INTERNAL);
    }

    #[test]
    fn slot_error_keeps_context() {
        let err = slot_error("line 3", &SlotError::Busy(4));
        assert_eq!(err.code, UNAVAILABLE);
        assert_eq!(err.to_string(), "line 3: device 4 is busy");
    }
}
