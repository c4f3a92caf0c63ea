use crate::constants::REPORT_LEN;
use crate::decoder::DecodeError;
use crate::devices::DeviceMatcher;
use crate::profile::ProfileError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no device matches {0}")]
    DeviceNotFound(DeviceMatcher),
    #[error("data read from endpoint is not complete: got {actual} of {len} bytes", len = REPORT_LEN)]
    IncompleteRead { actual: usize },
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("USB: {0}")]
    Usb(#[from] rusb::Error),
    #[error("gave up after {attempts} consecutive failed reads, last: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },
    #[error("profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("reader thread panicked")]
    ReaderPanicked,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
