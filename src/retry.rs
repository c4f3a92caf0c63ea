//! Failure classification and the fixed-backoff retry policy of the read loop.

use std::time::Duration;

use crate::constants::DEFAULT_BACKOFF;

/// How the read loop treats a failed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Expected while idle. Retried without being reported.
    Benign,
    /// A report that could not be decoded. Reported and skipped, never counted
    /// against the retry limit.
    Skipped,
    /// Reported and retried.
    Transient,
    /// Ends the loop.
    Fatal,
}

/// Classifies a transport error.
///
/// A libusb timeout (`LIBUSB_ERROR_TIMEOUT`, code -7) only means no report arrived.
/// Errors that describe the device going away or the bus hiccuping are transient so
/// an unplugged scanner can come back. Errors that cannot fix themselves are fatal.
pub fn classify(error: &rusb::Error) -> FailureClass {
    match error {
        rusb::Error::Timeout => FailureClass::Benign,
        rusb::Error::Io
        | rusb::Error::Pipe
        | rusb::Error::Overflow
        | rusb::Error::Interrupted
        | rusb::Error::Busy
        | rusb::Error::NoDevice
        | rusb::Error::Other => FailureClass::Transient,
        // Access, InvalidParam, NotFound, NotSupported, NoMem, BadDescriptor.
        _ => FailureClass::Fatal,
    }
}

/// Fixed delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause after each retryable failure.
    pub backoff: Duration,
    /// Consecutive failures tolerated before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(backoff: Duration) -> Self {
        RetryPolicy {
            backoff,
            max_attempts: None,
        }
    }

    pub fn bounded(backoff: Duration, max_attempts: u32) -> Self {
        RetryPolicy {
            backoff,
            max_attempts: Some(max_attempts),
        }
    }

    /// Whether another attempt is allowed after `failures` consecutive failures.
    pub fn allows(&self, failures: u32) -> bool {
        self.max_attempts.map_or(true, |max| failures < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::unbounded(DEFAULT_BACKOFF)
    }
}

/// Waits out a backoff. Swapped for a recording fake in tests.
pub trait Sleeper: Send {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
