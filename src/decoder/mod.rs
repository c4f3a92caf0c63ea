//! HID keyboard report decoding.
//!
//! A scanner in keyboard-wedge mode "types" every symbol it reads. Each keystroke
//! arrives as one 8-byte boot keyboard report; [`ReportCodec`] turns a report into a
//! [`Token`] and [`Assembler`] joins tokens into the scanned string.

pub mod assembler;
pub mod codec;
pub mod keytable;
pub mod report;

pub use assembler::{Assembler, BlankPolicy};
pub use codec::{ReportCodec, Token};
pub use keytable::KeyTable;
pub use report::{Report, ReportPattern};

use crate::constants::REPORT_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("report should have {len} bytes, got {0}", len = REPORT_LEN)]
    InvalidLength(usize),
    #[error("unexpected keycode {0}")]
    UnknownKeycode(u8),
}
