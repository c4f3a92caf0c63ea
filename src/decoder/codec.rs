use std::sync::Arc;

use derive_more::Display;

use super::{DecodeError, Report};
use crate::profile::ScannerProfile;

/// The meaning of a single report.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text typed by the report. Empty for reserved keycodes.
    #[display(fmt = "{}", _0)]
    Char(&'a str),
    /// End of the current scan.
    #[display(fmt = "<TERMINATOR>")]
    Terminator,
    /// Shift held with no key.
    #[display(fmt = "<SHIFT>")]
    ShiftPressed,
}

/// Stateless report decoder bound to one [`ScannerProfile`].
#[derive(Debug, Clone)]
pub struct ReportCodec {
    profile: Arc<ScannerProfile>,
}

impl ReportCodec {
    pub fn new(profile: Arc<ScannerProfile>) -> Self {
        ReportCodec { profile }
    }

    pub fn profile(&self) -> &ScannerProfile {
        &self.profile
    }

    /// Decodes a raw report.
    ///
    /// The terminator pattern is tested before the shift pattern, then the keycode is
    /// looked up in the table picked by the modifier's shift bit.
    pub fn decode(&self, bytes: &[u8]) -> Result<Token<'_>, DecodeError> {
        let report = Report::try_from(bytes)?;
        self.decode_report(&report)
    }

    pub fn decode_report(&self, report: &Report) -> Result<Token<'_>, DecodeError> {
        let profile = &*self.profile;
        if profile.terminator.matches(report) {
            return Ok(Token::Terminator);
        }
        if profile.shift.matches(report) {
            return Ok(Token::ShiftPressed);
        }

        let shifted = report.modifier() & profile.shift_bit != 0;
        let keycode = report.keycode();
        profile
            .keys
            .lookup(keycode, shifted)
            .map(Token::Char)
            .ok_or(DecodeError::UnknownKeycode(keycode))
    }
}

impl Default for ReportCodec {
    fn default() -> Self {
        ReportCodec::new(Arc::new(ScannerProfile::default()))
    }
}
