use std::fmt;

use serde::{Deserialize, Serialize};

use super::DecodeError;
use crate::constants::{ENTER_KEYCODE, KEYCODE_OFFSET, MODIFIER_OFFSET, REPORT_LEN, SHIFT_BIT};

/// One HID boot keyboard report: `[modifier, reserved, keycode, reserved x5]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Report([u8; REPORT_LEN]);

impl Report {
    pub const fn new(bytes: [u8; REPORT_LEN]) -> Self {
        Report(bytes)
    }

    pub fn modifier(&self) -> u8 {
        self.0[MODIFIER_OFFSET]
    }

    pub fn keycode(&self) -> u8 {
        self.0[KEYCODE_OFFSET]
    }
}

impl TryFrom<&[u8]> for Report {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; REPORT_LEN]>::try_from(bytes)
            .map(Report)
            .map_err(|_| DecodeError::InvalidLength(bytes.len()))
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Report({:02x?})", self.0)
    }
}

/// A full report that carries a control meaning when matched exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportPattern([u8; REPORT_LEN]);

impl ReportPattern {
    /// No modifier, no key: the "all keys released" report.
    pub const ALL_RELEASED: ReportPattern = ReportPattern([0; REPORT_LEN]);

    /// Left shift held with no key.
    pub const SHIFT_ONLY: ReportPattern = ReportPattern([SHIFT_BIT, 0, 0, 0, 0, 0, 0, 0]);

    /// Enter pressed with no modifier. Older scanner firmware ends a symbol with it.
    pub const ENTER: ReportPattern = ReportPattern([0, 0, ENTER_KEYCODE, 0, 0, 0, 0, 0]);

    pub const fn new(bytes: [u8; REPORT_LEN]) -> Self {
        ReportPattern(bytes)
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.0 == report.0
    }
}

impl fmt::Debug for ReportPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReportPattern({:02x?})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_come_from_fixed_offsets() {
        let report = Report::new([2, 9, 30, 0, 0, 0, 0, 0]);
        assert_eq!(report.modifier(), 2);
        assert_eq!(report.keycode(), 30);
    }

    #[test]
    fn rejects_wrong_lengths() {
        let short: &[u8] = &[0, 0, 30];
        assert_eq!(Report::try_from(short), Err(DecodeError::InvalidLength(3)));
        let long: &[u8] = &[0; 9];
        assert_eq!(Report::try_from(long), Err(DecodeError::InvalidLength(9)));
    }

    #[test]
    fn patterns_compare_every_byte() {
        assert!(ReportPattern::ALL_RELEASED.matches(&Report::new([0; 8])));
        assert!(!ReportPattern::ALL_RELEASED.matches(&Report::new([0, 0, 0, 0, 1, 0, 0, 0])));
        assert!(ReportPattern::SHIFT_ONLY.matches(&Report::new([2, 0, 0, 0, 0, 0, 0, 0])));
        assert!(!ReportPattern::SHIFT_ONLY.matches(&Report::new([0, 0, 0, 0, 1, 0, 0, 0])));
    }
}
