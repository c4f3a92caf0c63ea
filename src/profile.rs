//! Scanner profiles: the immutable decoding data injected into a [`ReportCodec`].
//!
//! A profile bundles the keycode tables with the two control patterns, so scanners
//! with different layouts or terminator conventions can be read side by side.
//!
//! ```toml
//! name = "warehouse"
//! blank = "keep"
//! terminator = [0, 0, 40, 0, 0, 0, 0, 0]
//!
//! [keys]
//! unshifted = ["", "", "", "", "a", "b"]
//! shifted = ["", "", "", "", "A", "B"]
//! ```
//!
//! [`ReportCodec`]: crate::decoder::ReportCodec

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::SHIFT_BIT;
use crate::decoder::{BlankPolicy, KeyTable, ReportPattern};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid profile: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("terminator and shift patterns must differ, both are {0:?}")]
    AmbiguousPatterns(ReportPattern),
    #[error("shift bit must be a single modifier bit, got {0:#04x}")]
    InvalidShiftBit(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerProfile {
    pub name: String,
    pub keys: KeyTable,
    /// Report that closes a scan.
    pub terminator: ReportPattern,
    /// Report that carries only the shift modifier.
    pub shift: ReportPattern,
    /// Modifier bit selecting the shifted table.
    pub shift_bit: u8,
    pub blank: BlankPolicy,
}

impl ScannerProfile {
    /// US keyboard layout, all-keys-released report as terminator.
    pub fn us_keyboard() -> Self {
        ScannerProfile {
            name: "us-keyboard".to_string(),
            keys: KeyTable::us_english(),
            terminator: ReportPattern::ALL_RELEASED,
            shift: ReportPattern::SHIFT_ONLY,
            shift_bit: SHIFT_BIT,
            blank: BlankPolicy::Drop,
        }
    }

    /// US keyboard layout for firmware that ends each symbol with an Enter keystroke.
    pub fn legacy_enter() -> Self {
        ScannerProfile {
            name: "legacy-enter".to_string(),
            terminator: ReportPattern::ENTER,
            ..ScannerProfile::us_keyboard()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ProfileError> {
        let profile: ScannerProfile = toml::from_str(source)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        debug!("Loading scanner profile from {}.", path.display());
        let source = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.terminator == self.shift {
            return Err(ProfileError::AmbiguousPatterns(self.terminator));
        }
        if self.shift_bit.count_ones() != 1 {
            return Err(ProfileError::InvalidShiftBit(self.shift_bit));
        }
        Ok(())
    }
}

impl Default for ScannerProfile {
    fn default() -> Self {
        ScannerProfile::us_keyboard()
    }
}
