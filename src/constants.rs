use std::time::Duration;

/// Size in bytes of one HID boot keyboard report.
pub const REPORT_LEN: usize = 8;

/// Offset of the modifier byte inside a report.
pub const MODIFIER_OFFSET: usize = 0;

/// Offset of the keycode byte inside a report.
pub const KEYCODE_OFFSET: usize = 2;

/// Left shift bit of the modifier byte.
pub const SHIFT_BIT: u8 = 0x02;

/// HID usage id of the Enter key.
pub const ENTER_KEYCODE: u8 = 40;

/// Delay applied after every retryable read failure.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Intermec's Vendor ID.
pub const INTERMEC_VID: u16 = 0x067e;

/// Intermec SG20 Device Product ID.
pub const SG20_PID: u16 = 0x0809;

/// Honeywell (Metrologic) Vendor ID.
pub const HONEYWELL_VID: u16 = 0x0c2e;

/// Hand Held Products Vendor ID.
pub const HAND_HELD_VID: u16 = 0x0536;

/// Vendors known to ship keyboard-wedge scanners.
pub static SUPPORTED_VIDS: [u16; 3] = [INTERMEC_VID, HONEYWELL_VID, HAND_HELD_VID];
