//! Reads barcodes from USB HID keyboard-wedge scanners.
//!
//! A scanner in keyboard mode (in Honeywell and Intermec user guides: "USB HID keyboard" or
//! "USB KBW") presents itself as a boot keyboard and types every symbol it reads, followed by a
//! terminator. Each keystroke arrives as an 8-byte report on the device's interrupt IN endpoint:
//!
//! ```text
//! [modifier, reserved, keycode, reserved, reserved, reserved, reserved, reserved]
//! ```
//!
//! Bit 1 of the modifier byte is the left shift key and picks between the plain and the shifted
//! key table.
//!
//! [`device::select_scanners`] finds the scanners on the bus and their IN endpoints,
//! [`server::ScanReader`] reads reports from one of them, and the [`decoder`] turns those reports
//! back into the scanned text.
//!
//! ```
//! use std::sync::Arc;
//!
//! use scanner_usb::profile::ScannerProfile;
//! use scanner_usb::retry::RetryPolicy;
//! use scanner_usb::server::ScanReader;
//! use scanner_usb::testing::{RecordingSleeper, ScriptedRead, ScriptedSource};
//!
//! let source = ScriptedSource::new(vec![
//!     ScriptedRead::Data(vec![0, 0, 30, 0, 0, 0, 0, 0]),
//!     ScriptedRead::Data(vec![2, 0, 30, 0, 0, 0, 0, 0]),
//!     ScriptedRead::Data(vec![0; 8]),
//! ]);
//! let mut reader = ScanReader::new(source, Arc::new(ScannerProfile::us_keyboard()), RetryPolicy::default())
//!     .with_sleeper(RecordingSleeper::default());
//! assert_eq!(reader.read_scan().unwrap(), "1!");
//! ```

pub mod config;
pub mod constants;
pub mod decoder;
pub mod device;
pub mod devices;
pub mod error;
pub mod profile;
pub mod retry;
pub mod server;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tools;

pub use devices::DeviceMatcher;
pub use error::{Error, Result};
pub use profile::ScannerProfile;
pub use server::{scan_channel, spawn_reader, ReaderTask, ScanReader, ShutdownSignal};
