use std::time::Duration;

use rusb::{DeviceDescriptor, DeviceHandle, UsbContext};
use tracing_subscriber::EnvFilter;

/// Initializes the global logging facility.
///
/// If `RUST_LOG` is not set, this function will set the global default logging level to `info`,
/// and for `scanner_usb` it will use a level picked by `verbosity` (0 = `info`, 1 = `debug`,
/// 2 or more = `trace`).
///
/// Log messages are formatted and printed to standard output by `tracing_subscriber::fmt`, as
/// JSON lines when `json_output` is set.
///
/// # Panics
///
/// Panics if the initialization was unsuccessful, likely because a global subscriber was already
/// installed by another call to try_init.
pub fn initialize_logging(json_output: bool, verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,scanner_usb={}", level)));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json_output {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Get a formatted string composed of manufacturer string and product string.
pub fn get_full_device_name<T: UsbContext>(
    handle: &DeviceHandle<T>,
    device_desc: &DeviceDescriptor,
) -> String {
    let timeout = Duration::from_secs(1);
    let language = match handle.read_languages(timeout) {
        Ok(languages) => match languages.first() {
            Some(language) => *language,
            None => return "NA NA".to_string(),
        },
        Err(e) => return format!("{:?}", e),
    };

    format!(
        "{} {}",
        match device_desc.manufacturer_string_index() {
            None => "NA".to_string(),
            Some(_) => handle
                .read_manufacturer_string(language, device_desc, timeout)
                .unwrap_or_else(|e| format!("{:?}", e)),
        },
        match device_desc.product_string_index() {
            None => "NA".to_string(),
            Some(_) => handle
                .read_product_string(language, device_desc, timeout)
                .unwrap_or_else(|e| format!("{:?}", e)),
        },
    )
}
