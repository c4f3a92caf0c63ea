use std::path::PathBuf;
use std::time::Duration;

use crate::devices::DeviceMatcher;
use crate::retry::RetryPolicy;

/// Parses a USB ID given as hex (`0x0c2e`) or decimal (`3118`).
pub fn parse_usb_id(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid USB id {:?}: {}", value, e))
}

/// Reads barcodes from a USB HID keyboard-wedge scanner.
#[derive(clap::Parser, Debug, Clone)]
#[command(name = "scanner-usb", version)]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json: bool,
    /// Scanner vendor ID.
    #[arg(long, default_value = "0x067e", value_parser = parse_usb_id)]
    pub vendor_id: u16,
    /// Scanner product ID. 0 accepts any product of the vendor.
    #[arg(long, default_value = "0x0809", value_parser = parse_usb_id)]
    pub product_id: u16,
    /// TOML scanner profile with custom key tables or control patterns.
    #[arg(long, conflicts_with = "legacy_enter")]
    pub profile: Option<PathBuf>,
    /// Treat the Enter keystroke, not the key-release report, as end of scan.
    #[arg(long)]
    pub legacy_enter: bool,
    /// Read a single scan, print it and exit.
    #[arg(long)]
    pub once: bool,
    /// Pause after a failed read, in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub backoff_ms: u64,
    /// Give up after this many consecutive failed reads. Retries forever by default.
    #[arg(long)]
    pub max_attempts: Option<u32>,
    /// List attached USB devices and exit.
    #[arg(long)]
    pub list: bool,
}

impl Config {
    pub fn matcher(&self) -> DeviceMatcher {
        DeviceMatcher::new(self.vendor_id, self.product_id)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            backoff: Duration::from_millis(self.backoff_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn usb_ids_accept_hex_and_decimal() {
        assert_eq!(parse_usb_id("0x0c2e"), Ok(0x0c2e));
        assert_eq!(parse_usb_id("0X0536"), Ok(0x0536));
        assert_eq!(parse_usb_id("1234"), Ok(1234));
        assert!(parse_usb_id("0xfffff").is_err());
        assert!(parse_usb_id("scanner").is_err());
    }

    #[test]
    fn defaults_target_the_sg20() {
        let cfg = Config::try_parse_from(["scanner-usb"]).unwrap();
        assert_eq!(cfg.matcher(), DeviceMatcher::default());
        assert_eq!(cfg.retry_policy(), RetryPolicy::default());
        assert!(!cfg.once);
    }

    #[test]
    fn zero_product_id_matches_the_whole_vendor() {
        let cfg =
            Config::try_parse_from(["scanner-usb", "--vendor-id", "0x0c2e", "--product-id", "0"])
                .unwrap();
        assert_eq!(cfg.matcher(), DeviceMatcher::Vid { vid: 0x0c2e });
    }

    #[test]
    fn retry_flags_build_a_bounded_policy() {
        let cfg = Config::try_parse_from([
            "scanner-usb",
            "--backoff-ms",
            "20",
            "--max-attempts",
            "4",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cfg.retry_policy(), RetryPolicy::bounded(Duration::from_millis(20), 4));
        assert_eq!(cfg.verbose, 2);
    }

    #[test]
    fn profile_and_legacy_enter_conflict() {
        let result =
            Config::try_parse_from(["scanner-usb", "--profile", "p.toml", "--legacy-enter"]);
        assert!(result.is_err());
    }
}
