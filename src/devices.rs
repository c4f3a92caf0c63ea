use std::fmt::Debug;

use derive_more::Display;

use crate::device::DeviceSummary;

/// Identifies which attached USB devices should be treated as scanners.
#[derive(Debug, Display, Eq, PartialEq, Hash, Clone, Copy)]
pub enum DeviceMatcher {
    /// Any product from the given vendor ID (vid).
    #[display(fmt = "Vid {{ vid: {:04x?} }}", vid)]
    Vid { vid: u16 },

    /// A device matching a vendor ID (vid) and a product ID (pid).
    #[display(fmt = "VidPid {{ vid: {:04x?}, pid: {:04x?} }}", vid, pid)]
    VidPid { vid: u16, pid: u16 },
}

impl DeviceMatcher {
    /// Builds a matcher where a zero product ID means "any product".
    pub fn new(vid: u16, pid: u16) -> Self {
        if pid == 0 {
            DeviceMatcher::Vid { vid }
        } else {
            DeviceMatcher::VidPid { vid, pid }
        }
    }

    pub fn product_id(&self) -> Option<u16> {
        match *self {
            DeviceMatcher::Vid { .. } => None,
            DeviceMatcher::VidPid { pid, .. } => Some(pid),
        }
    }

    pub fn matches(&self, device: &DeviceSummary) -> bool {
        match *self {
            DeviceMatcher::Vid { vid } => device.vendor_id == vid,
            DeviceMatcher::VidPid { vid, pid } => {
                device.vendor_id == vid && device.product_id == pid
            }
        }
    }
}

impl Default for DeviceMatcher {
    fn default() -> Self {
        DeviceMatcher::VidPid {
            vid: crate::constants::INTERMEC_VID,
            pid: crate::constants::SG20_PID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(vendor_id: u16, product_id: u16) -> DeviceSummary {
        DeviceSummary {
            bus: 1,
            address: 4,
            vendor_id,
            product_id,
        }
    }

    #[test]
    fn zero_product_id_matches_any_product_of_the_vendor() {
        let matcher = DeviceMatcher::new(0x0c2e, 0);
        assert_eq!(matcher, DeviceMatcher::Vid { vid: 0x0c2e });
        assert!(matcher.matches(&summary(0x0c2e, 0x0200)));
        assert!(matcher.matches(&summary(0x0c2e, 0x0b61)));
        assert!(!matcher.matches(&summary(0x0536, 0x0200)));
    }

    #[test]
    fn vid_pid_requires_both() {
        let matcher = DeviceMatcher::new(0x0536, 0x0461);
        assert!(matcher.matches(&summary(0x0536, 0x0461)));
        assert!(!matcher.matches(&summary(0x0536, 0x0462)));
        assert_eq!(matcher.product_id(), Some(0x0461));
    }

    #[test]
    fn display_uses_hex_ids() {
        let matcher = DeviceMatcher::new(0x067e, 0x0809);
        assert_eq!(matcher.to_string(), "VidPid { vid: 067e, pid: 0809 }");
    }
}
