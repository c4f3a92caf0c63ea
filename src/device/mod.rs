//! USB device access.
//!
//! The read loop and the endpoint selector only talk to the bus through
//! [`UsbTransport`] and [`ReportSource`]. [`usb::RusbTransport`] implements them on
//! top of libusb; tests use the in-memory fakes from [`crate::testing`].

use std::fmt;
use std::time::Duration;

use derive_more::Display;
use rusb::Direction;

pub mod descriptor;
pub mod selector;
pub mod usb;

pub use descriptor::{ConfigNode, DeviceTree, EndpointNode, InterfaceNode, SetupNode};
pub use selector::{find_in_endpoint, select_scanners};

/// Bus position and identity of an attached device.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(
    fmt = "Bus {:03} Device {:03} ID {:04x}:{:04x}",
    bus,
    address,
    vendor_id,
    product_id
)]
pub struct DeviceSummary {
    pub bus: u8,
    pub address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// The endpoint a scanner is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointBinding {
    /// The `bConfigurationValue` of the configuration holding the endpoint.
    pub config: u8,
    pub interface: u8,
    /// The alternate setting number.
    pub setup: u8,
    /// The endpoint number, without the direction bit.
    pub endpoint: u8,
    pub direction: Direction,
    /// Read timeout. Zero waits forever.
    pub timeout: Duration,
}

impl EndpointBinding {
    /// The endpoint address: number plus direction bit.
    pub fn address(&self) -> u8 {
        match self.direction {
            Direction::In => self.endpoint | rusb::constants::LIBUSB_ENDPOINT_IN,
            Direction::Out => self.endpoint,
        }
    }
}

impl fmt::Display for EndpointBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Endpoint Address {:#04x} EP {} {:?} (config {}, iface {}, setting {})",
            self.address(),
            self.endpoint,
            self.direction,
            self.config,
            self.interface,
            self.setup
        )
    }
}

/// A matched device together with the endpoint chosen for it.
///
/// Dropping the handle drops the device, which is how the transport releases it.
#[derive(Debug)]
pub struct ScannerHandle<D> {
    pub device: D,
    pub summary: DeviceSummary,
    pub binding: EndpointBinding,
}

/// The transport capabilities the scanner core relies on.
pub trait UsbTransport {
    type Device;
    type Endpoint: ReportSource;

    /// Returns every attached device whose summary satisfies `predicate`.
    fn list_devices(
        &self,
        predicate: &dyn Fn(&DeviceSummary) -> bool,
    ) -> rusb::Result<Vec<Self::Device>>;

    fn summary(&self, device: &Self::Device) -> DeviceSummary;

    /// Reads the full configuration/interface/setting/endpoint tree of a device.
    fn device_tree(&self, device: &Self::Device) -> rusb::Result<DeviceTree>;

    /// Detaches a kernel driver holding `interface`, where the platform has one.
    fn detach_kernel_driver(&self, device: &Self::Device, interface: u8) -> rusb::Result<()>;

    /// Claims the bound interface and opens its endpoint for reading.
    fn open_endpoint(
        &self,
        device: &Self::Device,
        binding: &EndpointBinding,
    ) -> rusb::Result<Self::Endpoint>;
}

/// A blocking source of raw reports.
pub trait ReportSource {
    /// Reads one transfer into `buf`, returning the number of bytes received.
    fn read(&mut self, buf: &mut [u8]) -> rusb::Result<usize>;
}
