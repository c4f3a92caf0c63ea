use std::fmt::{Debug, Error, Formatter};
use std::sync::Arc;
use std::time::Duration;

use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Speed, TransferType, UsbContext};
use tracing::{debug, error, info, warn};

use super::{
    ConfigNode, DeviceSummary, DeviceTree, EndpointBinding, EndpointNode, InterfaceNode,
    ReportSource, SetupNode, UsbTransport,
};
use crate::tools::get_full_device_name;

/// Convert the USB speed to a human readable value.
pub fn speed_as_str(speed: &Speed) -> &'static str {
    match speed {
        Speed::Low => "1.5 Mbps",
        Speed::Full => "12 Mbps",
        Speed::High => "480 Mbps",
        Speed::Super => "5000 Mbps",
        _ => "(unknown)",
    }
}

fn summarize<T: UsbContext>(device: &Device<T>, desc: &DeviceDescriptor) -> DeviceSummary {
    DeviceSummary {
        bus: device.bus_number(),
        address: device.address(),
        vendor_id: desc.vendor_id(),
        product_id: desc.product_id(),
    }
}

/// An opened USB device.
pub struct UsbDeviceHandle<T: UsbContext> {
    pub device: Device<T>,
    pub device_desc: DeviceDescriptor,
    pub handle: Arc<DeviceHandle<T>>,
}

impl<T: UsbContext> Debug for UsbDeviceHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "UsbDeviceHandle {{ device_desc: {:?} }}", self.device_desc)
    }
}

/// One line of `--list` output.
#[derive(Debug, Clone)]
pub struct DeviceListing {
    pub summary: DeviceSummary,
    pub name: Option<String>,
    pub speed: &'static str,
    pub tree: Option<DeviceTree>,
}

/// [`UsbTransport`] backed by libusb.
pub struct RusbTransport<T: UsbContext> {
    context: T,
}

impl RusbTransport<Context> {
    pub fn new() -> rusb::Result<Self> {
        debug!("Initializing libusb.");
        Ok(RusbTransport {
            context: Context::new()?,
        })
    }
}

impl<T: UsbContext> RusbTransport<T> {
    pub fn with_context(context: T) -> Self {
        RusbTransport { context }
    }

    fn read_tree(device: &Device<T>, desc: &DeviceDescriptor) -> rusb::Result<DeviceTree> {
        let mut configs = Vec::with_capacity(usize::from(desc.num_configurations()));
        for index in 0..desc.num_configurations() {
            let config = device.config_descriptor(index)?;
            let interfaces = config
                .interfaces()
                .map(|iface| InterfaceNode {
                    number: iface.number(),
                    setups: iface
                        .descriptors()
                        .map(|setting| SetupNode {
                            number: setting.setting_number(),
                            endpoints: setting
                                .endpoint_descriptors()
                                .map(|ep| EndpointNode {
                                    number: ep.number(),
                                    direction: ep.direction(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect();
            configs.push(ConfigNode {
                id: config.number(),
                interfaces,
            });
        }
        Ok(DeviceTree { configs })
    }

    fn transfer_type(device: &Device<T>, binding: &EndpointBinding) -> TransferType {
        let desc = match device.device_descriptor() {
            Ok(desc) => desc,
            Err(_) => return TransferType::Interrupt,
        };
        for index in 0..desc.num_configurations() {
            let config = match device.config_descriptor(index) {
                Ok(config) if config.number() == binding.config => config,
                _ => continue,
            };
            for iface in config.interfaces() {
                if iface.number() != binding.interface {
                    continue;
                }
                for setting in iface.descriptors() {
                    if setting.setting_number() != binding.setup {
                        continue;
                    }
                    for ep in setting.endpoint_descriptors() {
                        if ep.address() == binding.address() {
                            return ep.transfer_type();
                        }
                    }
                }
            }
        }
        TransferType::Interrupt
    }

    /// Describes every attached device, opened or not.
    #[tracing::instrument(skip(self))]
    pub fn list_all(&self) -> rusb::Result<Vec<DeviceListing>> {
        let mut listings = Vec::new();
        for device in self.context.devices()?.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(e) => {
                    error!("Failed to get device descriptor: {}", e);
                    continue;
                }
            };
            let name = device
                .open()
                .ok()
                .map(|handle| get_full_device_name(&handle, &device_desc));
            listings.push(DeviceListing {
                summary: summarize(&device, &device_desc),
                name,
                speed: speed_as_str(&device.speed()),
                tree: Self::read_tree(&device, &device_desc).ok(),
            });
        }
        Ok(listings)
    }
}

impl<T: UsbContext> UsbTransport for RusbTransport<T> {
    type Device = UsbDeviceHandle<T>;
    type Endpoint = InEndpoint<T>;

    /// Opens every device matching `predicate`. Devices that cannot be opened are
    /// skipped.
    fn list_devices(
        &self,
        predicate: &dyn Fn(&DeviceSummary) -> bool,
    ) -> rusb::Result<Vec<UsbDeviceHandle<T>>> {
        let mut opened = Vec::new();

        for device in self.context.devices()?.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(e) => {
                    info!("Skipping a device because we failed to get the device descriptor.");
                    error!("Failed to get device descriptor: {}", e);
                    continue;
                }
            };

            let summary = summarize(&device, &device_desc);
            if !predicate(&summary) {
                continue;
            }

            info!("Found a matching device: {}. Opening it now.", summary);
            match device.open() {
                Ok(handle) => {
                    info!("Device name: {}.", get_full_device_name(&handle, &device_desc));
                    opened.push(UsbDeviceHandle {
                        device,
                        device_desc,
                        handle: Arc::new(handle),
                    });
                }
                Err(e) => {
                    info!("Skipping the device because we failed to open it.");
                    error!("Failed to open the device: {}", e);
                }
            }
        }

        Ok(opened)
    }

    fn summary(&self, device: &UsbDeviceHandle<T>) -> DeviceSummary {
        summarize(&device.device, &device.device_desc)
    }

    fn device_tree(&self, device: &UsbDeviceHandle<T>) -> rusb::Result<DeviceTree> {
        Self::read_tree(&device.device, &device.device_desc)
    }

    fn detach_kernel_driver(&self, device: &UsbDeviceHandle<T>, interface: u8) -> rusb::Result<()> {
        // Only Linux binds usbhid to the scanner's interface.
        if !cfg!(target_os = "linux") {
            return Ok(());
        }
        if device.handle.kernel_driver_active(interface)? {
            debug!("Detaching kernel driver from interface {}.", interface);
            device.handle.detach_kernel_driver(interface)?;
        }
        Ok(())
    }

    fn open_endpoint(
        &self,
        device: &UsbDeviceHandle<T>,
        binding: &EndpointBinding,
    ) -> rusb::Result<InEndpoint<T>> {
        let handle = &device.handle;

        match handle.active_configuration() {
            Ok(active) if active == binding.config => {}
            _ => {
                if let Err(e) = handle.set_active_configuration(binding.config) {
                    warn!("Failed to select configuration {}: {}", binding.config, e);
                }
            }
        }

        handle.claim_interface(binding.interface)?;
        if let Err(e) = handle.set_alternate_setting(binding.interface, binding.setup) {
            debug!(
                "Could not select setting {} of interface {}: {}",
                binding.setup, binding.interface, e
            );
        }

        let transfer_type = Self::transfer_type(&device.device, binding);
        debug!("Opened {} ({:?} transfers).", binding, transfer_type);

        Ok(InEndpoint {
            handle: Arc::clone(handle),
            address: binding.address(),
            interface: binding.interface,
            timeout: binding.timeout,
            transfer_type,
        })
    }
}

/// A claimed IN endpoint. Dropping it releases the interface.
pub struct InEndpoint<T: UsbContext> {
    handle: Arc<DeviceHandle<T>>,
    address: u8,
    interface: u8,
    timeout: Duration,
    transfer_type: TransferType,
}

impl<T: UsbContext> ReportSource for InEndpoint<T> {
    fn read(&mut self, buf: &mut [u8]) -> rusb::Result<usize> {
        match self.transfer_type {
            TransferType::Bulk => self.handle.read_bulk(self.address, buf, self.timeout),
            _ => self.handle.read_interrupt(self.address, buf, self.timeout),
        }
    }
}

impl<T: UsbContext> Drop for InEndpoint<T> {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release_interface(self.interface) {
            warn!("Failed to release interface {}: {}", self.interface, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speeds_are_named_correctly() {
        assert_eq!(speed_as_str(&Speed::Low), "1.5 Mbps");
        assert_eq!(speed_as_str(&Speed::High), "480 Mbps");
        assert_eq!(speed_as_str(&Speed::Unknown), "(unknown)");
    }
}
