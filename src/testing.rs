//! In-memory stand-ins for the USB bus, used by unit and integration tests.
//!
//! ```
//! use scanner_usb::testing::{FakeDevice, FakeTransport};
//!
//! let transport = FakeTransport::default().with_device(FakeDevice::scanner(0x0c2e, 0x0b61));
//! # let _ = transport;
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::device::{
    ConfigNode, DeviceSummary, DeviceTree, EndpointBinding, EndpointNode, InterfaceNode,
    ReportSource, SetupNode, UsbTransport,
};
use crate::retry::Sleeper;
use crate::server::ShutdownSignal;

/// One scripted outcome of [`ReportSource::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedRead {
    /// Bytes delivered by the read. May be shorter or longer than a report.
    Data(Vec<u8>),
    Fail(rusb::Error),
}

/// Replays a fixed sequence of reads.
///
/// Once the script is used up every read fails with `NoDevice`, as if the scanner
/// had been unplugged, unless [`ScriptedSource::shutdown_when_exhausted`] was set.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<ScriptedRead>,
    on_exhausted: Option<ShutdownSignal>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = ScriptedRead>) -> Self {
        ScriptedSource {
            script: script.into_iter().collect(),
            on_exhausted: None,
        }
    }

    /// Triggers `signal` and reports an idle timeout once the script runs out.
    pub fn shutdown_when_exhausted(&mut self, signal: ShutdownSignal) {
        self.on_exhausted = Some(signal);
    }
}

impl ReportSource for ScriptedSource {
    fn read(&mut self, buf: &mut [u8]) -> rusb::Result<usize> {
        match self.script.pop_front() {
            Some(ScriptedRead::Data(data)) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            Some(ScriptedRead::Fail(e)) => Err(e),
            None => match &self.on_exhausted {
                Some(signal) => {
                    signal.trigger();
                    Err(rusb::Error::Timeout)
                }
                None => Err(rusb::Error::NoDevice),
            },
        }
    }
}

/// A device known to [`FakeTransport`].
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub summary: DeviceSummary,
    pub tree: DeviceTree,
    pub reads: Vec<ScriptedRead>,
    pub unreadable: bool,
}

impl FakeDevice {
    pub fn new(vendor_id: u16, product_id: u16, tree: DeviceTree) -> Self {
        FakeDevice {
            summary: DeviceSummary {
                bus: 1,
                address: (product_id % 128) as u8,
                vendor_id,
                product_id,
            },
            tree,
            reads: Vec::new(),
            unreadable: false,
        }
    }

    /// A typical keyboard-wedge scanner: configuration 1, interface 0, setting 0,
    /// interrupt IN endpoint 0x81.
    pub fn scanner(vendor_id: u16, product_id: u16) -> Self {
        let tree = DeviceTree {
            configs: vec![ConfigNode {
                id: 1,
                interfaces: vec![InterfaceNode {
                    number: 0,
                    setups: vec![SetupNode {
                        number: 0,
                        endpoints: vec![EndpointNode::from_address(0x81)],
                    }],
                }],
            }],
        };
        FakeDevice::new(vendor_id, product_id, tree)
    }

    /// Reports the device will deliver once its endpoint is opened.
    pub fn with_reads(mut self, reads: impl IntoIterator<Item = ScriptedRead>) -> Self {
        self.reads = reads.into_iter().collect();
        self
    }

    /// Makes [`UsbTransport::device_tree`] fail for this device.
    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }
}

/// A bus populated with [`FakeDevice`]s.
#[derive(Debug, Default)]
pub struct FakeTransport {
    devices: Vec<FakeDevice>,
    detach_error: Option<rusb::Error>,
    detached: Mutex<Vec<(u16, u8)>>,
    opened: Mutex<Vec<EndpointBinding>>,
}

impl FakeTransport {
    pub fn with_device(mut self, device: FakeDevice) -> Self {
        self.devices.push(device);
        self
    }

    pub fn with_detach_error(mut self, error: rusb::Error) -> Self {
        self.detach_error = Some(error);
        self
    }

    /// `(product id, interface)` pairs passed to `detach_kernel_driver`.
    pub fn detached(&self) -> Vec<(u16, u8)> {
        self.detached.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Bindings passed to `open_endpoint`.
    pub fn opened(&self) -> Vec<EndpointBinding> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl UsbTransport for FakeTransport {
    type Device = FakeDevice;
    type Endpoint = ScriptedSource;

    fn list_devices(
        &self,
        predicate: &dyn Fn(&DeviceSummary) -> bool,
    ) -> rusb::Result<Vec<FakeDevice>> {
        Ok(self
            .devices
            .iter()
            .filter(|d| predicate(&d.summary))
            .cloned()
            .collect())
    }

    fn summary(&self, device: &FakeDevice) -> DeviceSummary {
        device.summary
    }

    fn device_tree(&self, device: &FakeDevice) -> rusb::Result<DeviceTree> {
        if device.unreadable {
            return Err(rusb::Error::Io);
        }
        Ok(device.tree.clone())
    }

    fn detach_kernel_driver(&self, device: &FakeDevice, interface: u8) -> rusb::Result<()> {
        if let Some(e) = self.detach_error {
            return Err(e);
        }
        self.detached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((device.summary.product_id, interface));
        Ok(())
    }

    fn open_endpoint(
        &self,
        device: &FakeDevice,
        binding: &EndpointBinding,
    ) -> rusb::Result<ScriptedSource> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner).push(*binding);
        Ok(ScriptedSource::new(device.reads.clone()))
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
    }
}
