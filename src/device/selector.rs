use std::time::Duration;

use rusb::Direction;
use tracing::{debug, info, warn};

use super::{DeviceTree, EndpointBinding, ScannerHandle, UsbTransport};
use crate::devices::DeviceMatcher;
use crate::error::{Error, Result};

/// Finds the first IN endpoint of a device.
///
/// Configurations, interfaces, alternate settings and endpoints are visited in
/// declared order. The binding it returns never times out.
pub fn find_in_endpoint(tree: &DeviceTree) -> Option<EndpointBinding> {
    for config in &tree.configs {
        for iface in &config.interfaces {
            for setup in &iface.setups {
                for endpoint in &setup.endpoints {
                    if endpoint.direction == Direction::In {
                        return Some(EndpointBinding {
                            config: config.id,
                            interface: iface.number,
                            setup: setup.number,
                            endpoint: endpoint.number,
                            direction: Direction::In,
                            timeout: Duration::ZERO,
                        });
                    }
                }
            }
        }
    }
    None
}

/// Finds every attached device matching `matcher` and binds each one to its first IN
/// endpoint.
///
/// Devices without an IN endpoint, or whose descriptors cannot be read, are skipped.
/// Fails with [`Error::DeviceNotFound`] only when nothing matches at all.
#[tracing::instrument(skip(transport))]
pub fn select_scanners<T: UsbTransport>(
    transport: &T,
    matcher: DeviceMatcher,
) -> Result<Vec<ScannerHandle<T::Device>>> {
    info!("Looking for scanners matching {}...", matcher);

    let devices = transport.list_devices(&|summary| matcher.matches(summary))?;
    if devices.is_empty() {
        return Err(Error::DeviceNotFound(matcher));
    }

    let mut handles = Vec::with_capacity(devices.len());
    for device in devices {
        let summary = transport.summary(&device);

        let tree = match transport.device_tree(&device) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Skipping {} because its descriptors are unreadable: {}", summary, e);
                continue;
            }
        };

        let binding = match find_in_endpoint(&tree) {
            Some(binding) => binding,
            None => {
                debug!("Skipping {}: no IN endpoint.", summary);
                continue;
            }
        };

        match transport.detach_kernel_driver(&device, binding.interface) {
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(e) => warn!(
                "Failed to detach kernel driver from interface {} of {}: {}",
                binding.interface, summary, e
            ),
        }

        info!("Selected {} on {}.", binding, summary);
        handles.push(ScannerHandle {
            device,
            summary,
            binding,
        });
    }

    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ConfigNode, EndpointNode, InterfaceNode, SetupNode};
    use crate::testing::{FakeDevice, FakeTransport};

    fn ep(address: u8) -> EndpointNode {
        EndpointNode::from_address(address)
    }

    fn tree(configs: Vec<(u8, Vec<(u8, Vec<(u8, Vec<EndpointNode>)>)>)>) -> DeviceTree {
        DeviceTree {
            configs: configs
                .into_iter()
                .map(|(id, interfaces)| ConfigNode {
                    id,
                    interfaces: interfaces
                        .into_iter()
                        .map(|(number, setups)| InterfaceNode {
                            number,
                            setups: setups
                                .into_iter()
                                .map(|(number, endpoints)| SetupNode { number, endpoints })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn first_in_endpoint_wins() {
        let tree = tree(vec![(
            1,
            vec![
                (0, vec![(0, vec![ep(0x02)]), (1, vec![ep(0x03), ep(0x84)])]),
                (1, vec![(0, vec![ep(0x81)])]),
            ],
        )]);
        let binding = find_in_endpoint(&tree).unwrap();
        assert_eq!(
            (binding.config, binding.interface, binding.setup, binding.endpoint),
            (1, 0, 1, 4)
        );
        assert_eq!(binding.direction, Direction::In);
        assert_eq!(binding.timeout, Duration::ZERO);
    }

    #[test]
    fn later_configurations_are_searched() {
        let tree = tree(vec![
            (1, vec![(0, vec![(0, vec![ep(0x01)])])]),
            (2, vec![(3, vec![(2, vec![ep(0x85)])])]),
        ]);
        let binding = find_in_endpoint(&tree).unwrap();
        assert_eq!(
            (binding.config, binding.interface, binding.setup, binding.endpoint),
            (2, 3, 2, 5)
        );
    }

    #[test]
    fn out_only_tree_has_no_binding() {
        let tree = tree(vec![(1, vec![(0, vec![(0, vec![ep(0x01), ep(0x02)])])])]);
        assert_eq!(find_in_endpoint(&tree), None);
    }

    #[test]
    fn nothing_attached_is_device_not_found() {
        let transport = FakeTransport::default();
        let err = select_scanners(&transport, DeviceMatcher::new(0x0c2e, 0)).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(DeviceMatcher::Vid { vid: 0x0c2e })));
    }

    #[test]
    fn other_vendors_are_ignored() {
        let transport = FakeTransport::default().with_device(FakeDevice::scanner(0x0536, 0x0461));
        let err = select_scanners(&transport, DeviceMatcher::new(0x0c2e, 0)).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(_)));
    }

    #[test]
    fn device_without_in_endpoint_is_skipped_silently() {
        let transport = FakeTransport::default()
            .with_device(FakeDevice::new(0x0c2e, 0x0001, tree(vec![(1, vec![(0, vec![(0, vec![ep(0x01)])])])])))
            .with_device(FakeDevice::scanner(0x0c2e, 0x0002));
        let handles = select_scanners(&transport, DeviceMatcher::new(0x0c2e, 0)).unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].summary.product_id, 0x0002);
    }

    #[test]
    fn only_out_endpoints_yield_zero_handles() {
        let transport = FakeTransport::default()
            .with_device(FakeDevice::new(0x0c2e, 0x0001, tree(vec![(1, vec![(0, vec![(0, vec![ep(0x01)])])])])));
        let handles = select_scanners(&transport, DeviceMatcher::new(0x0c2e, 0x0001)).unwrap();
        assert!(handles.is_empty());
    }

    #[test]
    fn kernel_driver_is_detached_from_the_bound_interface() {
        let transport = FakeTransport::default().with_device(FakeDevice::new(
            0x0536,
            0x0461,
            tree(vec![(1, vec![(2, vec![(0, vec![ep(0x83)])])])]),
        ));
        select_scanners(&transport, DeviceMatcher::new(0x0536, 0x0461)).unwrap();
        assert_eq!(transport.detached(), vec![(0x0461, 2)]);
    }

    #[test]
    fn unsupported_detach_is_not_an_error() {
        let transport = FakeTransport::default()
            .with_device(FakeDevice::scanner(0x0536, 0x0461))
            .with_detach_error(rusb::Error::NotSupported);
        let handles = select_scanners(&transport, DeviceMatcher::new(0x0536, 0x0461)).unwrap();
        assert_eq!(handles.len(), 1);
    }

    #[test]
    fn reselection_is_stable() {
        let transport = FakeTransport::default()
            .with_device(FakeDevice::scanner(0x0c2e, 0x0001))
            .with_device(FakeDevice::new(
                0x0c2e,
                0x0002,
                tree(vec![(1, vec![(0, vec![(0, vec![ep(0x02)])]), (1, vec![(1, vec![ep(0x86)])])])]),
            ));
        let matcher = DeviceMatcher::new(0x0c2e, 0);
        let first: Vec<_> = select_scanners(&transport, matcher)
            .unwrap()
            .into_iter()
            .map(|h| h.binding)
            .collect();
        let second: Vec<_> = select_scanners(&transport, matcher)
            .unwrap()
            .into_iter()
            .map(|h| h.binding)
            .collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
