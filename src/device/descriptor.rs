//! A plain copy of a device's descriptor hierarchy.
//!
//! Walking this tree instead of live libusb descriptors keeps endpoint selection
//! independent of the bus.

use rusb::Direction;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTree {
    /// Configurations in declared order.
    pub configs: Vec<ConfigNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNode {
    /// `bConfigurationValue`.
    pub id: u8,
    pub interfaces: Vec<InterfaceNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceNode {
    pub number: u8,
    /// Alternate settings in declared order.
    pub setups: Vec<SetupNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupNode {
    pub number: u8,
    pub endpoints: Vec<EndpointNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointNode {
    pub number: u8,
    pub direction: Direction,
}

impl EndpointNode {
    /// Builds a node from a raw `bEndpointAddress`.
    pub fn from_address(address: u8) -> Self {
        let direction = if address & rusb::constants::LIBUSB_ENDPOINT_DIR_MASK != 0 {
            Direction::In
        } else {
            Direction::Out
        };
        EndpointNode {
            number: address & 0x0f,
            direction,
        }
    }
}

impl DeviceTree {
    /// Whether any setting of any configuration exposes an IN endpoint.
    pub fn has_in_endpoint(&self) -> bool {
        self.configs
            .iter()
            .flat_map(|c| &c.interfaces)
            .flat_map(|i| &i.setups)
            .flat_map(|s| &s.endpoints)
            .any(|e| e.direction == Direction::In)
    }
}
