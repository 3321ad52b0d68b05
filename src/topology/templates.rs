//! Per-type default devices and identifier generation.
//!
//! A freshly placed device is stamped from its type's template: a fixed
//! interface set, default addressing, and for the DHCP/DNS/router types the
//! matching sub-configuration. Every interface gets its own MAC address.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use super::types::{
    DeviceStatus, DeviceType, DhcpConfig, DnsConfig, DnsRecord, DnsRecordType, NetworkDevice,
    NetworkInterface,
};

/// Lease duration the dhcp-server template starts with, in seconds
pub const DEFAULT_LEASE_TIME: u64 = 86_400;

/// Number of ports on a freshly placed switch
pub const SWITCH_PORT_COUNT: usize = 8;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Template row for one interface: id, name, ip, mask, gateway
struct InterfaceTemplate {
    id: String,
    name: String,
    ip_address: &'static str,
    subnet_mask: &'static str,
    gateway: &'static str,
}

impl InterfaceTemplate {
    fn eth(index: usize, ip: &'static str, mask: &'static str, gateway: &'static str) -> Self {
        InterfaceTemplate {
            id: format!("eth{}", index),
            name: format!("Ethernet {}", index),
            ip_address: ip,
            subnet_mask: mask,
            gateway,
        }
    }

    fn port(index: usize) -> Self {
        InterfaceTemplate {
            id: format!("port{}", index),
            name: format!("Port {}", index),
            ip_address: "",
            subnet_mask: "",
            gateway: "",
        }
    }
}

fn interface_templates(device_type: DeviceType) -> Vec<InterfaceTemplate> {
    match device_type {
        DeviceType::Router => vec![
            InterfaceTemplate::eth(0, "192.168.1.1", "255.255.255.0", ""),
            InterfaceTemplate::eth(1, "10.0.0.1", "255.255.255.0", ""),
        ],
        DeviceType::Switch => (0..SWITCH_PORT_COUNT).map(InterfaceTemplate::port).collect(),
        DeviceType::Server => vec![InterfaceTemplate::eth(
            0,
            "192.168.1.10",
            "255.255.255.0",
            "192.168.1.1",
        )],
        DeviceType::Pc => vec![InterfaceTemplate::eth(0, "", "255.255.255.0", "")],
        DeviceType::DhcpServer => vec![InterfaceTemplate::eth(
            0,
            "192.168.1.2",
            "255.255.255.0",
            "192.168.1.1",
        )],
        DeviceType::DnsServer => vec![InterfaceTemplate::eth(
            0,
            "192.168.1.3",
            "255.255.255.0",
            "192.168.1.1",
        )],
    }
}

/// Default DHCP server settings: pool .100-.200 on 192.168.1.0/24
pub fn default_dhcp_config(lease_time: u64) -> DhcpConfig {
    DhcpConfig {
        enabled: true,
        pool_start: "192.168.1.100".to_string(),
        pool_end: "192.168.1.200".to_string(),
        subnet_mask: "255.255.255.0".to_string(),
        gateway: "192.168.1.1".to_string(),
        dns_server: "192.168.1.3".to_string(),
        lease_time,
        leases: Vec::new(),
    }
}

/// Default DNS server settings with a single A record
pub fn default_dns_config() -> DnsConfig {
    DnsConfig {
        enabled: true,
        records: vec![DnsRecord {
            hostname: "server.local".to_string(),
            ip_address: "192.168.1.10".to_string(),
            record_type: DnsRecordType::A,
        }],
    }
}

/// Capitalise the first letter of a type tag: `dhcp-server` -> `Dhcp-server`
fn display_prefix(device_type: DeviceType) -> String {
    let tag = device_type.as_str();
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds devices from templates and hands out identifiers.
///
/// Device ids combine a monotonically increasing counter with a random
/// suffix; MAC addresses are random but never repeated within one factory.
#[derive(Debug)]
pub struct DeviceFactory {
    rng: StdRng,
    next_device: u64,
    next_cable: u64,
    issued_macs: HashSet<String>,
    lease_time: u64,
}

impl DeviceFactory {
    /// Factory seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible factory: the same seed yields the same ids and MACs
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        DeviceFactory {
            rng,
            next_device: 1,
            next_cable: 1,
            issued_macs: HashSet::new(),
            lease_time: DEFAULT_LEASE_TIME,
        }
    }

    /// Override the lease time stamped into new dhcp-server devices
    pub fn set_lease_time(&mut self, seconds: u64) {
        self.lease_time = seconds;
    }

    /// Remember MACs already present, e.g. after loading a saved topology
    pub fn reserve_macs<'a, I>(&mut self, macs: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.issued_macs.extend(macs.into_iter().map(str::to_string));
    }

    /// Fresh colon-separated uppercase MAC, unique within this factory
    pub fn generate_mac_address(&mut self) -> String {
        loop {
            let bytes: [u8; 6] = self.rng.gen();
            let mac = bytes
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(":");
            if self.issued_macs.insert(mac.clone()) {
                return mac;
            }
        }
    }

    /// Fresh device id, e.g. `device-3-k2j9x0a1b`
    pub fn generate_device_id(&mut self) -> String {
        let suffix: String = (0..9)
            .map(|_| char::from(BASE36[self.rng.gen_range(0..BASE36.len())]))
            .collect();
        let id = format!("device-{}-{}", self.next_device, suffix);
        self.next_device = self.next_device.saturating_add(1);
        id
    }

    /// Fresh cable id, e.g. `cable-7`
    pub fn generate_cable_id(&mut self) -> String {
        let id = format!("cable-{}", self.next_cable);
        self.next_cable = self.next_cable.saturating_add(1);
        id
    }

    /// Bump the device counter past ids already present
    pub fn skip_device_ids<'a, I>(&mut self, existing: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in existing {
            let counter = id
                .strip_prefix("device-")
                .and_then(|rest| rest.split('-').next())
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(n) = counter {
                self.next_device = self.next_device.max(n.saturating_add(1));
            }
        }
    }

    /// Bump the cable counter past ids already present
    pub fn skip_cable_ids<'a, I>(&mut self, existing: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in existing {
            if let Some(n) = id.strip_prefix("cable-").and_then(|n| n.parse::<u64>().ok()) {
                self.next_cable = self.next_cable.max(n.saturating_add(1));
            }
        }
    }

    /// Instantiate a device of `device_type` at canvas position (x, y)
    pub fn build(&mut self, device_type: DeviceType, x: f64, y: f64) -> NetworkDevice {
        let id = self.generate_device_id();
        let interfaces = interface_templates(device_type)
            .into_iter()
            .map(|t| NetworkInterface {
                id: t.id,
                name: t.name,
                ip_address: t.ip_address.to_string(),
                subnet_mask: t.subnet_mask.to_string(),
                gateway: t.gateway.to_string(),
                dhcp_enabled: false,
                mac_address: self.generate_mac_address(),
                connected: false,
                connected_to: None,
            })
            .collect();

        let name = format!("{}-{}", display_prefix(device_type), self.rng.gen_range(0..100));
        let hostname = format!("{}-{}", device_type.as_str(), self.rng.gen_range(0..1000));

        NetworkDevice {
            id,
            device_type,
            name,
            x,
            y,
            interfaces,
            dhcp_config: (device_type == DeviceType::DhcpServer)
                .then(|| default_dhcp_config(self.lease_time)),
            dns_config: (device_type == DeviceType::DnsServer).then(default_dns_config),
            routing_table: (device_type == DeviceType::Router).then(Vec::new),
            vlan_id: None,
            hostname,
            status: DeviceStatus::Online,
        }
    }
}

impl Default for DeviceFactory {
    fn default() -> Self {
        Self::new()
    }
}
