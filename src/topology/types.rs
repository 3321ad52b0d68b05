//! Topology type definitions.
//!
//! Devices, their interfaces, the cables between them, and the DHCP/DNS/
//! routing sub-configuration a device may carry. Field names serialize in
//! camelCase so saved topologies keep the JSON shape the web front-end uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of device kinds a user can place on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceType {
    Router,
    Switch,
    Server,
    Pc,
    DhcpServer,
    DnsServer,
}

impl DeviceType {
    /// Every device type, in palette order
    pub const ALL: [DeviceType; 6] = [
        DeviceType::Router,
        DeviceType::Switch,
        DeviceType::Server,
        DeviceType::Pc,
        DeviceType::DhcpServer,
        DeviceType::DnsServer,
    ];

    /// Wire tag, e.g. `dhcp-server`
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Router => "router",
            DeviceType::Switch => "switch",
            DeviceType::Server => "server",
            DeviceType::Pc => "pc",
            DeviceType::DhcpServer => "dhcp-server",
            DeviceType::DnsServer => "dns-server",
        }
    }

    /// Server-like devices: plain servers plus the DHCP and DNS appliances
    pub fn is_server(&self) -> bool {
        matches!(
            self,
            DeviceType::Server | DeviceType::DhcpServer | DeviceType::DnsServer
        )
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown device type '{}'", s))
    }
}

/// Operational state shown on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Online,
    Offline,
    Error,
}

/// One network attachment point of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub subnet_mask: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default)]
    pub dhcp_enabled: bool,
    /// Colon-separated hex, fixed at creation
    pub mac_address: String,
    #[serde(default)]
    pub connected: bool,
    /// Peer device id while a cable terminates here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to: Option<String>,
}

impl NetworkInterface {
    /// Whether an address is set on this interface
    pub fn has_ip(&self) -> bool {
        !self.ip_address.is_empty()
    }

    /// Address and mask both set
    pub fn is_addressed(&self) -> bool {
        !self.ip_address.is_empty() && !self.subnet_mask.is_empty()
    }

    pub fn has_gateway(&self) -> bool {
        !self.gateway.is_empty()
    }

    /// Mark this interface as the end of a cable towards `peer_device_id`
    pub fn attach(&mut self, peer_device_id: &str) {
        self.connected = true;
        self.connected_to = Some(peer_device_id.to_string());
    }

    pub fn detach(&mut self) {
        self.connected = false;
        self.connected_to = None;
    }
}

/// One address lease handed out by a DHCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpLease {
    pub mac_address: String,
    pub ip_address: String,
    pub hostname: String,
    pub expires_at: DateTime<Utc>,
}

/// DHCP server settings, present only on `dhcp-server` devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpConfig {
    pub enabled: bool,
    /// Inclusive lower bound of the pool
    pub pool_start: String,
    /// Inclusive upper bound of the pool
    pub pool_end: String,
    pub subnet_mask: String,
    pub gateway: String,
    pub dns_server: String,
    /// Lease duration in seconds
    pub lease_time: u64,
    #[serde(default)]
    pub leases: Vec<DhcpLease>,
}

impl DhcpConfig {
    /// Both pool bounds are filled in
    pub fn has_pool(&self) -> bool {
        !self.pool_start.is_empty() && !self.pool_end.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsRecordType {
    A,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "MX")]
    Mx,
    #[serde(rename = "PTR")]
    Ptr,
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            DnsRecordType::A => "A",
            DnsRecordType::Cname => "CNAME",
            DnsRecordType::Mx => "MX",
            DnsRecordType::Ptr => "PTR",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    pub hostname: String,
    pub ip_address: String,
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
}

/// DNS server settings, present only on `dns-server` devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsConfig {
    pub enabled: bool,
    #[serde(default)]
    pub records: Vec<DnsRecord>,
}

impl DnsConfig {
    /// First record whose hostname matches exactly
    pub fn lookup(&self, hostname: &str) -> Option<&DnsRecord> {
        self.records.iter().find(|r| r.hostname == hostname)
    }
}

/// Static route, present only in a router's table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub network: String,
    pub mask: String,
    pub gateway: String,
    pub interface: String,
    pub metric: u32,
}

/// A virtual device on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDevice {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_config: Option<DhcpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_config: Option<DnsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_table: Option<Vec<RoutingEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    pub hostname: String,
    #[serde(default)]
    pub status: DeviceStatus,
}

impl NetworkDevice {
    pub fn interface(&self, interface_id: &str) -> Option<&NetworkInterface> {
        self.interfaces.iter().find(|i| i.id == interface_id)
    }

    pub fn interface_mut(&mut self, interface_id: &str) -> Option<&mut NetworkInterface> {
        self.interfaces.iter_mut().find(|i| i.id == interface_id)
    }

    /// First interface carrying an address
    pub fn first_addressed_interface(&self) -> Option<&NetworkInterface> {
        self.interfaces.iter().find(|i| i.has_ip())
    }

    /// Interface owning exactly `ip`
    pub fn interface_with_ip(&self, ip: &str) -> Option<&NetworkInterface> {
        self.interfaces.iter().find(|i| i.ip_address == ip)
    }

    /// How many interfaces carry an address
    pub fn addressed_interface_count(&self) -> usize {
        self.interfaces.iter().filter(|i| i.has_ip()).count()
    }

    pub fn is(&self, device_type: DeviceType) -> bool {
        self.device_type == device_type
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CableType {
    #[default]
    Ethernet,
    Fiber,
    Serial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CableStatus {
    #[default]
    Connected,
    Disconnected,
    Error,
}

/// An undirected link between two interfaces on two distinct devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cable {
    pub id: String,
    pub from_device_id: String,
    pub from_interface_id: String,
    pub to_device_id: String,
    pub to_interface_id: String,
    #[serde(rename = "type", default)]
    pub cable_type: CableType,
    #[serde(default)]
    pub status: CableStatus,
}

impl Cable {
    /// Whether either end sits on `device_id`
    pub fn touches(&self, device_id: &str) -> bool {
        self.from_device_id == device_id || self.to_device_id == device_id
    }

    /// The device at the other end, if `device_id` is one of the ends
    pub fn peer_of(&self, device_id: &str) -> Option<&str> {
        if self.from_device_id == device_id {
            Some(&self.to_device_id)
        } else if self.to_device_id == device_id {
            Some(&self.from_device_id)
        } else {
            None
        }
    }

    /// Whether this cable links `a` and `b` in either direction
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.from_device_id == a && self.to_device_id == b)
            || (self.from_device_id == b && self.to_device_id == a)
    }
}

/// Aggregate root: every device and cable of one editing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub devices: Vec<NetworkDevice>,
    #[serde(default)]
    pub cables: Vec<Cable>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn device(&self, id: &str) -> Option<&NetworkDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn device_mut(&mut self, id: &str) -> Option<&mut NetworkDevice> {
        self.devices.iter_mut().find(|d| d.id == id)
    }

    pub fn cable(&self, id: &str) -> Option<&Cable> {
        self.cables.iter().find(|c| c.id == id)
    }

    /// Devices of one type, in insertion order
    pub fn devices_of(&self, device_type: DeviceType) -> impl Iterator<Item = &NetworkDevice> {
        self.devices.iter().filter(move |d| d.device_type == device_type)
    }

    /// First device of a type
    pub fn first_of(&self, device_type: DeviceType) -> Option<&NetworkDevice> {
        self.devices_of(device_type).next()
    }

    pub fn count_of(&self, device_type: DeviceType) -> usize {
        self.devices_of(device_type).count()
    }

    /// Any device owning an interface with exactly `ip`
    pub fn device_with_ip(&self, ip: &str) -> Option<&NetworkDevice> {
        self.devices.iter().find(|d| d.interface_with_ip(ip).is_some())
    }

    /// Whether a single cable links the two devices directly
    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.cables.iter().any(|c| c.joins(a, b))
    }

    /// Cables that reference a device id or interface that does not exist.
    ///
    /// The session is the only writer and never produces these; the check
    /// exists for topologies loaded from outside.
    pub fn dangling_cables(&self) -> Vec<&Cable> {
        self.cables
            .iter()
            .filter(|c| {
                let from_ok = self
                    .device(&c.from_device_id)
                    .and_then(|d| d.interface(&c.from_interface_id))
                    .is_some();
                let to_ok = self
                    .device(&c.to_device_id)
                    .and_then(|d| d.interface(&c.to_interface_id))
                    .is_some();
                !(from_ok && to_ok)
            })
            .collect()
    }
}
