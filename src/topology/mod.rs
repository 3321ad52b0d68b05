//! Network topology module.
//!
//! The data model of a user-built network (devices, interfaces, cables and
//! their sub-configuration), the per-type device templates, breadth-first
//! reachability over the cable graph, and packet animation geometry.

pub mod types;
pub mod templates;
pub mod path;
pub mod animation;

// Re-export key types and functions for easier access
pub use types::{
    Cable, CableStatus, CableType, DeviceStatus, DeviceType, DhcpConfig, DhcpLease, DnsConfig,
    DnsRecord, DnsRecordType, NetworkDevice, NetworkInterface, RoutingEntry, Topology,
};
pub use templates::DeviceFactory;
pub use path::{find_path, is_connected, is_fully_connected, reachable_from};
pub use animation::{AnimationStatus, PacketAnimation, PacketProtocol, Point};
