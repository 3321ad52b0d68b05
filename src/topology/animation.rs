//! Packet-flow animation geometry.
//!
//! The canvas draws a packet travelling along the shortest cable path.
//! This module turns a device path into waypoints and keeps the progress
//! counter of each animated packet. The host owns the clock and calls
//! [`PacketAnimation::advance`]; nothing here feeds back into the topology.

use serde::{Deserialize, Serialize};

use super::path::find_path;
use super::types::{NetworkDevice, Topology};

/// Offset from a device's top-left corner to the centre of its icon
pub const ICON_CENTER_OFFSET: f64 = 40.0;

/// Default progress added per animation tick
pub const DEFAULT_STEP: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn center_of(device: &NetworkDevice) -> Self {
        Point {
            x: device.x + ICON_CENTER_OFFSET,
            y: device.y + ICON_CENTER_OFFSET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PacketProtocol {
    Icmp,
    Dhcp,
    Arp,
    Dns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStatus {
    Pending,
    Traveling,
    Success,
    Failed,
}

/// Waypoints for a packet from `from` to `to`.
///
/// Starts at the source centre, passes through every intermediate device of
/// the shortest path, ends at the destination centre. With no path the
/// packet flies straight from source to destination.
pub fn packet_route(topology: &Topology, from: &NetworkDevice, to: &NetworkDevice) -> Vec<Point> {
    let mut route = vec![Point::center_of(from)];

    for device_id in find_path(topology, &from.id, &to.id) {
        if device_id == from.id || device_id == to.id {
            continue;
        }
        if let Some(hop) = topology.device(&device_id) {
            route.push(Point::center_of(hop));
        }
    }

    route.push(Point::center_of(to));
    route
}

/// One animated packet on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketAnimation {
    pub id: String,
    pub from_device_id: String,
    pub to_device_id: String,
    pub protocol: PacketProtocol,
    pub status: AnimationStatus,
    /// In [0, 1]
    pub current_progress: f64,
    pub path: Vec<Point>,
    pub message: String,
}

impl PacketAnimation {
    pub fn new(
        id: impl Into<String>,
        topology: &Topology,
        from: &NetworkDevice,
        to: &NetworkDevice,
        protocol: PacketProtocol,
        message: impl Into<String>,
    ) -> Self {
        PacketAnimation {
            id: id.into(),
            from_device_id: from.id.clone(),
            to_device_id: to.id.clone(),
            protocol,
            status: AnimationStatus::Pending,
            current_progress: 0.0,
            path: packet_route(topology, from, to),
            message: message.into(),
        }
    }

    /// ICMP echo request from `source_id` to `dest_id` and the matching reply.
    ///
    /// Returns `None` if either device is missing.
    pub fn echo_pair(
        topology: &Topology,
        source_id: &str,
        dest_id: &str,
        id_prefix: &str,
    ) -> Option<(PacketAnimation, PacketAnimation)> {
        let source = topology.device(source_id)?;
        let dest = topology.device(dest_id)?;
        let request = PacketAnimation::new(
            format!("{}-request", id_prefix),
            topology,
            source,
            dest,
            PacketProtocol::Icmp,
            format!("ICMP Echo Request: {} -> {}", source.name, dest.name),
        );
        let reply = PacketAnimation::new(
            format!("{}-reply", id_prefix),
            topology,
            dest,
            source,
            PacketProtocol::Icmp,
            format!("ICMP Echo Reply: {} -> {}", dest.name, source.name),
        );
        Some((request, reply))
    }

    /// Move the packet forward by `step`. Returns true once it has arrived.
    pub fn advance(&mut self, step: f64) -> bool {
        if self.is_finished() {
            return true;
        }
        self.current_progress = (self.current_progress + step).min(1.0);
        if self.current_progress >= 1.0 {
            self.status = AnimationStatus::Success;
            true
        } else {
            self.status = AnimationStatus::Traveling;
            false
        }
    }

    /// Stop the packet where it is
    pub fn fail(&mut self) {
        self.status = AnimationStatus::Failed;
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, AnimationStatus::Success | AnimationStatus::Failed)
    }

    /// Interpolated canvas position for the current progress.
    ///
    /// Progress is spread evenly over the route's segments.
    pub fn position(&self) -> Option<Point> {
        let first = *self.path.first()?;
        let segments = self.path.len().saturating_sub(1);
        if segments == 0 {
            return Some(first);
        }
        let scaled = self.current_progress.clamp(0.0, 1.0) * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        let t = scaled - index as f64;
        let a = self.path[index];
        let b = self.path[index + 1];
        Some(Point {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Cable, CableStatus, CableType, DeviceStatus, DeviceType};

    fn device(id: &str, x: f64, y: f64) -> NetworkDevice {
        NetworkDevice {
            id: id.to_string(),
            device_type: DeviceType::Pc,
            name: id.to_uppercase(),
            x,
            y,
            interfaces: Vec::new(),
            dhcp_config: None,
            dns_config: None,
            routing_table: None,
            vlan_id: None,
            hostname: id.to_string(),
            status: DeviceStatus::Online,
        }
    }

    fn link(id: &str, from: &str, to: &str) -> Cable {
        Cable {
            id: id.to_string(),
            from_device_id: from.to_string(),
            from_interface_id: "eth0".to_string(),
            to_device_id: to.to_string(),
            to_interface_id: "eth0".to_string(),
            cable_type: CableType::Ethernet,
            status: CableStatus::Connected,
        }
    }

    fn line() -> Topology {
        Topology {
            devices: vec![device("a", 0.0, 0.0), device("s", 100.0, 0.0), device("b", 200.0, 0.0)],
            cables: vec![link("c1", "a", "s"), link("c2", "s", "b")],
        }
    }

    #[test]
    fn test_route_passes_through_intermediates() {
        let t = line();
        let route = packet_route(&t, &t.devices[0], &t.devices[2]);
        assert_eq!(
            route,
            vec![
                Point { x: 40.0, y: 40.0 },
                Point { x: 140.0, y: 40.0 },
                Point { x: 240.0, y: 40.0 },
            ]
        );
    }

    #[test]
    fn test_route_without_path_is_direct() {
        let mut t = line();
        t.cables.clear();
        let route = packet_route(&t, &t.devices[0], &t.devices[2]);
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn test_advance_until_success() {
        let t = line();
        let (mut request, reply) = PacketAnimation::echo_pair(&t, "a", "b", "p1").expect("pair");
        assert_eq!(request.status, AnimationStatus::Pending);
        assert_eq!(reply.message, "ICMP Echo Reply: B -> A");
        assert!(!request.advance(0.5));
        assert_eq!(request.status, AnimationStatus::Traveling);
        assert_eq!(request.position(), Some(Point { x: 140.0, y: 40.0 }));
        assert!(request.advance(0.75));
        assert_eq!(request.status, AnimationStatus::Success);
        assert_eq!(request.current_progress, 1.0);
        assert_eq!(request.position(), Some(Point { x: 240.0, y: 40.0 }));
    }

    #[test]
    fn test_failed_packet_stops() {
        let t = line();
        let (mut request, _) = PacketAnimation::echo_pair(&t, "a", "b", "p2").expect("pair");
        request.fail();
        assert!(request.advance(DEFAULT_STEP));
        assert_eq!(request.current_progress, 0.0);
    }

    #[test]
    fn test_echo_pair_needs_both_devices() {
        assert!(PacketAnimation::echo_pair(&line(), "a", "ghost", "p3").is_none());
    }
}
