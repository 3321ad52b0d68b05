//! Reachability over the cable graph.
//!
//! The graph is undirected: every cable is an edge between its two device
//! ids. All functions here are pure over a borrowed [`Topology`] snapshot.
//! Neighbours are visited in cable insertion order, so when several shortest
//! paths exist, [`find_path`] returns the one whose cables were laid first.

use std::collections::{HashMap, HashSet, VecDeque};

use super::types::Topology;

/// Device ids directly cabled to `device_id`, in cable order
pub fn neighbors<'a>(topology: &'a Topology, device_id: &'a str) -> impl Iterator<Item = &'a str> {
    topology
        .cables
        .iter()
        .filter_map(move |cable| cable.peer_of(device_id))
}

/// Whether `target_id` can be reached from `source_id` over cables.
///
/// A device always reaches itself.
pub fn is_connected(topology: &Topology, source_id: &str, target_id: &str) -> bool {
    if source_id == target_id {
        return true;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(source_id);
    queue.push_back(source_id);

    while let Some(current) = queue.pop_front() {
        for next in neighbors(topology, current) {
            if next == target_id {
                return true;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    false
}

/// Every device id reachable from `source_id`, the source included
pub fn reachable_from<'a>(topology: &'a Topology, source_id: &'a str) -> HashSet<&'a str> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(source_id);
    queue.push_back(source_id);

    while let Some(current) = queue.pop_front() {
        for next in neighbors(topology, current) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited
}

/// Whether every device is reachable from the first one.
///
/// An empty topology is not fully connected.
pub fn is_fully_connected(topology: &Topology) -> bool {
    let Some(first) = topology.devices.first() else {
        return false;
    };

    let reached = reachable_from(topology, &first.id);
    topology
        .devices
        .iter()
        .all(|device| reached.contains(device.id.as_str()))
}

/// Shortest hop-count path from `from_id` to `to_id`, both ends included.
///
/// Returns an empty vector when `to_id` is unreachable.
pub fn find_path(topology: &Topology, from_id: &str, to_id: &str) -> Vec<String> {
    if from_id == to_id {
        return vec![from_id.to_string()];
    }

    // child -> parent, recorded on first discovery
    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(from_id);
    queue.push_back(from_id);

    while let Some(current) = queue.pop_front() {
        for next in neighbors(topology, current) {
            if !visited.insert(next) {
                continue;
            }
            parent.insert(next, current);
            if next == to_id {
                let mut path = vec![to_id.to_string()];
                let mut cursor = to_id;
                while let Some(&prev) = parent.get(cursor) {
                    path.push(prev.to_string());
                    cursor = prev;
                }
                path.reverse();
                return path;
            }
            queue.push_back(next);
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Cable, CableStatus, CableType, DeviceStatus, DeviceType, NetworkDevice};

    fn device(id: &str) -> NetworkDevice {
        NetworkDevice {
            id: id.to_string(),
            device_type: DeviceType::Pc,
            name: id.to_string(),
            x: 0.0,
            y: 0.0,
            interfaces: Vec::new(),
            dhcp_config: None,
            dns_config: None,
            routing_table: None,
            vlan_id: None,
            hostname: id.to_string(),
            status: DeviceStatus::Online,
        }
    }

    fn cable(id: &str, from: &str, to: &str) -> Cable {
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

    fn topology(ids: &[&str], links: &[(&str, &str)]) -> Topology {
        Topology {
            devices: ids.iter().map(|id| device(id)).collect(),
            cables: links
                .iter()
                .enumerate()
                .map(|(i, (a, b))| cable(&format!("c{}", i), a, b))
                .collect(),
        }
    }

    #[test]
    fn test_is_connected_follows_cables_both_ways() {
        let t = topology(&["a", "b", "c", "d"], &[("a", "b"), ("c", "b")]);
        assert!(is_connected(&t, "a", "c"));
        assert!(is_connected(&t, "c", "a"));
        assert!(!is_connected(&t, "a", "d"));
        assert!(is_connected(&t, "d", "d"));
    }

    #[test]
    fn test_empty_topology_is_not_fully_connected() {
        assert!(!is_fully_connected(&Topology::default()));
    }

    #[test]
    fn test_single_device_is_fully_connected() {
        assert!(is_fully_connected(&topology(&["a"], &[])));
    }

    #[test]
    fn test_full_connectivity() {
        let star = topology(&["s", "a", "b"], &[("s", "a"), ("s", "b")]);
        assert!(is_fully_connected(&star));
        let split = topology(&["s", "a", "b"], &[("s", "a")]);
        assert!(!is_fully_connected(&split));
    }

    #[test]
    fn test_find_path_is_shortest() {
        // a-b-c-d plus shortcut a-d
        let t = topology(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")]);
        assert_eq!(find_path(&t, "a", "d"), vec!["a", "d"]);
        assert_eq!(find_path(&t, "a", "c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_path_ties_follow_cable_order() {
        // Two 2-hop routes a->x->z and a->y->z; x's cable was laid first
        let t = topology(&["a", "x", "y", "z"], &[("a", "x"), ("a", "y"), ("y", "z"), ("x", "z")]);
        assert_eq!(find_path(&t, "a", "z"), vec!["a", "x", "z"]);
    }

    #[test]
    fn test_find_path_unreachable_is_empty() {
        let t = topology(&["a", "b"], &[]);
        assert!(find_path(&t, "a", "b").is_empty());
        assert_eq!(find_path(&t, "a", "a"), vec!["a"]);
    }

    #[test]
    fn test_adding_cable_never_shrinks_reachability() {
        let mut t = topology(&["a", "b", "c", "d"], &[("a", "b")]);
        let before: HashSet<String> = reachable_from(&t, "a").into_iter().map(String::from).collect();
        t.cables.push(cable("extra", "c", "d"));
        let after_unrelated: HashSet<String> = reachable_from(&t, "a").into_iter().map(String::from).collect();
        assert!(before.is_subset(&after_unrelated));
        t.cables.push(cable("bridge", "b", "c"));
        let after_bridge: HashSet<String> = reachable_from(&t, "a").into_iter().map(String::from).collect();
        assert!(after_unrelated.is_subset(&after_bridge));
        assert_eq!(after_bridge.len(), 4);
    }
}
