//! Topology mutation engine.
//!
//! [`NetworkSession`] owns the one live [`Topology`] of an editing session
//! together with the transient UI state around it: the current selection,
//! the two-phase connect mode and the console trace. Every operation is
//! synchronous and leaves the topology consistent before it returns. The
//! session is a plain owned value; a multi-threaded host wraps the whole
//! session in a single lock.

pub mod connection;
pub mod console;
pub mod outcome;
mod simulate;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::store::TopologyStore;
use crate::topology::{
    Cable, CableStatus, CableType, DeviceFactory, DeviceType, NetworkDevice, Topology,
};

pub use connection::{ConnectOutcome, ConnectRejection, ConnectionMode};
pub use console::Console;
pub use outcome::{
    DhcpAssignment, DhcpFailure, DhcpOutcome, DnsFailure, DnsOutcome, PingFailure, PingOutcome,
};

/// Referential-integrity errors for calls naming something that is not there
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("device {0} not found")]
    UnknownDevice(String),
    #[error("cable {0} not found")]
    UnknownCable(String),
}

/// What the user currently has selected; at most one thing at a time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Device(String),
    Cable(String),
}

/// Single-owner editing session over one topology
#[derive(Debug)]
pub struct NetworkSession {
    topology: Topology,
    selection: Selection,
    connection: ConnectionMode,
    console: Console,
    factory: DeviceFactory,
}

impl NetworkSession {
    /// Empty session with an entropy-seeded id generator
    pub fn new() -> Self {
        Self::with_parts(DeviceFactory::new(), Console::default())
    }

    /// Empty session whose ids, MACs and names are reproducible
    pub fn seeded(seed: u64) -> Self {
        Self::with_parts(DeviceFactory::seeded(seed), Console::default())
    }

    /// Empty session honouring the `session` section of the configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        let mut factory = match config.seed {
            Some(seed) => DeviceFactory::seeded(seed),
            None => DeviceFactory::new(),
        };
        if let Some(lease_time) = config.lease_time {
            factory.set_lease_time(lease_time.as_secs());
        }
        Self::with_parts(factory, Console::new(config.max_console_lines))
    }

    fn with_parts(factory: DeviceFactory, console: Console) -> Self {
        NetworkSession {
            topology: Topology::default(),
            selection: Selection::None,
            connection: ConnectionMode::Idle,
            console,
            factory,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn connection_mode(&self) -> &ConnectionMode {
        &self.connection
    }

    pub fn selected_device(&self) -> Option<&NetworkDevice> {
        match &self.selection {
            Selection::Device(id) => self.topology.device(id),
            _ => None,
        }
    }

    pub fn selected_cable(&self) -> Option<&Cable> {
        match &self.selection {
            Selection::Cable(id) => self.topology.cable(id),
            _ => None,
        }
    }

    /// Place a device built from its type's template; returns the new id
    pub fn add_device(&mut self, device_type: DeviceType, x: f64, y: f64) -> String {
        let device = self.factory.build(device_type, x, y);
        let id = device.id.clone();
        self.console
            .log(format!("Device added: {} ({})", device.name, device_type));
        self.topology.devices.push(device);
        id
    }

    /// Remove a device and every cable attached to it.
    ///
    /// The far ends of the removed cables are marked disconnected again.
    pub fn remove_device(&mut self, id: &str) -> Option<NetworkDevice> {
        let index = self.topology.devices.iter().position(|d| d.id == id)?;

        let (detached, kept): (Vec<Cable>, Vec<Cable>) = std::mem::take(&mut self.topology.cables)
            .into_iter()
            .partition(|c| c.touches(id));
        self.topology.cables = kept;

        for cable in &detached {
            if cable.from_device_id != id {
                self.detach_endpoint(&cable.from_device_id, &cable.from_interface_id);
            }
            if cable.to_device_id != id {
                self.detach_endpoint(&cable.to_device_id, &cable.to_interface_id);
            }
        }

        let device = self.topology.devices.remove(index);
        self.console.log(format!("Device removed: {}", device.name));

        let selection_gone = match &self.selection {
            Selection::Device(selected) => selected == id,
            Selection::Cable(selected) => detached.iter().any(|c| &c.id == selected),
            Selection::None => false,
        };
        if selection_gone {
            self.selection = Selection::None;
        }

        Some(device)
    }

    /// Replace the stored device with the same id by `device`, wholesale
    pub fn update_device(&mut self, device: NetworkDevice) -> Result<(), SessionError> {
        let slot = self
            .topology
            .device_mut(&device.id)
            .ok_or_else(|| SessionError::UnknownDevice(device.id.clone()))?;
        *slot = device;
        Ok(())
    }

    /// Set a device's canvas position; bounds are the caller's concern
    pub fn move_device(&mut self, id: &str, x: f64, y: f64) -> Result<(), SessionError> {
        let device = self
            .topology
            .device_mut(id)
            .ok_or_else(|| SessionError::UnknownDevice(id.to_string()))?;
        device.x = x;
        device.y = y;
        Ok(())
    }

    /// Select a device (or nothing); any selected cable is deselected
    pub fn select_device(&mut self, id: Option<&str>) {
        self.selection = match id {
            Some(id) => Selection::Device(id.to_string()),
            None => Selection::None,
        };
    }

    /// Select a cable (or nothing); any selected device is deselected
    pub fn select_cable(&mut self, id: Option<&str>) {
        self.selection = match id {
            Some(id) => Selection::Cable(id.to_string()),
            None => Selection::None,
        };
    }

    /// Arm connect mode with the source endpoint
    pub fn start_connection(&mut self, device_id: &str, interface_id: &str) {
        self.connection = ConnectionMode::arm(device_id, interface_id);
        self.console
            .log("Connection mode: select the destination interface");
    }

    /// Finish a connection started with [`start_connection`](Self::start_connection).
    ///
    /// Does nothing unless connect mode is armed. Whatever the outcome, the
    /// session is back to idle afterwards.
    pub fn complete_connection(&mut self, to_device_id: &str, to_interface_id: &str) -> ConnectOutcome {
        let (from_device_id, from_interface_id) = match std::mem::take(&mut self.connection) {
            ConnectionMode::Idle => return ConnectOutcome::NotArmed,
            ConnectionMode::ArmedFrom {
                device_id,
                interface_id,
            } => (device_id, interface_id),
        };

        if let Err(rejection) =
            self.check_endpoints(&from_device_id, &from_interface_id, to_device_id, to_interface_id)
        {
            self.console.log(format!("Error: {}", rejection));
            return ConnectOutcome::Rejected(rejection);
        }

        let cable = Cable {
            id: self.factory.generate_cable_id(),
            from_device_id: from_device_id.clone(),
            from_interface_id: from_interface_id.clone(),
            to_device_id: to_device_id.to_string(),
            to_interface_id: to_interface_id.to_string(),
            cable_type: CableType::Ethernet,
            status: CableStatus::Connected,
        };

        if let Some(iface) = self
            .topology
            .device_mut(&from_device_id)
            .and_then(|d| d.interface_mut(&from_interface_id))
        {
            iface.attach(to_device_id);
        }
        if let Some(iface) = self
            .topology
            .device_mut(to_device_id)
            .and_then(|d| d.interface_mut(to_interface_id))
        {
            iface.attach(&from_device_id);
        }

        let cable_id = cable.id.clone();
        let names = (
            self.device_name(&from_device_id),
            self.device_name(to_device_id),
        );
        self.topology.cables.push(cable);
        self.console
            .log(format!("Cable connected between {} and {}", names.0, names.1));

        ConnectOutcome::Connected { cable_id }
    }

    /// Leave connect mode without creating anything
    pub fn cancel_connection(&mut self) {
        self.connection = ConnectionMode::Idle;
        self.console.log("Connection mode cancelled");
    }

    /// Both connect steps at once
    pub fn connect(
        &mut self,
        from_device_id: &str,
        from_interface_id: &str,
        to_device_id: &str,
        to_interface_id: &str,
    ) -> ConnectOutcome {
        self.start_connection(from_device_id, from_interface_id);
        self.complete_connection(to_device_id, to_interface_id)
    }

    /// Delete a cable and free both of its interfaces
    pub fn remove_cable(&mut self, id: &str) -> Option<Cable> {
        let index = self.topology.cables.iter().position(|c| c.id == id)?;
        let cable = self.topology.cables.remove(index);

        self.detach_endpoint(&cable.from_device_id, &cable.from_interface_id);
        self.detach_endpoint(&cable.to_device_id, &cable.to_interface_id);
        self.console.log("Cable disconnected");

        if self.selection == Selection::Cable(id.to_string()) {
            self.selection = Selection::None;
        }
        Some(cable)
    }

    pub fn add_console_log(&mut self, message: impl AsRef<str>) {
        self.console.log(message);
    }

    pub fn clear_console(&mut self) {
        self.console.reset(console::CLEARED_BANNER);
    }

    /// Drop every device and cable and reset the surrounding UI state
    pub fn clear_topology(&mut self) {
        self.topology = Topology::default();
        self.selection = Selection::None;
        self.connection = ConnectionMode::Idle;
        self.console.reset(console::RESET_BANNER);
    }

    /// Swap in a whole topology, e.g. one loaded from storage
    pub fn replace_topology(&mut self, topology: Topology) {
        let dangling = topology.dangling_cables().len();
        if dangling > 0 {
            warn!("Loaded topology has {} cable(s) referencing missing endpoints", dangling);
        }

        self.factory.reserve_macs(
            topology
                .devices
                .iter()
                .flat_map(|d| d.interfaces.iter())
                .map(|i| i.mac_address.as_str()),
        );
        self.factory
            .skip_device_ids(topology.devices.iter().map(|d| d.id.as_str()));
        self.factory
            .skip_cable_ids(topology.cables.iter().map(|c| c.id.as_str()));

        self.topology = topology;
        self.selection = Selection::None;
        self.connection = ConnectionMode::Idle;
    }

    /// Persist the live topology; failures are logged, never fatal
    pub fn save_topology(&self, store: &dyn TopologyStore, user_id: &str, exercise_id: &str) -> bool {
        match store.save_topology(user_id, exercise_id, &self.topology) {
            Ok(()) => {
                info!("Saved topology for user {} exercise {}", user_id, exercise_id);
                true
            }
            Err(e) => {
                error!("Error saving topology: {}", e);
                false
            }
        }
    }

    /// Replace the live topology with the stored one, if there is one
    pub fn load_topology(&mut self, store: &dyn TopologyStore, user_id: &str, exercise_id: &str) -> bool {
        match store.load_topology(user_id, exercise_id) {
            Ok(Some(topology)) => {
                self.replace_topology(topology);
                self.console.log("Topology loaded from storage");
                true
            }
            Ok(None) => {
                debug!("No saved topology for user {} exercise {}", user_id, exercise_id);
                false
            }
            Err(e) => {
                error!("Error loading topology: {}", e);
                false
            }
        }
    }

    fn device_name(&self, id: &str) -> String {
        self.topology
            .device(id)
            .map_or_else(|| id.to_string(), |d| d.name.clone())
    }

    fn detach_endpoint(&mut self, device_id: &str, interface_id: &str) {
        if let Some(iface) = self
            .topology
            .device_mut(device_id)
            .and_then(|d| d.interface_mut(interface_id))
        {
            iface.detach();
        }
    }

    fn check_endpoints(
        &self,
        from_device_id: &str,
        from_interface_id: &str,
        to_device_id: &str,
        to_interface_id: &str,
    ) -> Result<(), ConnectRejection> {
        if from_device_id == to_device_id {
            return Err(ConnectRejection::SelfLoop);
        }
        for (device_id, interface_id) in [
            (from_device_id, from_interface_id),
            (to_device_id, to_interface_id),
        ] {
            let device = self
                .topology
                .device(device_id)
                .ok_or_else(|| ConnectRejection::UnknownDevice(device_id.to_string()))?;
            let iface = device
                .interface(interface_id)
                .ok_or_else(|| ConnectRejection::UnknownInterface {
                    device_id: device_id.to_string(),
                    interface_id: interface_id.to_string(),
                })?;
            if iface.connected {
                return Err(ConnectRejection::InterfaceInUse {
                    device_id: device_id.to_string(),
                    interface_id: interface_id.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for NetworkSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn session_with(types: &[DeviceType]) -> (NetworkSession, Vec<String>) {
        let mut session = NetworkSession::seeded(11);
        let ids = types
            .iter()
            .enumerate()
            .map(|(i, t)| session.add_device(*t, i as f64 * 100.0, 0.0))
            .collect();
        (session, ids)
    }

    #[test]
    fn test_add_device_logs_and_appends() {
        let (session, ids) = session_with(&[DeviceType::Router]);
        assert_eq!(session.topology().devices.len(), 1);
        assert_eq!(session.topology().devices[0].id, ids[0]);
        assert!(session.console().contains("Device added: Router-"));
        assert!(session.console().contains("(router)"));
    }

    #[test]
    fn test_connect_marks_both_interfaces() {
        let (mut session, ids) = session_with(&[DeviceType::Switch, DeviceType::Pc]);
        let outcome = session.connect(&ids[0], "port0", &ids[1], "eth0");
        let cable_id = outcome.cable_id().expect("connected").to_string();

        let topology = session.topology();
        assert_eq!(topology.cables.len(), 1);
        assert_eq!(topology.cables[0].id, cable_id);
        let port = topology.device(&ids[0]).and_then(|d| d.interface("port0")).expect("port");
        let eth = topology.device(&ids[1]).and_then(|d| d.interface("eth0")).expect("eth");
        assert!(port.connected && eth.connected);
        assert_eq!(port.connected_to.as_deref(), Some(ids[1].as_str()));
        assert_eq!(eth.connected_to.as_deref(), Some(ids[0].as_str()));
        assert!(!session.connection_mode().is_armed());
    }

    #[test]
    fn test_complete_without_start_is_noop() {
        let (mut session, ids) = session_with(&[DeviceType::Pc, DeviceType::Pc]);
        let lines_before = session.console().len();
        assert_eq!(session.complete_connection(&ids[1], "eth0"), ConnectOutcome::NotArmed);
        assert!(session.topology().cables.is_empty());
        assert_eq!(session.console().len(), lines_before);
    }

    #[test]
    fn test_self_loop_rejected_and_mode_cleared() {
        let (mut session, ids) = session_with(&[DeviceType::Switch]);
        session.start_connection(&ids[0], "port0");
        let outcome = session.complete_connection(&ids[0], "port1");
        assert_eq!(outcome, ConnectOutcome::Rejected(ConnectRejection::SelfLoop));
        assert!(session.topology().cables.is_empty());
        assert!(!session.connection_mode().is_armed());
        assert!(session.console().contains("Error: cannot connect a device to itself"));
    }

    #[test]
    fn test_busy_interface_rejected() {
        let (mut session, ids) = session_with(&[DeviceType::Switch, DeviceType::Pc, DeviceType::Pc]);
        assert!(session.connect(&ids[0], "port0", &ids[1], "eth0").cable_id().is_some());
        let outcome = session.connect(&ids[2], "eth0", &ids[1], "eth0");
        assert!(matches!(
            outcome,
            ConnectOutcome::Rejected(ConnectRejection::InterfaceInUse { .. })
        ));
        assert_eq!(session.topology().cables.len(), 1);
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let (mut session, ids) = session_with(&[DeviceType::Pc]);
        let outcome = session.connect(&ids[0], "eth0", "ghost", "eth0");
        assert_eq!(
            outcome,
            ConnectOutcome::Rejected(ConnectRejection::UnknownDevice("ghost".to_string()))
        );
        let outcome = session.connect(&ids[0], "eth9", "ghost", "eth0");
        assert!(matches!(
            outcome,
            ConnectOutcome::Rejected(ConnectRejection::UnknownInterface { .. })
        ));
    }

    #[test]
    fn test_cancel_connection() {
        let (mut session, ids) = session_with(&[DeviceType::Pc]);
        session.start_connection(&ids[0], "eth0");
        assert!(session.connection_mode().is_armed());
        session.cancel_connection();
        assert_eq!(session.connection_mode(), &ConnectionMode::Idle);
        assert!(session.console().contains("Connection mode cancelled"));
    }

    #[test]
    fn test_remove_cable_resets_interfaces() {
        let (mut session, ids) = session_with(&[DeviceType::Switch, DeviceType::Pc]);
        let cable_id = session
            .connect(&ids[0], "port3", &ids[1], "eth0")
            .cable_id()
            .expect("connected")
            .to_string();
        session.select_cable(Some(&cable_id));

        let removed = session.remove_cable(&cable_id).expect("removed");
        assert_eq!(removed.from_interface_id, "port3");
        assert!(session.topology().cables.is_empty());
        for (dev, iface) in [(&ids[0], "port3"), (&ids[1], "eth0")] {
            let i = session.topology().device(dev).and_then(|d| d.interface(iface)).expect("iface");
            assert!(!i.connected);
            assert!(i.connected_to.is_none());
        }
        assert_eq!(session.selection(), &Selection::None);
        assert!(session.remove_cable(&cable_id).is_none());
    }

    #[test]
    fn test_remove_device_drops_cables_and_frees_peers() {
        let (mut session, ids) = session_with(&[DeviceType::Switch, DeviceType::Pc, DeviceType::Pc]);
        session.connect(&ids[0], "port0", &ids[1], "eth0");
        session.connect(&ids[2], "eth0", &ids[0], "port1");
        session.select_device(Some(&ids[0]));

        let removed = session.remove_device(&ids[0]).expect("removed");
        assert_eq!(removed.id, ids[0]);
        assert!(session.topology().cables.is_empty());
        assert_eq!(session.topology().devices.len(), 2);
        for id in &ids[1..] {
            let eth = session.topology().device(id).and_then(|d| d.interface("eth0")).expect("eth0");
            assert!(!eth.connected);
        }
        assert_eq!(session.selection(), &Selection::None);
        assert!(session.remove_device(&ids[0]).is_none());
    }

    #[test]
    fn test_update_device_is_full_replace() {
        let (mut session, ids) = session_with(&[DeviceType::Pc]);
        let mut device = session.topology().device(&ids[0]).cloned().expect("device");
        device.hostname = "workstation".to_string();
        device.interfaces[0].ip_address = "192.168.1.50".to_string();
        session.update_device(device.clone()).expect("update");
        assert_eq!(session.topology().device(&ids[0]), Some(&device));

        device.id = "missing".to_string();
        assert_eq!(
            session.update_device(device),
            Err(SessionError::UnknownDevice("missing".to_string()))
        );
    }

    #[test]
    fn test_move_device() {
        let (mut session, ids) = session_with(&[DeviceType::Pc]);
        session.move_device(&ids[0], 250.0, 125.0).expect("move");
        let device = session.topology().device(&ids[0]).expect("device");
        assert_eq!((device.x, device.y), (250.0, 125.0));
        assert!(session.move_device("nope", 0.0, 0.0).is_err());
    }

    #[test]
    fn test_selection_is_exclusive() {
        let (mut session, ids) = session_with(&[DeviceType::Switch, DeviceType::Pc]);
        let cable_id = session
            .connect(&ids[0], "port0", &ids[1], "eth0")
            .cable_id()
            .expect("connected")
            .to_string();
        session.select_device(Some(&ids[1]));
        assert_eq!(session.selected_device().map(|d| d.id.as_str()), Some(ids[1].as_str()));
        session.select_cable(Some(&cable_id));
        assert!(session.selected_device().is_none());
        assert_eq!(session.selected_cable().map(|c| c.id.as_str()), Some(cable_id.as_str()));
    }

    #[test]
    fn test_clear_console_and_topology() {
        let (mut session, _) = session_with(&[DeviceType::Pc, DeviceType::Pc]);
        session.clear_console();
        assert_eq!(session.console().lines(), &[console::CLEARED_BANNER.to_string()]);
        session.clear_topology();
        assert!(session.topology().is_empty());
        assert_eq!(session.console().lines(), &[console::RESET_BANNER.to_string()]);
    }

    #[test]
    fn test_save_and_load_round_trip_through_store() {
        let store = MemoryStore::new();
        let (mut session, ids) = session_with(&[DeviceType::Switch, DeviceType::Pc]);
        session.connect(&ids[0], "port0", &ids[1], "eth0");
        assert!(session.save_topology(&store, "alice", "ex1"));
        let saved = session.topology().clone();

        let mut other = NetworkSession::seeded(99);
        assert!(!other.load_topology(&store, "alice", "ex2"));
        assert!(other.load_topology(&store, "alice", "ex1"));
        assert_eq!(other.topology(), &saved);
        assert!(other.console().contains("Topology loaded from storage"));

        // New cables do not collide with loaded ids
        let pc = other.add_device(DeviceType::Pc, 0.0, 0.0);
        let cable = other.connect(&ids[0], "port1", &pc, "eth0");
        assert_eq!(cable.cable_id(), Some("cable-2"));
    }

    #[test]
    fn test_load_topology_with_largest_ids() {
        let store = MemoryStore::new();
        let (mut session, ids) = session_with(&[DeviceType::Pc, DeviceType::Pc]);
        session.connect(&ids[0], "eth0", &ids[1], "eth0");
        let mut topology = session.topology().clone();
        let huge_device = "device-18446744073709551615-x".to_string();
        for cable in &mut topology.cables {
            cable.id = "cable-18446744073709551615".to_string();
            if cable.from_device_id == ids[0] {
                cable.from_device_id = huge_device.clone();
            } else {
                cable.to_device_id = huge_device.clone();
            }
        }
        topology.devices[1].interfaces[0].connected_to = Some(huge_device.clone());
        topology.devices[0].id = huge_device;
        store.save_topology("alice", "ex1", &topology).unwrap();

        let mut other = NetworkSession::seeded(3);
        assert!(other.load_topology(&store, "alice", "ex1"));
        assert_eq!(other.topology(), &topology);
        let added = other.add_device(DeviceType::Pc, 0.0, 0.0);
        assert!(other.topology().device(&added).is_some());
    }

    #[test]
    fn test_from_config_applies_lease_time_and_cap() {
        let config = SessionConfig {
            seed: Some(5),
            max_console_lines: Some(2),
            lease_time: Some(std::time::Duration::from_secs(600)),
        };
        let mut session = NetworkSession::from_config(&config);
        let id = session.add_device(DeviceType::DhcpServer, 0.0, 0.0);
        session.add_device(DeviceType::Pc, 0.0, 0.0);
        session.add_device(DeviceType::Pc, 0.0, 0.0);
        let lease_time = session
            .topology()
            .device(&id)
            .and_then(|d| d.dhcp_config.as_ref())
            .map(|c| c.lease_time);
        assert_eq!(lease_time, Some(600));
        assert_eq!(session.console().len(), 2);
    }
}
