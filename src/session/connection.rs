//! Two-phase cable connection protocol.
//!
//! The user first picks a source interface (`start_connection`), then a
//! destination interface (`complete_connection`). Between the two clicks the
//! session is armed; completing, rejecting or cancelling returns it to idle.

use thiserror::Error;

/// Connect-mode state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    #[default]
    Idle,
    ArmedFrom {
        device_id: String,
        interface_id: String,
    },
}

impl ConnectionMode {
    pub fn arm(device_id: &str, interface_id: &str) -> Self {
        ConnectionMode::ArmedFrom {
            device_id: device_id.to_string(),
            interface_id: interface_id.to_string(),
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, ConnectionMode::ArmedFrom { .. })
    }

    /// The armed source endpoint as (device id, interface id)
    pub fn source(&self) -> Option<(&str, &str)> {
        match self {
            ConnectionMode::Idle => None,
            ConnectionMode::ArmedFrom {
                device_id,
                interface_id,
            } => Some((device_id, interface_id)),
        }
    }
}

/// Why a completed connection was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectRejection {
    #[error("cannot connect a device to itself")]
    SelfLoop,
    #[error("device {0} does not exist")]
    UnknownDevice(String),
    #[error("interface {interface_id} does not exist on device {device_id}")]
    UnknownInterface {
        device_id: String,
        interface_id: String,
    },
    #[error("interface {interface_id} on device {device_id} is already cabled")]
    InterfaceInUse {
        device_id: String,
        interface_id: String,
    },
}

/// Result of `complete_connection`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Connect mode was not armed; nothing happened
    NotArmed,
    Connected { cable_id: String },
    Rejected(ConnectRejection),
}

impl ConnectOutcome {
    pub fn cable_id(&self) -> Option<&str> {
        match self {
            ConnectOutcome::Connected { cable_id } => Some(cable_id),
            _ => None,
        }
    }
}
