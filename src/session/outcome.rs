//! Structured results of the simulated network operations.
//!
//! Ping, DHCP discovery and DNS lookup never fail with an error: every
//! expected problem is a failure variant whose `Display` text is the line
//! written to the console.

use thiserror::Error;

use crate::topology::DnsRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PingFailure {
    #[error("source device {0} not found")]
    UnknownSource(String),
    #[error("no IP address configured")]
    NoSourceAddress,
    #[error("destination host unreachable")]
    HostUnreachable,
    #[error("request timed out")]
    TimedOut,
    #[error("no gateway configured to reach this network")]
    NoGateway,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    Reply {
        source_ip: String,
        dest_ip: String,
        ttl: u8,
        /// Gateway used when the destination sits in another subnet
        via_gateway: Option<String>,
    },
    Failed(PingFailure),
}

impl PingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PingOutcome::Reply { .. })
    }

    pub fn failure(&self) -> Option<&PingFailure> {
        match self {
            PingOutcome::Failed(failure) => Some(failure),
            PingOutcome::Reply { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DhcpFailure {
    #[error("device {0} not found")]
    UnknownDevice(String),
    #[error("DHCP not enabled on any interface")]
    DhcpDisabled,
    #[error("no DHCP server available")]
    NoServer,
    #[error("DHCP server not reachable (no connection)")]
    ServerUnreachable,
    #[error("DHCP pool exhausted")]
    PoolExhausted,
}

/// Addressing handed to a client by a successful discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpAssignment {
    pub client_id: String,
    pub interface_id: String,
    pub server_id: String,
    pub ip_address: String,
    pub subnet_mask: String,
    pub gateway: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhcpOutcome {
    Assigned(DhcpAssignment),
    Failed(DhcpFailure),
}

impl DhcpOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DhcpOutcome::Assigned(_))
    }

    pub fn assignment(&self) -> Option<&DhcpAssignment> {
        match self {
            DhcpOutcome::Assigned(assignment) => Some(assignment),
            DhcpOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DhcpFailure> {
        match self {
            DhcpOutcome::Failed(failure) => Some(failure),
            DhcpOutcome::Assigned(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsFailure {
    #[error("device {0} not found")]
    UnknownDevice(String),
    #[error("no DNS server available")]
    NoServer,
    #[error("unable to resolve {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DnsOutcome {
    Resolved(DnsRecord),
    Failed(DnsFailure),
}

impl DnsOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DnsOutcome::Resolved(_))
    }

    /// Resolved address, if any
    pub fn address(&self) -> Option<&str> {
        match self {
            DnsOutcome::Resolved(record) => Some(&record.ip_address),
            DnsOutcome::Failed(_) => None,
        }
    }
}
