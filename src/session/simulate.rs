//! Simulated ping, DHCP discovery and DNS resolution.
//!
//! Each operation inspects the live topology once, narrates the exchange on
//! the console and returns a structured outcome. None of them ever errors.

use chrono::{DateTime, Duration, Utc};

use super::outcome::{
    DhcpAssignment, DhcpFailure, DhcpOutcome, DnsFailure, DnsOutcome, PingFailure, PingOutcome,
};
use super::NetworkSession;
use crate::ip::{is_in_same_subnet, AddressPool};
use crate::topology::{is_connected, DeviceType, DhcpLease};

const SAME_SUBNET_TTL: u8 = 64;
const ROUTED_TTL: u8 = 63;

impl NetworkSession {
    /// Ping `dest_ip` from the first addressed interface of `source_id`.
    ///
    /// Within one subnet the reply needs a cable path between both devices.
    /// Across subnets a configured gateway on the source is enough.
    pub fn simulate_ping(&mut self, source_id: &str, dest_ip: &str) -> PingOutcome {
        let outcome = self.ping_outcome(source_id, dest_ip);
        let source = self.topology.device(source_id);
        let source_name = source.map_or_else(|| source_id.to_string(), |d| d.name.clone());
        let source_ip = source
            .and_then(|d| d.first_addressed_interface())
            .map(|i| i.ip_address.clone());

        if let Some(source_ip) = source_ip {
            self.console
                .log(format!("Ping from {} ({}) to {}...", source_name, source_ip, dest_ip));
        }

        match &outcome {
            PingOutcome::Reply {
                dest_ip,
                ttl,
                via_gateway,
                ..
            } => {
                match via_gateway {
                    Some(gateway) => {
                        self.console.log(format!("Routing via gateway {}...", gateway));
                        self.console.log(format!(
                            "Reply from {}: bytes=32 time=2ms TTL={}",
                            dest_ip, ttl
                        ));
                    }
                    None => {
                        self.console.log(format!(
                            "Reply from {}: bytes=32 time<1ms TTL={}",
                            dest_ip, ttl
                        ));
                        self.console.log(format!(
                            "Ping statistics for {}: Packets: sent = 1, received = 1, lost = 0",
                            dest_ip
                        ));
                    }
                }
            }
            PingOutcome::Failed(failure @ PingFailure::UnknownSource(_)) => {
                self.console.log(format!("Error: {}", failure));
            }
            PingOutcome::Failed(failure) => {
                self.console.log(format!("{}: {}", source_name, failure));
            }
        }
        outcome
    }

    fn ping_outcome(&self, source_id: &str, dest_ip: &str) -> PingOutcome {
        let Some(source) = self.topology.device(source_id) else {
            return PingOutcome::Failed(PingFailure::UnknownSource(source_id.to_string()));
        };
        let Some(source_iface) = source.first_addressed_interface() else {
            return PingOutcome::Failed(PingFailure::NoSourceAddress);
        };
        let Some(dest) = self.topology.device_with_ip(dest_ip) else {
            return PingOutcome::Failed(PingFailure::HostUnreachable);
        };

        if is_in_same_subnet(&source_iface.ip_address, dest_ip, &source_iface.subnet_mask) {
            if !is_connected(&self.topology, &source.id, &dest.id) {
                return PingOutcome::Failed(PingFailure::TimedOut);
            }
            return PingOutcome::Reply {
                source_ip: source_iface.ip_address.clone(),
                dest_ip: dest_ip.to_string(),
                ttl: SAME_SUBNET_TTL,
                via_gateway: None,
            };
        }

        if !source_iface.has_gateway() {
            return PingOutcome::Failed(PingFailure::NoGateway);
        }
        // Routed traffic is not traced hop by hop; a gateway is trusted to deliver.
        PingOutcome::Reply {
            source_ip: source_iface.ip_address.clone(),
            dest_ip: dest_ip.to_string(),
            ttl: ROUTED_TTL,
            via_gateway: Some(source_iface.gateway.clone()),
        }
    }

    /// Run a full DISCOVER/OFFER/REQUEST/ACK exchange for `device_id`.
    ///
    /// On success the server records a lease and the client's first
    /// DHCP-enabled interface takes the offered address in the same step.
    pub fn run_dhcp_discovery(&mut self, device_id: &str) -> DhcpOutcome {
        self.run_dhcp_discovery_at(device_id, Utc::now())
    }

    /// [`run_dhcp_discovery`](Self::run_dhcp_discovery) with an explicit clock
    pub fn run_dhcp_discovery_at(&mut self, device_id: &str, now: DateTime<Utc>) -> DhcpOutcome {
        let Some(client) = self.topology.device(device_id) else {
            let failure = DhcpFailure::UnknownDevice(device_id.to_string());
            self.console.log(format!("Error: {}", failure));
            return DhcpOutcome::Failed(failure);
        };
        let client_name = client.name.clone();

        let Some(client_iface) = client.interfaces.iter().find(|i| i.dhcp_enabled) else {
            return self.dhcp_failed(&client_name, DhcpFailure::DhcpDisabled);
        };
        let interface_id = client_iface.id.clone();
        let client_mac = client_iface.mac_address.clone();
        let client_hostname = client.hostname.clone();

        self.console
            .log(format!("{}: sending DHCP DISCOVER (broadcast)...", client_name));

        let server = self
            .topology
            .devices_of(DeviceType::DhcpServer)
            .find(|d| d.dhcp_config.as_ref().is_some_and(|c| c.enabled));
        let Some(server) = server else {
            return self.dhcp_failed(&client_name, DhcpFailure::NoServer);
        };
        if !is_connected(&self.topology, device_id, &server.id) {
            return self.dhcp_failed(&client_name, DhcpFailure::ServerUnreachable);
        }

        let server_id = server.id.clone();
        let server_name = server.name.clone();
        let Some(config) = server.dhcp_config.clone() else {
            return self.dhcp_failed(&client_name, DhcpFailure::NoServer);
        };

        let offered = config
            .has_pool()
            .then(|| {
                AddressPool::new(&config.pool_start, &config.pool_end)
                    .first_free(config.leases.iter().map(|l| l.ip_address.as_str()))
            })
            .flatten();
        let Some(ip_address) = offered else {
            return self.dhcp_failed(&server_name, DhcpFailure::PoolExhausted);
        };

        self.console.log(format!("{}: DHCP OFFER received", server_name));
        self.console
            .log(format!("{}: DHCP REQUEST for {}", client_name, ip_address));

        let lease = DhcpLease {
            mac_address: client_mac,
            ip_address: ip_address.clone(),
            hostname: client_hostname,
            expires_at: lease_expiry(now, config.lease_time),
        };
        if let Some(server_config) = self
            .topology
            .device_mut(&server_id)
            .and_then(|d| d.dhcp_config.as_mut())
        {
            server_config.leases.push(lease);
        }
        if let Some(iface) = self
            .topology
            .device_mut(device_id)
            .and_then(|d| d.interface_mut(&interface_id))
        {
            iface.ip_address = ip_address.clone();
            iface.subnet_mask = config.subnet_mask.clone();
            iface.gateway = config.gateway.clone();
        }

        self.console.log(format!(
            "{}: DHCP ACK - address {} assigned",
            server_name, ip_address
        ));
        self.console
            .log(format!("{}: IP configuration obtained via DHCP", client_name));
        self.console.log(format!("  IP: {}", ip_address));
        self.console.log(format!("  Mask: {}", config.subnet_mask));
        self.console.log(format!("  Gateway: {}", config.gateway));

        DhcpOutcome::Assigned(DhcpAssignment {
            client_id: device_id.to_string(),
            interface_id,
            server_id,
            ip_address,
            subnet_mask: config.subnet_mask,
            gateway: config.gateway,
        })
    }

    fn dhcp_failed(&mut self, who: &str, failure: DhcpFailure) -> DhcpOutcome {
        self.console.log(format!("{}: {}", who, failure));
        DhcpOutcome::Failed(failure)
    }

    /// Look `hostname` up on the first enabled DNS server.
    ///
    /// Only records are consulted; cabling between client and server is not.
    pub fn resolve_dns(&mut self, device_id: &str, hostname: &str) -> DnsOutcome {
        let Some(client) = self.topology.device(device_id) else {
            let failure = DnsFailure::UnknownDevice(device_id.to_string());
            self.console.log(format!("Error: {}", failure));
            return DnsOutcome::Failed(failure);
        };
        let client_name = client.name.clone();

        self.console
            .log(format!("{}: resolving {}...", client_name, hostname));

        let record = self
            .topology
            .devices_of(DeviceType::DnsServer)
            .filter_map(|d| d.dns_config.as_ref())
            .find(|c| c.enabled)
            .map(|c| c.lookup(hostname).cloned());

        let outcome = match record {
            None => DnsOutcome::Failed(DnsFailure::NoServer),
            Some(None) => DnsOutcome::Failed(DnsFailure::NotFound(hostname.to_string())),
            Some(Some(record)) => DnsOutcome::Resolved(record),
        };

        match &outcome {
            DnsOutcome::Resolved(record) => self.console.log(format!(
                "{}: {} resolved to {}",
                client_name, hostname, record.ip_address
            )),
            DnsOutcome::Failed(failure) => {
                self.console.log(format!("{}: {}", client_name, failure))
            }
        }
        outcome
    }
}

/// `now + lease_time`, saturating at the far end of the calendar
fn lease_expiry(now: DateTime<Utc>, lease_time: u64) -> DateTime<Utc> {
    i64::try_from(lease_time)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
