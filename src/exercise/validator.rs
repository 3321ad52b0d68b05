//! Exercise grading.
//!
//! Each rule is a pure predicate over the current topology snapshot. The
//! score adds a rule's points only when it holds; the maximum adds them
//! regardless. Grading never touches the topology and never fails.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;

use super::rules::{RuleCheck, ValidationRule};
use super::types::{Exercise, ExerciseResult, RuleResult};
use crate::topology::{is_fully_connected, DeviceType, NetworkDevice, Topology};

/// Share of the maximum score, in percent, needed to pass an exercise
pub const PASS_PERCENT: u32 = 70;

/// Whether `score` reaches [`PASS_PERCENT`] of `max_score`
pub fn meets_pass_threshold(score: u32, max_score: u32) -> bool {
    u64::from(score) * 100 >= u64::from(max_score) * u64::from(PASS_PERCENT)
}

/// Grade `topology` against every rule of `exercise`
pub fn validate(exercise: &Exercise, topology: &Topology) -> ExerciseResult {
    validate_at(exercise, topology, Utc::now())
}

/// [`validate`] with an explicit completion timestamp
pub fn validate_at(exercise: &Exercise, topology: &Topology, now: DateTime<Utc>) -> ExerciseResult {
    let mut score: u32 = 0;
    let mut max_score: u32 = 0;
    let mut validation_results = Vec::with_capacity(exercise.validation_rules.len());

    for rule in &exercise.validation_rules {
        max_score = max_score.saturating_add(rule.points);
        let result = evaluate_rule(rule, topology);
        if result.passed {
            score = score.saturating_add(rule.points);
        }
        validation_results.push(result);
    }

    let passed = meets_pass_threshold(score, max_score);
    info!(
        "Exercise {} graded {}/{} ({})",
        exercise.id,
        score,
        max_score,
        if passed { "passed" } else { "failed" }
    );

    ExerciseResult {
        exercise_id: exercise.id.clone(),
        passed,
        score,
        max_score,
        validation_results,
        completed_at: now,
    }
}

/// Evaluate a single rule
pub fn evaluate_rule(rule: &ValidationRule, topology: &Topology) -> RuleResult {
    let verdict = check(&rule.check, topology);
    let (passed, message) = match verdict {
        Verdict::Pass(message) => (true, message),
        Verdict::Fail => (false, rule.error_message.clone()),
        Verdict::Precondition(message) => (false, message.to_string()),
    };
    debug!("Rule {}: {} ({})", rule.check.kind(), passed, message);
    RuleResult {
        rule: rule.clone(),
        passed,
        message,
    }
}

enum Verdict {
    Pass(String),
    /// Predicate does not hold; the rule's own error message applies
    Fail,
    /// Could not even evaluate the predicate
    Precondition(&'static str),
}

impl Verdict {
    fn from_bool(holds: bool, success: impl FnOnce() -> String) -> Verdict {
        if holds {
            Verdict::Pass(success())
        } else {
            Verdict::Fail
        }
    }
}

fn check(rule: &RuleCheck, topology: &Topology) -> Verdict {
    match rule {
        RuleCheck::DeviceExists { device_type } => {
            Verdict::from_bool(topology.first_of(*device_type).is_some(), || {
                format!("Device {} present", device_type)
            })
        }

        RuleCheck::DeviceCount { device_type, min } => {
            let count = topology.count_of(*device_type);
            let min = if *min == 0 { 1 } else { *min as usize };
            Verdict::from_bool(count >= min, || format!("{} {}(s) found", count, device_type))
        }

        RuleCheck::CableExists { min_cables } => {
            let min = if *min_cables == 0 { 1 } else { *min_cables as usize };
            Verdict::from_bool(topology.cables.len() >= min, || {
                "Cables connected".to_string()
            })
        }

        RuleCheck::IpConfigured {
            device_type,
            check_gateway,
        } => {
            let matching: Vec<&NetworkDevice> = match device_type {
                Some(t) => topology.devices_of(*t).collect(),
                None => topology
                    .devices
                    .iter()
                    .filter(|d| d.device_type != DeviceType::Switch)
                    .collect(),
            };
            let addressed = matching
                .iter()
                .all(|d| d.interfaces.iter().any(|i| i.is_addressed()));

            if *check_gateway {
                let gateways = matching
                    .iter()
                    .filter(|d| d.device_type != DeviceType::Router)
                    .all(|d| d.interfaces.iter().any(|i| i.has_gateway()));
                Verdict::from_bool(addressed && gateways, || {
                    "IP addresses and gateways configured".to_string()
                })
            } else {
                Verdict::from_bool(addressed, || "IP addresses configured".to_string())
            }
        }

        RuleCheck::SubnetCorrect { mask } => {
            let pcs: Vec<&NetworkDevice> = topology.devices_of(DeviceType::Pc).collect();
            if pcs.len() < 2 {
                return Verdict::Precondition("Not enough PCs to check");
            }
            let configured: Vec<&str> = pcs
                .iter()
                .filter_map(|pc| pc.interfaces.first())
                .filter(|i| i.is_addressed())
                .map(|i| i.subnet_mask.as_str())
                .collect();
            if configured.len() < 2 {
                return Verdict::Precondition("IPs not configured");
            }
            Verdict::from_bool(configured.iter().all(|m| m == mask), || {
                "Subnet masks correct".to_string()
            })
        }

        RuleCheck::DhcpWorking => {
            let server = topology
                .devices_of(DeviceType::DhcpServer)
                .find_map(|d| d.dhcp_config.as_ref().filter(|c| c.enabled));
            let Some(config) = server else {
                return Verdict::Precondition("DHCP server not configured");
            };
            let client_addressed = topology
                .devices_of(DeviceType::Pc)
                .filter(|pc| pc.interfaces.iter().any(|i| i.dhcp_enabled))
                .any(|pc| pc.interfaces.iter().any(|i| i.has_ip()));
            Verdict::from_bool(!config.leases.is_empty() || client_addressed, || {
                "DHCP working".to_string()
            })
        }

        RuleCheck::PingSuccess { inter_network } => ping_success(*inter_network, topology),

        RuleCheck::AllConnected => {
            let mut pcs = topology.devices_of(DeviceType::Pc).peekable();
            if pcs.peek().is_none() || topology.first_of(DeviceType::Switch).is_none() {
                return Verdict::Precondition("PCs or switches missing");
            }
            let all_linked = pcs.all(|pc| {
                topology.cables.iter().any(|cable| {
                    cable
                        .peer_of(&pc.id)
                        .and_then(|peer| topology.device(peer))
                        .is_some_and(|peer| peer.is(DeviceType::Switch))
                })
            });
            Verdict::from_bool(all_linked, || "All PCs connected to a switch".to_string())
        }

        RuleCheck::GatewayConfigured { gateway } => {
            let all_set = topology
                .devices_of(DeviceType::Pc)
                .all(|pc| pc.interfaces.iter().any(|i| &i.gateway == gateway));
            Verdict::from_bool(all_set, || format!("All PCs use gateway {}", gateway))
        }

        RuleCheck::RouterHasInterfaces { count } => {
            let Some(router) = topology.first_of(DeviceType::Router) else {
                return Verdict::Precondition("No router found");
            };
            let configured = router.addressed_interface_count();
            Verdict::from_bool(configured >= *count, || {
                format!("Router has {} configured interfaces", configured)
            })
        }

        RuleCheck::SubnetIsolation { subnets } => {
            let mut pcs = topology.devices_of(DeviceType::Pc).peekable();
            if pcs.peek().is_none() {
                return Verdict::Precondition("No PC found");
            }
            let groups: HashSet<String> = pcs
                .flat_map(|pc| pc.interfaces.iter())
                .filter(|i| i.has_ip())
                .filter_map(|i| slash24_prefix(&i.ip_address))
                .collect();
            Verdict::from_bool(groups.len() == subnets.len(), || {
                "Subnet isolation verified".to_string()
            })
        }

        RuleCheck::DhcpConfigured => {
            let Some(server) = topology.first_of(DeviceType::DhcpServer) else {
                return Verdict::Precondition("No DHCP server found");
            };
            let has_ip = server.interfaces.iter().any(|i| i.has_ip());
            let has_pool = server.dhcp_config.as_ref().is_some_and(|c| c.has_pool());
            Verdict::from_bool(has_ip && has_pool, || {
                "DHCP server correctly configured".to_string()
            })
        }

        RuleCheck::Invalid { .. } => Verdict::Precondition("Invalid validation rule parameters"),

        RuleCheck::Unknown { kind, .. } => {
            warn!("Unknown validation rule type: {}", kind);
            Verdict::Precondition("Unknown validation rule")
        }
    }
}

fn ping_success(inter_network: bool, topology: &Topology) -> Verdict {
    let pcs: Vec<&NetworkDevice> = topology.devices_of(DeviceType::Pc).collect();
    if pcs.len() < 2 {
        return Verdict::Precondition("Not enough PCs");
    }
    let all_addressable = pcs
        .iter()
        .all(|pc| pc.interfaces.iter().any(|i| i.has_ip() || i.dhcp_enabled));
    if !all_addressable {
        return Verdict::Precondition("Some PCs have no IP");
    }

    if inter_network {
        let Some(router) = topology.first_of(DeviceType::Router) else {
            return Verdict::Precondition("No router found for inter-network routing");
        };
        let serves_all = topology
            .devices
            .iter()
            .filter(|d| d.device_type.is_server())
            .all(|server| topology.are_adjacent(&router.id, &server.id));
        if !serves_all {
            return Verdict::Precondition("The router must be connected to the servers");
        }
        if router.addressed_interface_count() < 2 {
            return Verdict::Precondition("The router needs at least 2 configured interfaces");
        }
    }

    Verdict::from_bool(is_fully_connected(topology), || {
        if inter_network {
            "Inter-network communication verified".to_string()
        } else {
            "Connectivity verified".to_string()
        }
    })
}

/// `a.b.c.0/24` for a four-part dotted address
fn slash24_prefix(ip: &str) -> Option<String> {
    let parts: Vec<&str> = ip.split('.').collect();
    match parts.as_slice() {
        [a, b, c, _] => Some(format!("{}.{}.{}.0/24", a, b, c)),
        _ => None,
    }
}
