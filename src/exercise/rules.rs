//! Validation rule definitions.
//!
//! On the wire a rule is `{type, params, errorMessage, points}` with a free
//! form `params` object. In memory the pair `(type, params)` becomes a
//! [`RuleCheck`] variant carrying typed parameters, so the validator never
//! digs through untyped JSON. Rule types this build does not know become
//! [`RuleCheck::Unknown`], and known types with unusable parameters become
//! [`RuleCheck::Invalid`]; both still round-trip unchanged.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::topology::DeviceType;

pub const DEVICE_EXISTS: &str = "device_exists";
pub const DEVICE_COUNT: &str = "device_count";
pub const CABLE_EXISTS: &str = "cable_exists";
pub const IP_CONFIGURED: &str = "ip_configured";
pub const SUBNET_CORRECT: &str = "subnet_correct";
pub const DHCP_WORKING: &str = "dhcp_working";
pub const PING_SUCCESS: &str = "ping_success";
pub const ALL_CONNECTED: &str = "all_connected";
pub const GATEWAY_CONFIGURED: &str = "gateway_configured";
pub const ROUTER_HAS_INTERFACES: &str = "router_has_interfaces";
pub const SUBNET_ISOLATION: &str = "subnet_isolation";
pub const DHCP_CONFIGURED: &str = "dhcp_configured";

/// What a rule checks, with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    DeviceExists {
        device_type: DeviceType,
    },
    /// A `min` of zero is read as one
    DeviceCount {
        device_type: DeviceType,
        min: u32,
    },
    /// A `min_cables` of zero is read as one
    CableExists {
        min_cables: u32,
    },
    IpConfigured {
        device_type: Option<DeviceType>,
        check_gateway: bool,
    },
    SubnetCorrect {
        mask: String,
    },
    DhcpWorking,
    PingSuccess {
        inter_network: bool,
    },
    AllConnected,
    GatewayConfigured {
        gateway: String,
    },
    RouterHasInterfaces {
        count: usize,
    },
    SubnetIsolation {
        subnets: Vec<String>,
    },
    DhcpConfigured,
    /// Known rule type whose parameters could not be read
    Invalid {
        kind: String,
        params: Value,
        reason: String,
    },
    /// Rule type this build does not know
    Unknown {
        kind: String,
        params: Value,
    },
}

#[derive(Deserialize)]
struct TypeParams {
    #[serde(rename = "type")]
    device_type: DeviceType,
}

#[derive(Deserialize)]
struct CountParams {
    #[serde(rename = "type")]
    device_type: DeviceType,
    #[serde(default)]
    min: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CableParams {
    #[serde(default)]
    min_cables: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpParams {
    #[serde(default)]
    device_type: Option<DeviceType>,
    #[serde(default)]
    check_gateway: bool,
}

#[derive(Deserialize)]
struct MaskParams {
    mask: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PingParams {
    #[serde(default)]
    inter_network: bool,
}

#[derive(Deserialize)]
struct GatewayParams {
    gateway: String,
}

#[derive(Deserialize)]
struct InterfaceCountParams {
    count: usize,
}

#[derive(Deserialize)]
struct SubnetsParams {
    subnets: Vec<String>,
}

fn typed<T: DeserializeOwned>(params: &Value) -> Result<T, serde_json::Error> {
    let params = if params.is_null() {
        Value::Object(Map::new())
    } else {
        params.clone()
    };
    serde_json::from_value(params)
}

impl RuleCheck {
    /// Build a check from a rule type tag and its raw parameters
    pub fn parse(kind: &str, params: Value) -> RuleCheck {
        let parsed = match kind {
            DEVICE_EXISTS => typed::<TypeParams>(&params).map(|p| RuleCheck::DeviceExists {
                device_type: p.device_type,
            }),
            DEVICE_COUNT => typed::<CountParams>(&params).map(|p| RuleCheck::DeviceCount {
                device_type: p.device_type,
                min: p.min,
            }),
            CABLE_EXISTS => typed::<CableParams>(&params).map(|p| RuleCheck::CableExists {
                min_cables: p.min_cables,
            }),
            IP_CONFIGURED => typed::<IpParams>(&params).map(|p| RuleCheck::IpConfigured {
                device_type: p.device_type,
                check_gateway: p.check_gateway,
            }),
            SUBNET_CORRECT => {
                typed::<MaskParams>(&params).map(|p| RuleCheck::SubnetCorrect { mask: p.mask })
            }
            DHCP_WORKING => Ok(RuleCheck::DhcpWorking),
            PING_SUCCESS => typed::<PingParams>(&params).map(|p| RuleCheck::PingSuccess {
                inter_network: p.inter_network,
            }),
            ALL_CONNECTED => Ok(RuleCheck::AllConnected),
            GATEWAY_CONFIGURED => typed::<GatewayParams>(&params).map(|p| {
                RuleCheck::GatewayConfigured {
                    gateway: p.gateway,
                }
            }),
            ROUTER_HAS_INTERFACES => typed::<InterfaceCountParams>(&params)
                .map(|p| RuleCheck::RouterHasInterfaces { count: p.count }),
            SUBNET_ISOLATION => typed::<SubnetsParams>(&params).map(|p| {
                RuleCheck::SubnetIsolation {
                    subnets: p.subnets,
                }
            }),
            DHCP_CONFIGURED => Ok(RuleCheck::DhcpConfigured),
            _ => {
                return RuleCheck::Unknown {
                    kind: kind.to_string(),
                    params,
                }
            }
        };

        parsed.unwrap_or_else(|e| {
            warn!("Rule {} has unusable params: {}", kind, e);
            RuleCheck::Invalid {
                kind: kind.to_string(),
                params,
                reason: e.to_string(),
            }
        })
    }

    /// Wire tag of this check
    pub fn kind(&self) -> &str {
        match self {
            RuleCheck::DeviceExists { .. } => DEVICE_EXISTS,
            RuleCheck::DeviceCount { .. } => DEVICE_COUNT,
            RuleCheck::CableExists { .. } => CABLE_EXISTS,
            RuleCheck::IpConfigured { .. } => IP_CONFIGURED,
            RuleCheck::SubnetCorrect { .. } => SUBNET_CORRECT,
            RuleCheck::DhcpWorking => DHCP_WORKING,
            RuleCheck::PingSuccess { .. } => PING_SUCCESS,
            RuleCheck::AllConnected => ALL_CONNECTED,
            RuleCheck::GatewayConfigured { .. } => GATEWAY_CONFIGURED,
            RuleCheck::RouterHasInterfaces { .. } => ROUTER_HAS_INTERFACES,
            RuleCheck::SubnetIsolation { .. } => SUBNET_ISOLATION,
            RuleCheck::DhcpConfigured => DHCP_CONFIGURED,
            RuleCheck::Invalid { kind, .. } | RuleCheck::Unknown { kind, .. } => kind,
        }
    }

    /// Parameters in their wire shape
    pub fn params(&self) -> Value {
        match self {
            RuleCheck::DeviceExists { device_type } => json!({ "type": device_type }),
            RuleCheck::DeviceCount { device_type, min } => {
                json!({ "type": device_type, "min": min })
            }
            RuleCheck::CableExists { min_cables } => json!({ "minCables": min_cables }),
            RuleCheck::IpConfigured {
                device_type,
                check_gateway,
            } => {
                let mut params = Map::new();
                if let Some(device_type) = device_type {
                    params.insert("deviceType".to_string(), json!(device_type));
                }
                if *check_gateway {
                    params.insert("checkGateway".to_string(), Value::Bool(true));
                }
                Value::Object(params)
            }
            RuleCheck::SubnetCorrect { mask } => json!({ "mask": mask }),
            RuleCheck::PingSuccess { inter_network } if *inter_network => {
                json!({ "interNetwork": true })
            }
            RuleCheck::GatewayConfigured { gateway } => json!({ "gateway": gateway }),
            RuleCheck::RouterHasInterfaces { count } => json!({ "count": count }),
            RuleCheck::SubnetIsolation { subnets } => json!({ "subnets": subnets }),
            RuleCheck::Invalid { params, .. } | RuleCheck::Unknown { params, .. } => {
                params.clone()
            }
            RuleCheck::PingSuccess { .. } | RuleCheck::DhcpWorking | RuleCheck::AllConnected
            | RuleCheck::DhcpConfigured => Value::Object(Map::new()),
        }
    }
}

/// One graded predicate of an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRule", into = "RawRule")]
pub struct ValidationRule {
    pub check: RuleCheck,
    /// Shown when the predicate does not hold
    pub error_message: String,
    pub points: u32,
}

impl ValidationRule {
    pub fn new(check: RuleCheck, error_message: impl Into<String>, points: u32) -> Self {
        ValidationRule {
            check,
            error_message: error_message.into(),
            points,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    points: u32,
}

impl From<RawRule> for ValidationRule {
    fn from(raw: RawRule) -> Self {
        ValidationRule {
            check: RuleCheck::parse(&raw.kind, raw.params),
            error_message: raw.error_message,
            points: raw.points,
        }
    }
}

impl From<ValidationRule> for RawRule {
    fn from(rule: ValidationRule) -> Self {
        RawRule {
            kind: rule.check.kind().to_string(),
            params: rule.check.params(),
            error_message: rule.error_message,
            points: rule.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(json: &str) -> ValidationRule {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_known_rules() {
        let r = rule(r#"{"type":"device_count","params":{"type":"pc","min":2},"errorMessage":"two PCs","points":10}"#);
        assert_eq!(
            r.check,
            RuleCheck::DeviceCount {
                device_type: DeviceType::Pc,
                min: 2
            }
        );
        assert_eq!(r.points, 10);
        assert_eq!(r.error_message, "two PCs");

        let r = rule(r#"{"type":"ip_configured","params":{"checkGateway":true},"errorMessage":"","points":30}"#);
        assert_eq!(
            r.check,
            RuleCheck::IpConfigured {
                device_type: None,
                check_gateway: true
            }
        );

        let r = rule(r#"{"type":"ping_success","params":{},"errorMessage":"","points":30}"#);
        assert_eq!(r.check, RuleCheck::PingSuccess { inter_network: false });

        let r = rule(r#"{"type":"dhcp_working","errorMessage":"","points":45}"#);
        assert_eq!(r.check, RuleCheck::DhcpWorking);
    }

    #[test]
    fn test_unknown_rule_type_is_kept() {
        let r = rule(r#"{"type":"vlan_tagged","params":{"vlan":10},"errorMessage":"tag it","points":5}"#);
        assert_eq!(r.check.kind(), "vlan_tagged");
        assert!(matches!(r.check, RuleCheck::Unknown { .. }));

        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["type"], "vlan_tagged");
        assert_eq!(back["params"]["vlan"], 10);
        assert_eq!(back["errorMessage"], "tag it");
    }

    #[test]
    fn test_bad_params_become_invalid() {
        let r = rule(r#"{"type":"device_exists","params":{"type":"firewall"},"errorMessage":"","points":5}"#);
        match &r.check {
            RuleCheck::Invalid { kind, reason, .. } => {
                assert_eq!(kind, "device_exists");
                assert!(!reason.is_empty());
            }
            other => panic!("expected invalid, got {:?}", other),
        }

        let r = rule(r#"{"type":"router_has_interfaces","params":{},"errorMessage":"","points":5}"#);
        assert!(matches!(r.check, RuleCheck::Invalid { .. }));
    }

    #[test]
    fn test_serialized_shape_matches_wire_format() {
        let r = ValidationRule::new(
            RuleCheck::DeviceExists {
                device_type: DeviceType::DhcpServer,
            },
            "need a DHCP server",
            15,
        );
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "device_exists",
                "params": { "type": "dhcp-server" },
                "errorMessage": "need a DHCP server",
                "points": 15
            })
        );
    }

    #[test]
    fn test_yaml_rules() {
        let yaml = "type: subnet_isolation\nparams:\n  subnets: [192.168.10.0/24, 192.168.20.0/24]\nerrorMessage: split\npoints: 40\n";
        let r: ValidationRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            r.check,
            RuleCheck::SubnetIsolation {
                subnets: vec!["192.168.10.0/24".to_string(), "192.168.20.0/24".to_string()]
            }
        );
    }
}
