//! Dotted-decimal address arithmetic.
//!
//! Pure functions over IPv4 addresses and masks written as dotted-decimal
//! strings, and their big-endian `u32` encoding. Nothing here keeps state.
//!
//! The numeric conversions do not validate their input: a malformed string
//! still produces some number. Callers that care check [`is_valid_ip`] first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classful address class, decided by the first octet only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpClass {
    A,
    B,
    C,
    D,
    E,
}

impl fmt::Display for IpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            IpClass::A => "A",
            IpClass::B => "B",
            IpClass::C => "C",
            IpClass::D => "D",
            IpClass::E => "E",
        };
        write!(f, "{}", letter)
    }
}

/// Lenient octet parse: anything unparseable counts as zero.
fn octet_value(part: Option<&str>) -> u32 {
    part.and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(0)
}

/// Encode a dotted-decimal address as a big-endian 32-bit integer.
///
/// Missing or unparseable octets are read as zero; out-of-range octets
/// spill into the neighbouring bits. Validate with [`is_valid_ip`] when the
/// input is untrusted.
pub fn ip_to_number(ip: &str) -> u32 {
    let mut parts = ip.split('.');
    let a = octet_value(parts.next());
    let b = octet_value(parts.next());
    let c = octet_value(parts.next());
    let d = octet_value(parts.next());
    (a << 24)
        .wrapping_add(b << 16)
        .wrapping_add(c << 8)
        .wrapping_add(d)
}

/// Decode a 32-bit integer into dotted-decimal notation
pub fn number_to_ip(num: u32) -> String {
    let [a, b, c, d] = num.to_be_bytes();
    format!("{}.{}.{}.{}", a, b, c, d)
}

/// True iff `ip` is exactly four dot-separated integers, each in 0..=255
pub fn is_valid_ip(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|part| {
        !part.is_empty()
            && part.chars().all(|c| c.is_ascii_digit())
            && part.parse::<u16>().map_or(false, |n| n <= 255)
    })
}

/// True when both addresses share the network portion selected by `mask`
pub fn is_in_same_subnet(ip_a: &str, ip_b: &str, mask: &str) -> bool {
    let mask_num = ip_to_number(mask);
    (ip_to_number(ip_a) & mask_num) == (ip_to_number(ip_b) & mask_num)
}

/// Network address: `ip AND mask`
pub fn network_address(ip: &str, mask: &str) -> String {
    number_to_ip(ip_to_number(ip) & ip_to_number(mask))
}

/// Broadcast address: `(ip AND mask) OR NOT mask`
pub fn broadcast_address(ip: &str, mask: &str) -> String {
    let mask_num = ip_to_number(mask);
    number_to_ip((ip_to_number(ip) & mask_num) | !mask_num)
}

/// Dotted mask for a prefix length. Lengths above 32 are treated as 32.
pub fn cidr_to_mask(cidr: u8) -> String {
    let cidr = u32::from(cidr.min(32));
    number_to_ip(u32::MAX.checked_shl(32 - cidr).unwrap_or(0))
}

/// Prefix length of a mask, counted as its leading one-bits
pub fn mask_to_cidr(mask: &str) -> u8 {
    // leading_ones() is at most 32
    ip_to_number(mask).leading_ones() as u8
}

/// Usable host count for a mask: `2^(32 - cidr) - 2`.
///
/// Not clamped: a /31 yields 0 and a /32 yields -1.
pub fn available_hosts(mask: &str) -> i64 {
    let host_bits = 32 - u32::from(mask_to_cidr(mask));
    (1_i64 << host_bits) - 2
}

/// Classful lookup on the first octet. The mask plays no part.
pub fn ip_class(ip: &str) -> IpClass {
    match octet_value(ip.split('.').next()) {
        0..=127 => IpClass::A,
        128..=191 => IpClass::B,
        192..=223 => IpClass::C,
        224..=239 => IpClass::D,
        _ => IpClass::E,
    }
}

/// Classful default mask; classes D and E fall back to /24
pub fn default_mask(ip: &str) -> &'static str {
    match ip_class(ip) {
        IpClass::A => "255.0.0.0",
        IpClass::B => "255.255.0.0",
        IpClass::C | IpClass::D | IpClass::E => "255.255.255.0",
    }
}
