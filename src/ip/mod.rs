//! IPv4 address arithmetic and DHCP pool management.
//!
//! Everything in this module is a pure function of its arguments. Addresses
//! travel as dotted-decimal strings, the same representation the topology
//! model stores on each interface.

pub mod arith;
pub mod pool;

// Re-export commonly used items
pub use arith::{
    available_hosts, broadcast_address, cidr_to_mask, default_mask, ip_class, ip_to_number,
    is_in_same_subnet, is_valid_ip, mask_to_cidr, network_address, number_to_ip, IpClass,
};
pub use pool::AddressPool;
