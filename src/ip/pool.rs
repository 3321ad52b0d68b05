//! DHCP address pool scanning.
//!
//! A pool is an inclusive `[start, end]` range of addresses. Allocation
//! always hands out the lowest address not currently leased, so the
//! outcome only depends on the pool bounds and the existing leases.

use std::collections::HashSet;

use super::arith::{ip_to_number, number_to_ip};

/// Inclusive range of addresses a DHCP server may lease
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPool {
    start: u32,
    end: u32,
}

impl AddressPool {
    /// Build a pool from dotted-decimal bounds
    pub fn new(pool_start: &str, pool_end: &str) -> Self {
        AddressPool {
            start: ip_to_number(pool_start),
            end: ip_to_number(pool_end),
        }
    }

    /// First address, in ascending numeric order, that is not in `leased`.
    ///
    /// Returns `None` when every address of the pool is taken.
    pub fn first_free<'a, I>(&self, leased: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let used: HashSet<u32> = leased.into_iter().map(ip_to_number).collect();
        (self.start..=self.end)
            .find(|candidate| !used.contains(candidate))
            .map(number_to_ip)
    }
}
