//! Network interface records and the bind-candidate filter.
//!
//! The operating system reports many interfaces that make poor bind targets:
//! loopback, interfaces that are down, IPv6-only addresses, and the bridge /
//! veth pairs created by container runtimes.  [`select_candidates`] turns the
//! raw OS view ([`InterfaceRecord`]) into the short list a user should pick
//! from, always led by the wildcard entry.
//!
//! The OS enumeration itself lives in `skynet-http`'s infrastructure layer;
//! this module only decides what survives the filter.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Display name of the wildcard entry that always sits at index 0.
pub const WILDCARD_NAME: &str = "any";

/// Name prefixes used by bridge, veth and container networks.
///
/// Compared case-insensitively against the interface name.
const VIRTUAL_PREFIXES: [&str; 3] = ["br-", "veth", "docker"];

/// A usable bind candidate: an interface name and one of its IPv4 addresses.
///
/// Discovered per query and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    pub ip: Ipv4Addr,
}

impl NetworkInterface {
    pub fn new(name: impl Into<String>, ip: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            ip,
        }
    }

    /// The `("any", 0.0.0.0)` entry that binds every interface.
    pub fn wildcard() -> Self {
        Self::new(WILDCARD_NAME, Ipv4Addr::UNSPECIFIED)
    }

    /// Returns `true` for the wildcard entry.
    pub fn is_wildcard(&self) -> bool {
        self.ip.is_unspecified()
    }
}

impl fmt::Display for NetworkInterface {
    /// Formats as `"<name> - <ip>"`, the shape GUI pick-lists show.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.ip)
    }
}

/// One address of one interface as reported by the operating system.
///
/// Interfaces with several addresses produce several records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub name: String,
    /// Administratively up (`IFF_UP`).
    pub is_up: bool,
    /// Flagged as a loopback device (`IFF_LOOPBACK`).
    pub is_loopback: bool,
    /// The address attached to this record, if any.
    pub address: Option<IpAddr>,
}

/// Returns `true` if `name` follows a bridge/veth/container naming convention.
pub fn is_virtual_interface(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    VIRTUAL_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Filters raw OS records down to bind candidates.
///
/// The result always starts with [`NetworkInterface::wildcard`].  A record is
/// kept when the interface is up, the address is IPv4, neither the interface
/// nor the address is loopback, and the name is not virtual.  OS order is
/// preserved for everything after index 0.
pub fn select_candidates<I>(records: I) -> Vec<NetworkInterface>
where
    I: IntoIterator<Item = InterfaceRecord>,
{
    let mut candidates = vec![NetworkInterface::wildcard()];

    candidates.extend(records.into_iter().filter_map(|record| {
        if !record.is_up || record.is_loopback || is_virtual_interface(&record.name) {
            return None;
        }
        match record.address {
            Some(IpAddr::V4(ip)) if !ip.is_loopback() => {
                Some(NetworkInterface::new(record.name, ip))
            }
            _ => None,
        }
    }));

    candidates
}

// ── Tests ─────────────────────────────────────────────────────────────────────
