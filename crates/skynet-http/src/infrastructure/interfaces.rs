//! Operating-system network interface enumeration.
//!
//! [`list_interfaces`] snapshots the host's interfaces and hands them to
//! [`skynet_core::select_candidates`], which applies the pick-list rules
//! (wildcard first, then up, non-loopback, non-virtual IPv4 addresses).
//!
//! On Unix the snapshot comes from `getifaddrs(3)` through `nix`.  Other
//! platforms get only the wildcard entry.

use skynet_core::{select_candidates, InterfaceRecord, NetworkInterface};
use thiserror::Error;

/// Error type for interface enumeration.
#[derive(Debug, Error)]
pub enum InterfaceError {
    /// The OS call that lists interfaces failed.
    #[error("failed to enumerate network interfaces: {0}")]
    Enumeration(#[source] std::io::Error),
}

/// Returns the bind candidates for this host.  Index 0 is always the
/// wildcard entry (`any` / `0.0.0.0`).
///
/// The call has no side effects and does not log; an enumeration failure is
/// returned as-is.
pub fn list_interfaces() -> Result<Vec<NetworkInterface>, InterfaceError> {
    Ok(select_candidates(os_records()?))
}

#[cfg(unix)]
fn os_records() -> Result<Vec<InterfaceRecord>, InterfaceError> {
    use std::net::{IpAddr, SocketAddrV4, SocketAddrV6};

    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;

    let addrs = getifaddrs().map_err(|errno| InterfaceError::Enumeration(errno.into()))?;

    Ok(addrs
        .map(|ifaddr| {
            let address = ifaddr.address.as_ref().and_then(|storage| {
                if let Some(sin) = storage.as_sockaddr_in() {
                    Some(IpAddr::V4(*SocketAddrV4::from(*sin).ip()))
                } else {
                    storage
                        .as_sockaddr_in6()
                        .map(|sin6| IpAddr::V6(*SocketAddrV6::from(*sin6).ip()))
                }
            });
            InterfaceRecord {
                name: ifaddr.interface_name,
                is_up: ifaddr.flags.contains(InterfaceFlags::IFF_UP),
                is_loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                address,
            }
        })
        .collect())
}

#[cfg(not(unix))]
fn os_records() -> Result<Vec<InterfaceRecord>, InterfaceError> {
    Ok(Vec::new())
}

/// Whether the process may bind privileged ports (below 1024).
///
/// On Unix this means an effective UID of 0.  Other platforms do not restrict
/// low ports, so this returns `true` there.
pub fn running_elevated() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::geteuid().is_root()
    }
    #[cfg(not(unix))]
    {
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
