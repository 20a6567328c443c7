//! Port probing for test nodes.
//!
//! [`find_free_port`] asks the OS for an ephemeral port and immediately gives
//! it back. Another process can take the port between the probe closing and
//! the node binding it, so this is only suitable for isolated test
//! environments. [`reserve_ports`] keeps the probe sockets open instead, for
//! callers that can hand the ports over at a known point.

mod port_reservation;
pub use port_reservation::*;

use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::ToSocketAddrs;

#[cfg(test)]
use mockall::automock;
use tracing::trace;

use crate::constants::WILDCARD_PROBE_HOST;
use crate::AllocationError;

/// Source of momentarily-free TCP ports
#[cfg_attr(test, automock)]
pub trait PortAllocator: Send + Sync {
    fn find_free_port(&self) -> std::result::Result<u16, AllocationError>;
}

impl<A> PortAllocator for Box<A>
where
    A: PortAllocator + ?Sized,
{
    fn find_free_port(&self) -> std::result::Result<u16, AllocationError> {
        (**self).find_free_port()
    }
}

/// Probes the OS for a free port on a fixed host
#[derive(Debug, Clone)]
pub struct OsPortAllocator {
    probe_host: String,
}

impl OsPortAllocator {
    pub fn new(probe_host: &str) -> Self {
        Self {
            probe_host: probe_host.to_string(),
        }
    }
}

impl Default for OsPortAllocator {
    fn default() -> Self {
        Self::new(WILDCARD_PROBE_HOST)
    }
}

impl PortAllocator for OsPortAllocator {
    fn find_free_port(&self) -> std::result::Result<u16, AllocationError> {
        find_free_port_on(&self.probe_host)
    }
}

/// Finds a free port on the wildcard address
pub fn find_free_port() -> std::result::Result<u16, AllocationError> {
    find_free_port_on(WILDCARD_PROBE_HOST)
}

/// Binds `host:0`, reads the port the OS assigned and releases it.
pub fn find_free_port_on(host: &str) -> std::result::Result<u16, AllocationError> {
    let listener = probe_listener(host)?;
    let addr = listener.local_addr().map_err(AllocationError::LocalAddr)?;
    drop(listener);

    if addr.port() == 0 {
        return Err(AllocationError::Unassigned { addr });
    }
    trace!(port = addr.port(), host, "probed free port");
    Ok(addr.port())
}

pub(crate) fn probe_listener(host: &str) -> std::result::Result<TcpListener, AllocationError> {
    let addr = resolve_probe_addr(host)?;
    TcpListener::bind(addr).map_err(|source| AllocationError::Listen { addr, source })
}

fn resolve_probe_addr(host: &str) -> std::result::Result<SocketAddr, AllocationError> {
    (host, 0)
        .to_socket_addrs()
        .map_err(|source| AllocationError::Resolve {
            host: host.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| AllocationError::NoAddress {
            host: host.to_string(),
        })
}
