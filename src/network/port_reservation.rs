use std::net::TcpListener;

use super::probe_listener;
use crate::AllocationError;

/// Guard that holds TCP listeners to prevent port reuse until released or dropped.
///
/// This closes the window between probing a port and a node binding it, as long
/// as the holder releases the ports right before the node starts.
#[derive(Debug)]
pub struct PortReservation {
    ports: Vec<u16>,
    listeners: Vec<TcpListener>,
}

impl PortReservation {
    /// Reserved ports, in reservation order
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn is_held(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Closes the listeners so the ports can be bound by someone else.
    /// The port numbers stay readable.
    pub fn release(&mut self) {
        self.listeners.clear();
    }
}

impl std::ops::Deref for PortReservation {
    type Target = [u16];

    fn deref(&self) -> &Self::Target {
        &self.ports
    }
}

/// Binds `count` listeners on `host` and keeps them open.
pub fn reserve_ports(
    host: &str,
    count: usize,
) -> std::result::Result<PortReservation, AllocationError> {
    let mut ports = Vec::with_capacity(count);
    let mut listeners = Vec::with_capacity(count);

    for _ in 0..count {
        let listener = probe_listener(host)?;
        let addr = listener.local_addr().map_err(AllocationError::LocalAddr)?;
        if addr.port() == 0 {
            return Err(AllocationError::Unassigned { addr });
        }
        ports.push(addr.port());
        listeners.push(listener);
    }

    Ok(PortReservation { ports, listeners })
}
