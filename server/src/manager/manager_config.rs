use std::{default::Default, net::SocketAddr, time::Duration};

use crate::circuit::CircuitConfig;

/// Contains Config properties which will be used by the CircuitManager
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Local address the UDP socket binds to
    pub bind_address: SocketAddr,
    /// How long the receive loop waits on the socket before running
    /// maintenance
    pub receive_timeout: Duration,
    /// Size of the receive buffer, larger datagrams are truncated
    pub max_datagram_size: usize,
    /// Configuration for circuits created through the manager
    pub circuit: CircuitConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 9000)),
            receive_timeout: Duration::from_millis(50),
            max_datagram_size: 4096,
            circuit: CircuitConfig::default(),
        }
    }
}
