use std::{fmt, net::SocketAddr};

use uuid::Uuid;

use simcircuit_shared::CircuitCode;

/// Everything a circuit is bound to when it is created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CircuitIdentity {
    pub circuit_code: CircuitCode,
    pub remote_address: SocketAddr,
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub scene_id: Uuid,
}

impl CircuitIdentity {
    pub fn key(&self) -> CircuitKey {
        CircuitKey {
            address: self.remote_address,
            circuit_code: self.circuit_code,
        }
    }
}

/// Slot of a circuit in the manager's table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CircuitKey {
    pub address: SocketAddr,
    pub circuit_code: CircuitCode,
}

impl fmt::Display for CircuitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.circuit_code, self.address)
    }
}

// The agent/session pair a circuit stamps onto dispatched messages. It is
// cleared while the agent logs out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SessionBinding {
    pub agent_id: Uuid,
    pub session_id: Uuid,
}
