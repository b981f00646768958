use std::{io, net::SocketAddr};

use thiserror::Error;

use simcircuit_shared::{CircuitCode, DecodeError, PacketError, SequenceNumber};

use crate::circuit::CircuitKey;

/// Errors returned when a circuit refuses or fails to send a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The circuit is stopping or stopped, or was never started
    #[error("Circuit is not running")]
    CircuitNotRunning,

    /// Too many reliable packets are waiting for acknowledgement
    #[error("Outstanding reliable packet limit of {limit} reached")]
    OutstandingFull { limit: usize },

    /// The socket rejected the datagram
    #[error("Transport failed to send packet {sequence}")]
    Transport { sequence: SequenceNumber },
}

/// Errors returned by the fallback receive queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiveError {
    /// Blocking receive was called on a circuit whose receive queue is disabled
    #[error("Receive queue is not enabled")]
    QueueDisabled,

    #[error("Timed out waiting for a message")]
    Timeout,

    /// The circuit stopped and every queued message has been taken
    #[error("Receive queue is closed")]
    Closed,
}

/// Errors returned by the circuit manager
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Failed to bind socket on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Circuit {key} is already registered")]
    CircuitExists { key: CircuitKey },

    #[error("Remote address {address} is already bound to circuit {circuit_code}")]
    AddressInUse {
        address: SocketAddr,
        circuit_code: CircuitCode,
    },

    /// Only circuits which have not been stopped can be admitted
    #[error("Circuit {key} has already been stopped")]
    CircuitStopped { key: CircuitKey },

    #[error("Receive loop is already running")]
    AlreadyListening,

    #[error("Circuit manager has been shut down")]
    ShutDown,

    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(#[source] io::Error),
}

/// Umbrella error for everything the server crate can return
#[derive(Debug, Error)]
pub enum CircuitServerError {
    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Receive(#[from] ReceiveError),

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
