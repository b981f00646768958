//! # Simcircuit Server
//! Region-side endpoint of reliable viewer circuits. A `CircuitManager` owns
//! the UDP socket and demultiplexes datagrams to `Circuit`s, each of which
//! tracks acknowledgements and resends and hands decoded messages to its
//! `MessageRouter`.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;
pub mod shared {
    pub use simcircuit_shared::{
        CircuitCode, CircuitContext, CompletePingCheck, GenericMessage, GodlikeMessage,
        GridInstantMessageDialog, ImprovedInstantMessage, LogoutReply, LogoutRequest, Message,
        MessageCodec, MessagePayload, MessageType, PacketAck, RegionHandshake,
        RegionHandshakeReply, SequenceNumber, StartPingCheck, TeleportFailed, TeleportLocal,
        TeleportProgress, TeleportStart, UseCircuitCode, Uuid,
    };
}

mod circuit;
mod error;
mod events;
mod manager;
mod router;

pub use circuit::{
    Circuit, CircuitConfig, CircuitIdentity, CircuitKey, CircuitState, CircuitStats,
    CloseReason, InboundOutcome,
};
pub use error::{CircuitServerError, ManagerError, ReceiveError, SendError};
pub use events::CircuitEvent;
pub use manager::{CircuitManager, ManagerConfig};
pub use router::{DispatchOutcome, DropReason, Handler, MessageRouter, ReceiveQueue, Route, RoutingTable};
