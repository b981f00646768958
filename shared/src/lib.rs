//! # Simcircuit Shared
//! Message codec, packet framing and sequence tracking shared by every
//! simcircuit endpoint.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use simcircuit_serde::{
    zero_decode, zero_encode, ByteReader, ByteWriter, Serde, SerdeErr, Uuid, Vector3,
    ZeroCodeError,
};

mod connection;
mod messages;
mod sequence_window;
mod timer;
mod types;

pub use connection::{
    codec::MessageCodec,
    error::PacketError,
    packet::{Packet, PacketBuilder},
    packet_header::{PacketFlags, PacketHeader},
};
pub use messages::{
    error::{DecodeError, StampError},
    message::Message,
    message_type::{Frequency, MessageType},
    payloads::{
        CompletePingCheck, GenericMessage, GodlikeMessage, GridInstantMessageDialog,
        ImprovedInstantMessage, LogoutReply, LogoutRequest, MessagePayload, PacketAck,
        RegionHandshake, RegionHandshakeReply, StartPingCheck, TeleportAlertInfo, TeleportFailed,
        TeleportLocal, TeleportProgress, TeleportStart, UseCircuitCode,
    },
};
pub use sequence_window::{SequenceError, SequenceWindow};
pub use timer::Timer;
pub use types::{CircuitCode, CircuitContext, Opcode, SequenceNumber};
