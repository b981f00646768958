use thiserror::Error;

use simcircuit_serde::SerdeErr;

use crate::{messages::message_type::MessageType, CircuitCode, Opcode};

/// Errors that can occur when turning a message body into a typed message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The message number does not name any known message type
    #[error("Unknown message number {opcode:#010x}")]
    UnknownMessageType { opcode: Opcode },

    /// The codec was built without a decoder for this message type
    #[error("No decoder registered for {message_type}")]
    NoDecoder { message_type: MessageType },

    /// The body ended early or carried an invalid field
    #[error("Malformed {message_type} body: {source}")]
    Malformed {
        message_type: MessageType,
        #[source]
        source: SerdeErr,
    },
}

/// Errors that can occur when stamping a circuit context onto a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampError {
    /// Context fields are set exactly once
    #[error("Message has already been stamped with a circuit context")]
    AlreadyStamped,

    /// The circuit's agent/session binding was cleared, usually during logout
    #[error("Identity binding for circuit {circuit_code} has been cleared")]
    IdentityCleared { circuit_code: CircuitCode },
}
