use thiserror::Error;

use simcircuit_serde::{SerdeErr, ZeroCodeError};

/// Errors that can occur while taking a datagram apart
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Datagram is shorter than the fixed header
    #[error("Datagram of {length} bytes is shorter than the {minimum} byte header")]
    TooShort { length: usize, minimum: usize },

    /// Extra header length points past the end of the datagram
    #[error("Extra header of {declared} bytes exceeds the {available} bytes available")]
    ExtraHeaderTruncated { declared: usize, available: usize },

    /// The appended ack count claims more acks than the datagram holds
    #[error("Appended ack trailer declares {count} acks but only {available} bytes remain")]
    AckTrailerTruncated { count: usize, available: usize },

    /// Zero-coded body could not be expanded (possible malicious packet)
    #[error("Zero-coded body is invalid: {0}")]
    ZeroCode(#[from] ZeroCodeError),

    /// The message number prefix is missing or invalid
    #[error("Invalid message number: {0}")]
    MessageNumber(#[from] SerdeErr),
}
