use simcircuit_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::messages::message_type::MessageType;

mod circuit;
mod generic;
mod im;
mod region;
mod teleport;

pub use circuit::{
    CompletePingCheck, LogoutReply, LogoutRequest, PacketAck, StartPingCheck, UseCircuitCode,
};
pub use generic::{GenericMessage, GodlikeMessage};
pub use im::{GridInstantMessageDialog, ImprovedInstantMessage};
pub use region::{RegionHandshake, RegionHandshakeReply};
pub use teleport::{TeleportAlertInfo, TeleportFailed, TeleportLocal, TeleportProgress, TeleportStart};

pub(crate) type PayloadDecoder = fn(&mut ByteReader) -> Result<MessagePayload, SerdeErr>;

fn decode_as<T: Serde + Into<MessagePayload>>(
    reader: &mut ByteReader,
) -> Result<MessagePayload, SerdeErr> {
    Ok(T::de(reader)?.into())
}

macro_rules! payloads {
    ($($name:ident),* $(,)?) => {
        /// The typed body of a message, one variant per supported message type
        #[derive(Debug, Clone, PartialEq)]
        pub enum MessagePayload {
            $($name($name),)*
        }

        impl MessagePayload {
            pub fn message_type(&self) -> MessageType {
                match self {
                    $(MessagePayload::$name(_) => MessageType::$name,)*
                }
            }

            pub fn ser(&self, writer: &mut ByteWriter) {
                match self {
                    $(MessagePayload::$name(payload) => payload.ser(writer),)*
                }
            }

            pub(crate) fn decoder(message_type: MessageType) -> PayloadDecoder {
                match message_type {
                    $(MessageType::$name => decode_as::<$name>,)*
                }
            }
        }

        $(
            impl From<$name> for MessagePayload {
                fn from(payload: $name) -> Self {
                    MessagePayload::$name(payload)
                }
            }

            impl TryFrom<MessagePayload> for $name {
                type Error = MessagePayload;

                fn try_from(payload: MessagePayload) -> Result<Self, Self::Error> {
                    match payload {
                        MessagePayload::$name(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

payloads!(
    StartPingCheck,
    CompletePingCheck,
    UseCircuitCode,
    TeleportLocal,
    TeleportProgress,
    TeleportStart,
    TeleportFailed,
    RegionHandshake,
    RegionHandshakeReply,
    LogoutRequest,
    LogoutReply,
    ImprovedInstantMessage,
    GodlikeMessage,
    GenericMessage,
    PacketAck,
);

// Variable blocks are prefixed with a one byte count

pub(crate) fn ser_blocks<T>(items: &[T], writer: &mut ByteWriter, ser: impl Fn(&T, &mut ByteWriter)) {
    let count = items.len().min(u8::MAX as usize);
    writer.write_byte(count as u8);
    for item in &items[..count] {
        ser(item, writer);
    }
}

pub(crate) fn de_blocks<T>(
    reader: &mut ByteReader,
    de: impl Fn(&mut ByteReader) -> Result<T, SerdeErr>,
) -> Result<Vec<T>, SerdeErr> {
    let count = reader.read_byte()?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(de(reader)?);
    }
    Ok(items)
}
