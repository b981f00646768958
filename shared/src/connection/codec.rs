use std::collections::HashMap;

use simcircuit_serde::{ByteReader, ByteWriter};

use crate::{
    connection::packet::Packet,
    messages::{
        error::DecodeError,
        message::Message,
        message_type::MessageType,
        payloads::{MessagePayload, PayloadDecoder},
    },
    Opcode,
};

/// Maps message bodies to typed messages and back. Built once and shared
/// read-only between every circuit.
pub struct MessageCodec {
    decoders: HashMap<MessageType, PayloadDecoder>,
}

impl MessageCodec {
    /// A codec able to decode every known message type
    pub fn new() -> Self {
        Self::with_types(MessageType::ALL)
    }

    /// A codec which only decodes the given message types
    pub fn with_types(types: &[MessageType]) -> Self {
        let decoders = types
            .iter()
            .map(|message_type| (*message_type, MessagePayload::decoder(*message_type)))
            .collect();
        Self { decoders }
    }

    pub fn supports(&self, message_type: MessageType) -> bool {
        self.decoders.contains_key(&message_type)
    }

    /// Decode a body which follows the message number. Trailing bytes past the
    /// last known field are ignored.
    pub fn decode(&self, message_type: MessageType, body: &[u8]) -> Result<Message, DecodeError> {
        self.decode_payload(message_type, body).map(Message::new)
    }

    pub fn decode_opcode(&self, opcode: Opcode, body: &[u8]) -> Result<Message, DecodeError> {
        let message_type =
            MessageType::from_opcode(opcode).ok_or(DecodeError::UnknownMessageType { opcode })?;
        self.decode(message_type, body)
    }

    /// Decode a parsed packet, carrying its sequence, reliability and acks
    /// onto the message
    pub fn decode_packet(&self, packet: &Packet) -> Result<Message, DecodeError> {
        let opcode = packet.opcode();
        let message_type =
            MessageType::from_opcode(opcode).ok_or(DecodeError::UnknownMessageType { opcode })?;
        let payload = self.decode_payload(message_type, packet.body())?;
        Ok(Message::received(
            payload,
            packet.sequence(),
            packet.is_reliable(),
            packet.acks().to_vec(),
        ))
    }

    pub fn encode(&self, message: &Message) -> (MessageType, Vec<u8>) {
        let mut writer = ByteWriter::new();
        message.payload().ser(&mut writer);
        (message.message_type(), writer.to_bytes())
    }

    fn decode_payload(
        &self,
        message_type: MessageType,
        body: &[u8],
    ) -> Result<MessagePayload, DecodeError> {
        let decoder = self
            .decoders
            .get(&message_type)
            .copied()
            .ok_or(DecodeError::NoDecoder { message_type })?;
        let mut reader = ByteReader::new(body);
        decoder(&mut reader).map_err(|source| DecodeError::Malformed {
            message_type,
            source,
        })
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}
