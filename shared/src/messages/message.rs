use crate::{
    messages::{
        error::StampError,
        message_type::MessageType,
        payloads::{GenericMessage, GodlikeMessage, ImprovedInstantMessage, MessagePayload},
    },
    CircuitContext, Opcode, SequenceNumber,
};

/// A typed message, either decoded from a datagram or built for sending
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    payload: MessagePayload,
    reliable: bool,
    sequence: Option<SequenceNumber>,
    acks: Vec<SequenceNumber>,
    context: Option<CircuitContext>,
}

impl Message {
    /// An unreliable outbound message
    pub fn new(payload: impl Into<MessagePayload>) -> Self {
        Self {
            payload: payload.into(),
            reliable: false,
            sequence: None,
            acks: Vec::new(),
            context: None,
        }
    }

    /// An outbound message which is resent until the peer acknowledges it
    pub fn reliable(payload: impl Into<MessagePayload>) -> Self {
        let mut message = Self::new(payload);
        message.reliable = true;
        message
    }

    pub fn received(
        payload: MessagePayload,
        sequence: SequenceNumber,
        reliable: bool,
        acks: Vec<SequenceNumber>,
    ) -> Self {
        Self {
            payload,
            reliable,
            sequence: Some(sequence),
            acks,
            context: None,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    pub fn opcode(&self) -> Opcode {
        self.message_type().opcode()
    }

    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    pub fn into_payload(self) -> MessagePayload {
        self.payload
    }

    pub fn is_reliable(&self) -> bool {
        self.reliable
    }

    pub fn set_reliable(&mut self, reliable: bool) {
        self.reliable = reliable;
    }

    /// Sequence number of the packet this message arrived in
    pub fn sequence(&self) -> Option<SequenceNumber> {
        self.sequence
    }

    /// Acknowledgements the peer appended to the packet this message arrived in
    pub fn appended_acks(&self) -> &[SequenceNumber] {
        &self.acks
    }

    pub fn context(&self) -> Option<&CircuitContext> {
        self.context.as_ref()
    }

    pub fn stamp(&mut self, context: CircuitContext) -> Result<(), StampError> {
        if self.context.is_some() {
            return Err(StampError::AlreadyStamped);
        }
        self.context = Some(context);
        Ok(())
    }

    pub fn as_instant_message(&self) -> Option<&ImprovedInstantMessage> {
        match &self.payload {
            MessagePayload::ImprovedInstantMessage(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_generic_message(&self) -> Option<&GenericMessage> {
        match &self.payload {
            MessagePayload::GenericMessage(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_godlike_message(&self) -> Option<&GodlikeMessage> {
        match &self.payload {
            MessagePayload::GodlikeMessage(inner) => Some(inner),
            _ => None,
        }
    }
}
