use uuid::Uuid;

use simcircuit_server::CircuitIdentity;
use simcircuit_shared::{
    CircuitCode, GenericMessage, GodlikeMessage, GridInstantMessageDialog, ImprovedInstantMessage,
    LogoutRequest, Message, MessageCodec, MessagePayload, MessageType, Packet, PacketAck,
    PacketBuilder, SequenceNumber, UseCircuitCode,
};

/// Plays the viewer side of a circuit: numbers its own packets, builds
/// datagrams for the server and picks apart what the server sends back
pub struct RemotePeer {
    codec: MessageCodec,
    circuit_code: CircuitCode,
    agent_id: Uuid,
    session_id: Uuid,
    next_sequence: SequenceNumber,
}

impl RemotePeer {
    pub fn new(identity: &CircuitIdentity) -> Self {
        Self {
            codec: MessageCodec::new(),
            circuit_code: identity.circuit_code,
            agent_id: identity.agent_id,
            session_id: identity.session_id,
            next_sequence: 1,
        }
    }

    pub fn agent_id(&self) -> Uuid {
        self.agent_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn next_sequence(&mut self) -> SequenceNumber {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    // Outbound datagrams

    /// Frame `message` with the next sequence number, reliable if the message is
    pub fn packet(&mut self, message: &Message) -> Vec<u8> {
        let sequence = self.next_sequence();
        self.packet_with(sequence, message, &[])
    }

    pub fn packet_with(
        &self,
        sequence: SequenceNumber,
        message: &Message,
        acks: &[SequenceNumber],
    ) -> Vec<u8> {
        let (message_type, payload) = self.codec.encode(message);
        PacketBuilder::new(sequence)
            .reliable(message.is_reliable())
            .acks(acks)
            .build(message_type, &payload)
    }

    /// Claim `circuit_code` using this peer's agent and session
    pub fn use_circuit_code(&mut self, circuit_code: CircuitCode) -> Vec<u8> {
        let message = Message::reliable(UseCircuitCode {
            circuit_code,
            session_id: self.session_id,
            agent_id: self.agent_id,
        });
        self.packet(&message)
    }

    pub fn claim_circuit(&mut self) -> Vec<u8> {
        let circuit_code = self.circuit_code;
        self.use_circuit_code(circuit_code)
    }

    pub fn ack(&mut self, sequences: &[SequenceNumber]) -> Vec<u8> {
        self.packet(&Message::new(PacketAck {
            packets: sequences.to_vec(),
        }))
    }

    pub fn logout_request(&mut self) -> Vec<u8> {
        let message = Message::reliable(LogoutRequest {
            agent_id: self.agent_id,
            session_id: self.session_id,
        });
        self.packet(&message)
    }

    // Payloads carrying this peer's identity

    pub fn generic(&self, method: &str) -> GenericMessage {
        GenericMessage::new(self.agent_id, self.session_id, method)
    }

    pub fn godlike(&self, method: &str) -> GodlikeMessage {
        GodlikeMessage::new(self.agent_id, self.session_id, method)
    }

    pub fn instant_message(&self, dialog: GridInstantMessageDialog, text: &str) -> ImprovedInstantMessage {
        ImprovedInstantMessage::new(self.agent_id, self.session_id, Uuid::new_v4(), dialog, text)
    }

    // Inbound datagrams

    pub fn parse(&self, datagram: &[u8]) -> Packet {
        Packet::parse(datagram, 8192).expect("server sent a malformed packet")
    }

    pub fn decode(&self, datagram: &[u8]) -> Message {
        self.codec
            .decode_packet(&self.parse(datagram))
            .expect("server sent an undecodable packet")
    }

    pub fn message_type(&self, datagram: &[u8]) -> Option<MessageType> {
        self.parse(datagram).message_type()
    }

    /// Every sequence acknowledged by `datagram`, appended or in a PacketAck body
    pub fn acks_in(&self, datagram: &[u8]) -> Vec<SequenceNumber> {
        let message = self.decode(datagram);
        let mut acks = message.appended_acks().to_vec();
        if let MessagePayload::PacketAck(body) = message.payload() {
            acks.extend_from_slice(&body.packets);
        }
        acks
    }
}
