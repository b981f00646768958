use simcircuit_serde::{ByteReader, ByteWriter, Serde, SerdeErr, Uuid};

use super::{de_blocks, ser_blocks};
use crate::{CircuitCode, SequenceNumber};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPingCheck {
    pub ping_id: u8,
    pub oldest_unacked: SequenceNumber,
}

impl Serde for StartPingCheck {
    fn ser(&self, writer: &mut ByteWriter) {
        self.ping_id.ser(writer);
        self.oldest_unacked.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            ping_id: u8::de(reader)?,
            oldest_unacked: u32::de(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletePingCheck {
    pub ping_id: u8,
}

impl Serde for CompletePingCheck {
    fn ser(&self, writer: &mut ByteWriter) {
        self.ping_id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            ping_id: u8::de(reader)?,
        })
    }
}

/// Sent by a peer to claim the circuit it was assigned at login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseCircuitCode {
    pub circuit_code: CircuitCode,
    pub session_id: Uuid,
    pub agent_id: Uuid,
}

impl Serde for UseCircuitCode {
    fn ser(&self, writer: &mut ByteWriter) {
        self.circuit_code.ser(writer);
        self.session_id.ser(writer);
        self.agent_id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            circuit_code: u32::de(reader)?,
            session_id: Uuid::de(reader)?,
            agent_id: Uuid::de(reader)?,
        })
    }
}

/// Explicit acknowledgement of received reliable packets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PacketAck {
    pub packets: Vec<SequenceNumber>,
}

impl Serde for PacketAck {
    fn ser(&self, writer: &mut ByteWriter) {
        ser_blocks(&self.packets, writer, |sequence, writer| sequence.ser(writer));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            packets: de_blocks(reader, u32::de)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutRequest {
    pub agent_id: Uuid,
    pub session_id: Uuid,
}

impl Serde for LogoutRequest {
    fn ser(&self, writer: &mut ByteWriter) {
        self.agent_id.ser(writer);
        self.session_id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            agent_id: Uuid::de(reader)?,
            session_id: Uuid::de(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutReply {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub item_ids: Vec<Uuid>,
}

impl Serde for LogoutReply {
    fn ser(&self, writer: &mut ByteWriter) {
        self.agent_id.ser(writer);
        self.session_id.ser(writer);
        ser_blocks(&self.item_ids, writer, |id, writer| id.ser(writer));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            agent_id: Uuid::de(reader)?,
            session_id: Uuid::de(reader)?,
            item_ids: de_blocks(reader, Uuid::de)?,
        })
    }
}
