use simcircuit_serde::{zero_decode, zero_encode, ByteReader, ByteWriter};

use crate::{
    connection::{
        error::PacketError,
        packet_header::{PacketFlags, PacketHeader},
    },
    messages::message_type::{Frequency, MessageType},
    Opcode, SequenceNumber,
};

/// A datagram taken apart into header, message number, body and appended acks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: PacketHeader,
    opcode: Opcode,
    body: Vec<u8>,
    acks: Vec<SequenceNumber>,
}

impl Packet {
    /// Parse a raw datagram. Zero-coded bodies may not expand beyond `max_body`.
    pub fn parse(datagram: &[u8], max_body: usize) -> Result<Self, PacketError> {
        let Some(header) = PacketHeader::read(datagram) else {
            return Err(PacketError::TooShort {
                length: datagram.len(),
                minimum: PacketHeader::SIZE,
            });
        };

        let extra = header.extra_length as usize;
        let available = datagram.len() - PacketHeader::SIZE;
        if extra > available {
            return Err(PacketError::ExtraHeaderTruncated {
                declared: extra,
                available,
            });
        }
        let mut rest = &datagram[PacketHeader::SIZE + extra..];

        let mut acks = Vec::new();
        if header.flags.has_acks() {
            let Some((count, trailer)) = rest.split_last() else {
                return Err(PacketError::AckTrailerTruncated {
                    count: 0,
                    available: 0,
                });
            };
            let count = *count as usize;
            if count * 4 > trailer.len() {
                return Err(PacketError::AckTrailerTruncated {
                    count,
                    available: trailer.len(),
                });
            }
            let (front, ack_bytes) = trailer.split_at(trailer.len() - count * 4);
            acks = ack_bytes
                .chunks_exact(4)
                .map(|chunk| SequenceNumber::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            rest = front;
        }

        let expanded;
        let encoded = if header.flags.is_zero_coded() {
            expanded = zero_decode(rest, max_body)?;
            expanded.as_slice()
        } else {
            rest
        };

        let mut reader = ByteReader::new(encoded);
        let opcode = Frequency::read(&mut reader)?;
        let body = reader.read_rest().to_vec();

        Ok(Self {
            header,
            opcode,
            body,
            acks,
        })
    }

    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.header.sequence
    }

    pub fn is_reliable(&self) -> bool {
        self.header.flags.is_reliable()
    }

    pub fn is_resent(&self) -> bool {
        self.header.flags.is_resent()
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_opcode(self.opcode)
    }

    /// Message body after the message number, already zero-decoded
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn acks(&self) -> &[SequenceNumber] {
        &self.acks
    }
}

/// Assembles an outbound datagram
pub struct PacketBuilder {
    sequence: SequenceNumber,
    reliable: bool,
    resent: bool,
    acks: Vec<SequenceNumber>,
}

impl PacketBuilder {
    pub fn new(sequence: SequenceNumber) -> Self {
        Self {
            sequence,
            reliable: false,
            resent: false,
            acks: Vec::new(),
        }
    }

    pub fn reliable(mut self, reliable: bool) -> Self {
        self.reliable = reliable;
        self
    }

    pub fn resent(mut self, resent: bool) -> Self {
        self.resent = resent;
        self
    }

    /// At most 255 acks fit in the trailer, the rest are ignored
    pub fn acks(mut self, acks: &[SequenceNumber]) -> Self {
        let count = acks.len().min(u8::MAX as usize);
        self.acks = acks[..count].to_vec();
        self
    }

    /// Frame `payload` behind the message number of `message_type`
    pub fn build(self, message_type: MessageType, payload: &[u8]) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(payload.len() + 4);
        message_type.frequency().write(&mut writer);
        writer.write_bytes(payload);
        self.build_body(writer.as_bytes(), message_type.is_zero_coded())
    }

    /// Frame a body that already starts with its message number
    pub fn build_body(self, body: &[u8], zero_coded: bool) -> Vec<u8> {
        let mut flags = PacketFlags::default();
        flags.set(PacketFlags::ZERO_CODED, zero_coded);
        flags.set(PacketFlags::RELIABLE, self.reliable);
        flags.set(PacketFlags::RESENT, self.resent);
        flags.set(PacketFlags::ACKS_APPENDED, !self.acks.is_empty());

        let mut output = Vec::with_capacity(PacketHeader::SIZE + body.len() + self.acks.len() * 4 + 1);
        PacketHeader::new(flags, self.sequence).write(&mut output);

        if zero_coded {
            output.extend_from_slice(&zero_encode(body));
        } else {
            output.extend_from_slice(body);
        }

        if !self.acks.is_empty() {
            for ack in &self.acks {
                output.extend_from_slice(&ack.to_be_bytes());
            }
            output.push(self.acks.len() as u8);
        }

        output
    }
}
