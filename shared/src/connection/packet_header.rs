use crate::SequenceNumber;

/// The single flags byte at the front of every datagram
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PacketFlags(u8);

impl PacketFlags {
    pub const ZERO_CODED: u8 = 0x80;
    pub const RELIABLE: u8 = 0x40;
    pub const RESENT: u8 = 0x20;
    pub const ACKS_APPENDED: u8 = 0x10;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_zero_coded(&self) -> bool {
        self.0 & Self::ZERO_CODED != 0
    }

    pub fn is_reliable(&self) -> bool {
        self.0 & Self::RELIABLE != 0
    }

    pub fn is_resent(&self) -> bool {
        self.0 & Self::RESENT != 0
    }

    pub fn has_acks(&self) -> bool {
        self.0 & Self::ACKS_APPENDED != 0
    }

    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Fixed-size datagram header: flags, big-endian sequence number and the
/// length of an extra header block which is skipped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub flags: PacketFlags,
    pub sequence: SequenceNumber,
    pub extra_length: u8,
}

impl PacketHeader {
    pub const SIZE: usize = 6;

    pub fn new(flags: PacketFlags, sequence: SequenceNumber) -> Self {
        Self {
            flags,
            sequence,
            extra_length: 0,
        }
    }

    pub fn write(&self, output: &mut Vec<u8>) {
        output.push(self.flags.bits());
        output.extend_from_slice(&self.sequence.to_be_bytes());
        output.push(self.extra_length);
    }

    /// Returns `None` when the datagram is too short to hold a header
    pub fn read(datagram: &[u8]) -> Option<Self> {
        if datagram.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            flags: PacketFlags::from_bits(datagram[0]),
            sequence: SequenceNumber::from_be_bytes([
                datagram[1],
                datagram[2],
                datagram[3],
                datagram[4],
            ]),
            extra_length: datagram[5],
        })
    }

    /// Flag an already built datagram as a retransmission
    pub fn mark_resent(datagram: &mut [u8]) {
        if let Some(flags) = datagram.first_mut() {
            *flags |= PacketFlags::RESENT;
        }
    }
}
