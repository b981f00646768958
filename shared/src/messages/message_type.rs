use simcircuit_serde::{ByteReader, ByteWriter, SerdeErr};

use crate::Opcode;

/// How a message number is laid out on the wire
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Frequency {
    /// One byte, `0x01..=0xFE`
    High(u8),
    /// `0xFF` followed by one byte
    Medium(u8),
    /// `0xFF 0xFF` followed by a big-endian u16
    Low(u16),
    /// `0xFF 0xFF 0xFF` followed by one byte
    Fixed(u8),
}

impl Frequency {
    pub fn opcode(&self) -> Opcode {
        match self {
            Frequency::High(number) => Opcode::from(*number),
            Frequency::Medium(number) => 0xFF00 | Opcode::from(*number),
            Frequency::Low(number) => 0xFFFF_0000 | Opcode::from(*number),
            Frequency::Fixed(number) => 0xFFFF_FF00 | Opcode::from(*number),
        }
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        match self {
            Frequency::High(number) => writer.write_byte(*number),
            Frequency::Medium(number) => {
                writer.write_byte(0xFF);
                writer.write_byte(*number);
            }
            Frequency::Low(number) => {
                writer.write_bytes(&[0xFF, 0xFF]);
                writer.write_bytes(&number.to_be_bytes());
            }
            Frequency::Fixed(number) => {
                writer.write_bytes(&[0xFF, 0xFF, 0xFF]);
                writer.write_byte(*number);
            }
        }
    }

    /// Reads a message number prefix, returning the opcode it designates
    pub fn read(reader: &mut ByteReader) -> Result<Opcode, SerdeErr> {
        let first = reader.read_byte()?;
        if first == 0 {
            return Err(SerdeErr::InvalidValue {
                type_name: "message number",
                value: 0,
            });
        }
        if first != 0xFF {
            return Ok(Frequency::High(first).opcode());
        }

        let second = reader.read_byte()?;
        if second != 0xFF {
            return Ok(Frequency::Medium(second).opcode());
        }

        let [high, low] = reader.read_array::<2>()?;
        if high == 0xFF {
            return Ok(Frequency::Fixed(low).opcode());
        }
        Ok(Frequency::Low(u16::from_be_bytes([high, low])).opcode())
    }
}

macro_rules! message_types {
    ($($name:ident => $frequency:expr, zero_coded: $zero:expr;)*) => {
        /// Every message type the codec knows how to frame
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum MessageType {
            $($name,)*
        }

        impl MessageType {
            pub const ALL: &'static [MessageType] = &[$(MessageType::$name,)*];

            pub fn frequency(&self) -> Frequency {
                match self {
                    $(MessageType::$name => $frequency,)*
                }
            }

            /// Whether bodies of this type are zero-coded on the wire
            pub fn is_zero_coded(&self) -> bool {
                match self {
                    $(MessageType::$name => $zero,)*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(MessageType::$name => stringify!($name),)*
                }
            }
        }
    };
}

message_types! {
    StartPingCheck => Frequency::High(1), zero_coded: false;
    CompletePingCheck => Frequency::High(2), zero_coded: false;
    UseCircuitCode => Frequency::Low(3), zero_coded: false;
    TeleportLocal => Frequency::Low(64), zero_coded: false;
    TeleportProgress => Frequency::Low(66), zero_coded: false;
    TeleportStart => Frequency::Low(73), zero_coded: false;
    TeleportFailed => Frequency::Low(74), zero_coded: false;
    RegionHandshake => Frequency::Low(148), zero_coded: true;
    RegionHandshakeReply => Frequency::Low(149), zero_coded: true;
    LogoutRequest => Frequency::Low(252), zero_coded: false;
    LogoutReply => Frequency::Low(253), zero_coded: true;
    ImprovedInstantMessage => Frequency::Low(254), zero_coded: true;
    GodlikeMessage => Frequency::Low(259), zero_coded: true;
    GenericMessage => Frequency::Low(261), zero_coded: true;
    PacketAck => Frequency::Fixed(0xFB), zero_coded: false;
}

impl MessageType {
    pub fn opcode(&self) -> Opcode {
        self.frequency().opcode()
    }

    pub fn from_opcode(opcode: Opcode) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|message_type| message_type.opcode() == opcode)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
