use crate::{ByteReader, ByteWriter, Serde, SerdeErr};

pub type Var1String = VariableString<1>;
pub type Var2String = VariableString<2>;
pub type Var1Bytes = VariableBytes<1>;
pub type Var2Bytes = VariableBytes<2>;

fn max_length(prefix: usize) -> usize {
    if prefix == 1 {
        u8::MAX as usize
    } else {
        u16::MAX as usize
    }
}

fn write_length(writer: &mut ByteWriter, prefix: usize, length: usize) {
    if prefix == 1 {
        writer.write_byte(length as u8);
    } else {
        writer.write_bytes(&(length as u16).to_le_bytes());
    }
}

fn read_length(reader: &mut ByteReader, prefix: usize) -> Result<usize, SerdeErr> {
    if prefix == 1 {
        Ok(reader.read_byte()? as usize)
    } else {
        Ok(u16::from_le_bytes(reader.read_array()?) as usize)
    }
}

/// Opaque bytes carried behind a 1 or 2 byte length prefix
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableBytes<const PREFIX: usize> {
    bytes: Vec<u8>,
}

impl<const PREFIX: usize> VariableBytes<PREFIX> {
    /// Returns an error if the bytes do not fit behind the prefix
    pub fn try_new(bytes: Vec<u8>) -> Result<Self, SerdeErr> {
        let max = max_length(PREFIX);
        if bytes.len() > max {
            return Err(SerdeErr::LengthOverflow {
                length: bytes.len(),
                max,
            });
        }
        Ok(Self { bytes })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl<const PREFIX: usize> Serde for VariableBytes<PREFIX> {
    fn ser(&self, writer: &mut ByteWriter) {
        write_length(writer, PREFIX, self.bytes.len());
        writer.write_bytes(&self.bytes);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = read_length(reader, PREFIX)?;
        let bytes = reader.read_bytes(length)?.to_vec();
        Ok(Self { bytes })
    }
}

/// Text behind a 1 or 2 byte length prefix. A non-empty string is written
/// with a trailing NUL which is counted in the length.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct VariableString<const PREFIX: usize> {
    value: String,
}

impl<const PREFIX: usize> VariableString<PREFIX> {
    /// Text longer than the prefix allows is truncated at a char boundary
    pub fn new(value: impl Into<String>) -> Self {
        let mut value: String = value.into();
        let max = max_length(PREFIX) - 1;
        if value.len() > max {
            let mut end = max;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            value.truncate(end);
        }
        Self { value }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<const PREFIX: usize> From<&str> for VariableString<PREFIX> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<const PREFIX: usize> From<String> for VariableString<PREFIX> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<const PREFIX: usize> Serde for VariableString<PREFIX> {
    fn ser(&self, writer: &mut ByteWriter) {
        if self.value.is_empty() {
            write_length(writer, PREFIX, 0);
            return;
        }
        write_length(writer, PREFIX, self.value.len() + 1);
        writer.write_bytes(self.value.as_bytes());
        writer.write_byte(0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = read_length(reader, PREFIX)?;
        let mut bytes = reader.read_bytes(length)?;
        if let Some(end) = bytes.iter().position(|b| *b == 0) {
            bytes = &bytes[..end];
        }
        Ok(Self {
            value: String::from_utf8_lossy(bytes).into_owned(),
        })
    }
}
