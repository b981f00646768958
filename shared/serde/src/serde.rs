use crate::{ByteReader, ByteWriter, SerdeErr};

/// A type that can be written to and read back from a datagram payload
pub trait Serde: Sized {
    /// Append this value to the writer
    fn ser(&self, writer: &mut ByteWriter);

    /// Read a value from the current position of the reader
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Some(value) => {
                true.ser(writer);
                value.ser(writer);
            }
            None => false.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }
}
