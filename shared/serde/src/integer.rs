use crate::{ByteReader, ByteWriter, Serde, SerdeErr};

macro_rules! impl_serde_le {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut ByteWriter) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    Ok(<$ty>::from_le_bytes(reader.read_array()?))
                }
            }
        )*
    };
}

impl_serde_le!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

// Any non-zero byte reads back as true
impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(reader.read_byte()? != 0)
    }
}

impl Serde for uuid::Uuid {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(uuid::Uuid::from_bytes(reader.read_array()?))
    }
}
