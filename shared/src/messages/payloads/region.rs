use simcircuit_serde::{ByteReader, ByteWriter, Serde, SerdeErr, Uuid, Var1String};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHandshake {
    pub region_flags: u32,
    pub sim_access: u8,
    pub sim_name: String,
    pub region_id: Uuid,
}

impl Serde for RegionHandshake {
    fn ser(&self, writer: &mut ByteWriter) {
        self.region_flags.ser(writer);
        self.sim_access.ser(writer);
        Var1String::new(self.sim_name.as_str()).ser(writer);
        self.region_id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            region_flags: u32::de(reader)?,
            sim_access: u8::de(reader)?,
            sim_name: Var1String::de(reader)?.into_string(),
            region_id: Uuid::de(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHandshakeReply {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub flags: u32,
}

impl Serde for RegionHandshakeReply {
    fn ser(&self, writer: &mut ByteWriter) {
        self.agent_id.ser(writer);
        self.session_id.ser(writer);
        self.flags.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            agent_id: Uuid::de(reader)?,
            session_id: Uuid::de(reader)?,
            flags: u32::de(reader)?,
        })
    }
}
