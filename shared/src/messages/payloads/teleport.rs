use simcircuit_serde::{ByteReader, ByteWriter, Serde, SerdeErr, Uuid, Var1String, Vector3};

use super::{de_blocks, ser_blocks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportStart {
    pub teleport_flags: u32,
}

impl Serde for TeleportStart {
    fn ser(&self, writer: &mut ByteWriter) {
        self.teleport_flags.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            teleport_flags: u32::de(reader)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportProgress {
    pub agent_id: Uuid,
    pub teleport_flags: u32,
    pub message: String,
}

impl Serde for TeleportProgress {
    fn ser(&self, writer: &mut ByteWriter) {
        self.agent_id.ser(writer);
        self.teleport_flags.ser(writer);
        Var1String::new(self.message.as_str()).ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            agent_id: Uuid::de(reader)?,
            teleport_flags: u32::de(reader)?,
            message: Var1String::de(reader)?.into_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportAlertInfo {
    pub message: String,
    pub extra_params: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportFailed {
    pub agent_id: Uuid,
    pub reason: String,
    pub alert_info: Vec<TeleportAlertInfo>,
}

impl Serde for TeleportFailed {
    fn ser(&self, writer: &mut ByteWriter) {
        self.agent_id.ser(writer);
        Var1String::new(self.reason.as_str()).ser(writer);
        ser_blocks(&self.alert_info, writer, |info, writer| {
            Var1String::new(info.message.as_str()).ser(writer);
            Var1String::new(info.extra_params.as_str()).ser(writer);
        });
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            agent_id: Uuid::de(reader)?,
            reason: Var1String::de(reader)?.into_string(),
            alert_info: de_blocks(reader, |reader| {
                Ok(TeleportAlertInfo {
                    message: Var1String::de(reader)?.into_string(),
                    extra_params: Var1String::de(reader)?.into_string(),
                })
            })?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeleportLocal {
    pub agent_id: Uuid,
    pub location_id: u32,
    pub position: Vector3,
    pub look_at: Vector3,
    pub teleport_flags: u32,
}

impl Serde for TeleportLocal {
    fn ser(&self, writer: &mut ByteWriter) {
        self.agent_id.ser(writer);
        self.location_id.ser(writer);
        self.position.ser(writer);
        self.look_at.ser(writer);
        self.teleport_flags.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            agent_id: Uuid::de(reader)?,
            location_id: u32::de(reader)?,
            position: Vector3::de(reader)?,
            look_at: Vector3::de(reader)?,
            teleport_flags: u32::de(reader)?,
        })
    }
}
