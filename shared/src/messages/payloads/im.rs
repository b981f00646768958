use simcircuit_serde::{
    ByteReader, ByteWriter, Serde, SerdeErr, Uuid, Var1String, Var2Bytes, Var2String, Vector3,
};

macro_rules! dialogs {
    ($($name:ident = $value:expr,)*) => {
        /// Sub-type carried inside an instant message. Codes without an assigned
        /// meaning are preserved as `Unknown`.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum GridInstantMessageDialog {
            $($name,)*
            Unknown(u8),
        }

        impl GridInstantMessageDialog {
            pub fn from_u8(value: u8) -> Self {
                match value {
                    $($value => GridInstantMessageDialog::$name,)*
                    other => GridInstantMessageDialog::Unknown(other),
                }
            }

            pub fn to_u8(self) -> u8 {
                match self {
                    $(GridInstantMessageDialog::$name => $value,)*
                    GridInstantMessageDialog::Unknown(value) => value,
                }
            }
        }
    };
}

dialogs! {
    MessageFromAgent = 0,
    MessageBox = 1,
    GroupInvitation = 3,
    InventoryOffered = 4,
    InventoryAccepted = 5,
    InventoryDeclined = 6,
    GroupVote = 7,
    TaskInventoryOffered = 9,
    TaskInventoryAccepted = 10,
    TaskInventoryDeclined = 11,
    NewUserDefault = 12,
    SessionAdd = 13,
    SessionOfflineAdd = 14,
    SessionGroupStart = 15,
    SessionCardlessStart = 16,
    SessionSend = 17,
    SessionDrop = 18,
    MessageFromObject = 19,
    BusyAutoResponse = 20,
    ConsoleAndChatHistory = 21,
    RequestTeleport = 22,
    AcceptTeleport = 23,
    DenyTeleport = 24,
    GodLikeRequestTeleport = 25,
    RequestLure = 26,
    GotoUrl = 28,
    Session911Start = 29,
    Lure911 = 30,
    FromTaskAsAlert = 31,
    GroupNotice = 32,
    GroupNoticeInventoryAccepted = 33,
    GroupNoticeInventoryDeclined = 34,
    GroupInvitationAccept = 35,
    GroupInvitationDecline = 36,
    GroupNoticeRequested = 37,
    FriendshipOffered = 38,
    FriendshipAccepted = 39,
    FriendshipDeclined = 40,
    StartTyping = 41,
    StopTyping = 42,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImprovedInstantMessage {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub from_group: bool,
    pub to_agent_id: Uuid,
    pub parent_estate_id: u32,
    pub region_id: Uuid,
    pub position: Vector3,
    pub offline: u8,
    pub dialog: GridInstantMessageDialog,
    pub id: Uuid,
    pub timestamp: u32,
    pub from_agent_name: String,
    pub message: String,
    pub binary_bucket: Vec<u8>,
}

impl ImprovedInstantMessage {
    /// A plain agent-to-agent message with every optional field zeroed
    pub fn new(
        agent_id: Uuid,
        session_id: Uuid,
        to_agent_id: Uuid,
        dialog: GridInstantMessageDialog,
        message: impl Into<String>,
    ) -> Self {
        Self {
            agent_id,
            session_id,
            from_group: false,
            to_agent_id,
            parent_estate_id: 0,
            region_id: Uuid::nil(),
            position: Vector3::ZERO,
            offline: 0,
            dialog,
            id: Uuid::nil(),
            timestamp: 0,
            from_agent_name: String::new(),
            message: message.into(),
            binary_bucket: Vec::new(),
        }
    }
}

impl Serde for ImprovedInstantMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        self.agent_id.ser(writer);
        self.session_id.ser(writer);
        self.from_group.ser(writer);
        self.to_agent_id.ser(writer);
        self.parent_estate_id.ser(writer);
        self.region_id.ser(writer);
        self.position.ser(writer);
        self.offline.ser(writer);
        self.dialog.to_u8().ser(writer);
        self.id.ser(writer);
        self.timestamp.ser(writer);
        Var1String::new(self.from_agent_name.as_str()).ser(writer);
        Var2String::new(self.message.as_str()).ser(writer);
        let mut bucket = self.binary_bucket.clone();
        bucket.truncate(u16::MAX as usize);
        // length was clamped above so the bucket always fits
        match Var2Bytes::try_new(bucket) {
            Ok(bucket) => bucket.ser(writer),
            Err(_) => Var2Bytes::default().ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            agent_id: Uuid::de(reader)?,
            session_id: Uuid::de(reader)?,
            from_group: bool::de(reader)?,
            to_agent_id: Uuid::de(reader)?,
            parent_estate_id: u32::de(reader)?,
            region_id: Uuid::de(reader)?,
            position: Vector3::de(reader)?,
            offline: u8::de(reader)?,
            dialog: GridInstantMessageDialog::from_u8(u8::de(reader)?),
            id: Uuid::de(reader)?,
            timestamp: u32::de(reader)?,
            from_agent_name: Var1String::de(reader)?.into_string(),
            message: Var2String::de(reader)?.into_string(),
            binary_bucket: Var2Bytes::de(reader)?.into_inner(),
        })
    }
}
