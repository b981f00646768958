use simcircuit_serde::{ByteReader, ByteWriter, Serde, SerdeErr, Uuid, Var1String};

use super::{de_blocks, ser_blocks};

// Both message families carry a method name which is used for secondary
// dispatch, followed by free-form string parameters.
macro_rules! method_message {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub agent_id: Uuid,
            pub session_id: Uuid,
            pub transaction_id: Uuid,
            pub method: String,
            pub invoice: Uuid,
            pub params: Vec<String>,
        }

        impl $name {
            pub fn new(agent_id: Uuid, session_id: Uuid, method: impl Into<String>) -> Self {
                Self {
                    agent_id,
                    session_id,
                    transaction_id: Uuid::nil(),
                    method: method.into(),
                    invoice: Uuid::nil(),
                    params: Vec::new(),
                }
            }

            pub fn with_params(mut self, params: Vec<String>) -> Self {
                self.params = params;
                self
            }
        }

        impl Serde for $name {
            fn ser(&self, writer: &mut ByteWriter) {
                self.agent_id.ser(writer);
                self.session_id.ser(writer);
                self.transaction_id.ser(writer);
                Var1String::new(self.method.as_str()).ser(writer);
                self.invoice.ser(writer);
                ser_blocks(&self.params, writer, |param, writer| {
                    Var1String::new(param.as_str()).ser(writer);
                });
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                Ok(Self {
                    agent_id: Uuid::de(reader)?,
                    session_id: Uuid::de(reader)?,
                    transaction_id: Uuid::de(reader)?,
                    method: Var1String::de(reader)?.into_string(),
                    invoice: Uuid::de(reader)?,
                    params: de_blocks(reader, |reader| {
                        Ok(Var1String::de(reader)?.into_string())
                    })?,
                })
            }
        }
    };
}

method_message!(GenericMessage);
method_message!(GodlikeMessage);
