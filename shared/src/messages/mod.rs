pub mod error;
pub mod message;
pub mod message_type;
pub mod payloads;
