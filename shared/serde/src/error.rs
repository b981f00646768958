use thiserror::Error;

/// The error returned when a field cannot be read from a byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The buffer ended before the field was complete
    #[error("Unexpected end of buffer: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A field carried a value that is not valid for its type
    #[error("Invalid value {value} for field of type {type_name}")]
    InvalidValue {
        type_name: &'static str,
        value: u32,
    },

    /// A variable length field declared more bytes than its prefix allows
    #[error("Variable length field of {length} bytes exceeds the {max} byte limit")]
    LengthOverflow { length: usize, max: usize },
}
