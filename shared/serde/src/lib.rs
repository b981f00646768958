//! # Simcircuit Serde
//! Byte-oriented serialization used by the simcircuit message codec. Payload
//! fields are little-endian, packet header fields are big-endian and written
//! directly by the framing layer.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod error;
mod integer;
mod serde;
mod strings;
mod vector;
mod zerocode;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use error::SerdeErr;
pub use serde::Serde;
pub use strings::{Var1Bytes, Var1String, Var2Bytes, Var2String, VariableBytes, VariableString};
pub use uuid::Uuid;
pub use vector::Vector3;
pub use zerocode::{zero_decode, zero_encode, ZeroCodeError};
