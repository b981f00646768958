//! Shared fixtures for the simcircuit integration tests: an in-memory socket
//! pair, a scripted remote peer and probes for handlers and outbound traffic.

pub mod helpers;

pub use helpers::*;
pub use local_socket::LocalSocketPair;
