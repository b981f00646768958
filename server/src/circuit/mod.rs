mod ack_manager;
mod circuit;
mod circuit_config;
mod circuit_state;
mod identity;
mod reliable_sender;
mod stats;
mod tick_thread;

pub use circuit::{Circuit, InboundOutcome};
pub use circuit_config::CircuitConfig;
pub use circuit_state::{CircuitState, CloseReason};
pub use identity::{CircuitIdentity, CircuitKey};
pub use stats::CircuitStats;

pub(crate) use circuit::StopNotice;
