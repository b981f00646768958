use crate::circuit::{CircuitKey, CloseReason};

/// Changes to the manager's circuit table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitEvent {
    Added(CircuitKey),
    Removed { key: CircuitKey, reason: CloseReason },
}
