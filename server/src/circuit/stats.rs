use std::time::Duration;

/// Counters describing a circuit's traffic so far
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CircuitStats {
    pub packets_sent: u64,
    pub packets_resent: u64,
    pub packets_received: u64,
    pub duplicates_received: u64,
    pub acks_sent: u64,
    pub outstanding: usize,
    pub last_rtt: Option<Duration>,
}
