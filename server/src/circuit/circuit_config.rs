use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a Circuit
#[derive(Clone, Debug)]
pub struct CircuitConfig {
    /// How long a reliable packet may go unacknowledged before it is resent
    pub resend_timeout: Duration,
    /// Number of resends a reliable packet gets. A packet still unacknowledged
    /// when it falls due after its last resend stops the circuit.
    pub max_resends: u32,
    /// The circuit stops if nothing is received from the peer for this long
    pub idle_timeout: Duration,
    /// Interval of the circuit's own tick thread. When `None` no thread is
    /// started and the owner must call `Circuit::tick` itself.
    pub tick_interval: Option<Duration>,
    /// How many recently received sequence numbers are remembered for
    /// duplicate suppression
    pub duplicate_window: usize,
    /// Maximum number of reliable packets awaiting acknowledgement
    pub max_outstanding: usize,
    /// Maximum number of acks piggybacked onto a single outgoing packet
    pub max_appended_acks: usize,
    /// Interval between keepalive pings, `None` disables them
    pub ping_interval: Option<Duration>,
    /// Zero-coded bodies may not expand past this size
    pub max_body_size: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            resend_timeout: Duration::from_secs(1),
            max_resends: 3,
            idle_timeout: Duration::from_secs(60),
            tick_interval: Some(Duration::from_millis(100)),
            duplicate_window: 1024,
            max_outstanding: 4096,
            max_appended_acks: 250,
            ping_interval: Some(Duration::from_secs(5)),
            max_body_size: 8192,
        }
    }
}
