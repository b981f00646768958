use std::fmt;

/// Lifecycle of a circuit. Transitions only move forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CircuitState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl CircuitState {
    pub fn is_closing(&self) -> bool {
        matches!(self, CircuitState::Stopping | CircuitState::Stopped)
    }
}

/// Why a circuit stopped
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// `stop` was called by the owner or the circuit was removed from its manager
    Requested,
    /// Nothing was received from the peer within the idle timeout
    Timeout,
    /// A reliable packet ran out of resends without being acknowledged
    RetransmitExhausted,
    /// The protocol level logout finished
    LogoutComplete,
    /// The owning manager shut down
    ManagerShutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CloseReason::Requested => "requested",
            CloseReason::Timeout => "idle timeout",
            CloseReason::RetransmitExhausted => "retransmit budget exhausted",
            CloseReason::LogoutComplete => "logout complete",
            CloseReason::ManagerShutdown => "manager shutdown",
        };
        f.write_str(reason)
    }
}
