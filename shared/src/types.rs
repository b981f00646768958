use uuid::Uuid;

pub type SequenceNumber = u32;
pub type CircuitCode = u32;
pub type Opcode = u32;

/// Identity stamped onto every message a circuit dispatches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CircuitContext {
    pub circuit_code: CircuitCode,
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub scene_id: Uuid,
}
