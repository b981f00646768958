use std::collections::VecDeque;

use simcircuit_shared::SequenceNumber;

/// Sequence numbers of received reliable packets which still have to be
/// acknowledged. A number received twice is acknowledged twice.
pub(crate) struct AckManager {
    pending: VecDeque<SequenceNumber>,
}

impl AckManager {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sequence: SequenceNumber) {
        self.pending.push_back(sequence);
    }

    /// Take at most `limit` acks, oldest first
    pub fn take(&mut self, limit: usize) -> Vec<SequenceNumber> {
        let count = limit.min(self.pending.len());
        self.pending.drain(..count).collect()
    }

    /// Put acks taken for a packet that never left back at the front
    pub fn restore(&mut self, acks: Vec<SequenceNumber>) {
        for sequence in acks.into_iter().rev() {
            self.pending.push_front(sequence);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
