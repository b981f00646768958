use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::SequenceNumber;

/// Errors that can occur during SequenceWindow operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The sequence number has already been seen inside the window
    #[error("Duplicate sequence number {sequence} already seen in window")]
    DuplicateSequence { sequence: SequenceNumber },
}

/// Remembers the most recently received sequence numbers so that resent
/// duplicates can be recognised. Oldest entries are evicted first once the
/// window is full. The window does not reorder anything.
pub struct SequenceWindow {
    capacity: usize,
    order: VecDeque<SequenceNumber>,
    seen: HashSet<SequenceNumber>,
}

impl SequenceWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    pub fn contains(&self, sequence: &SequenceNumber) -> bool {
        self.seen.contains(sequence)
    }

    /// Records the sequence number, returning an error if it is already in the window
    pub fn try_insert(&mut self, sequence: SequenceNumber) -> Result<(), SequenceError> {
        if !self.seen.insert(sequence) {
            return Err(SequenceError::DuplicateSequence { sequence });
        }

        self.order.push_back(sequence);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}
