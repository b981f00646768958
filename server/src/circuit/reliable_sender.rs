use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use simcircuit_shared::{PacketHeader, SequenceNumber};

struct OutstandingPacket {
    // stored without appended acks, already flagged as resent
    datagram: Vec<u8>,
    last_sent: Instant,
    resends: u32,
}

/// Result of one resend pass
#[derive(Default)]
pub(crate) struct ResendPlan {
    pub resend: Vec<(SequenceNumber, Vec<u8>)>,
    pub exhausted: Vec<SequenceNumber>,
}

/// Reliable packets that have been sent but not yet acknowledged
pub(crate) struct ReliableSender {
    outstanding: BTreeMap<SequenceNumber, OutstandingPacket>,
}

impl ReliableSender {
    pub fn new() -> Self {
        Self {
            outstanding: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, sequence: SequenceNumber, mut datagram: Vec<u8>, now: Instant) {
        PacketHeader::mark_resent(&mut datagram);
        self.outstanding.insert(
            sequence,
            OutstandingPacket {
                datagram,
                last_sent: now,
                resends: 0,
            },
        );
    }

    /// Returns true if the sequence was outstanding
    pub fn acknowledge(&mut self, sequence: SequenceNumber) -> bool {
        self.outstanding.remove(&sequence).is_some()
    }

    /// Collect every packet whose resend deadline has passed. Packets which
    /// already used up `max_resends` are reported as exhausted instead.
    pub fn collect_due(&mut self, now: Instant, timeout: Duration, max_resends: u32) -> ResendPlan {
        let mut plan = ResendPlan::default();
        for (sequence, packet) in self.outstanding.iter_mut() {
            if now.saturating_duration_since(packet.last_sent) < timeout {
                continue;
            }
            if packet.resends >= max_resends {
                plan.exhausted.push(*sequence);
                continue;
            }
            packet.resends += 1;
            packet.last_sent = now;
            plan.resend.push((*sequence, packet.datagram.clone()));
        }
        plan
    }

    pub fn oldest(&self) -> Option<SequenceNumber> {
        self.outstanding.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn clear(&mut self) {
        self.outstanding.clear();
    }
}
