use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use simcircuit_server::transport::{PacketSender, SendError};
use simcircuit_shared::{Packet, SequenceNumber};

/// Packet sender which keeps every datagram instead of sending it
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
    failing: AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// While set, every send fails and nothing is recorded
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }

    pub fn datagrams(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .iter()
            .map(|(_, datagram)| datagram.clone())
            .collect()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .drain(..)
            .map(|(_, datagram)| datagram)
            .collect()
    }

    pub fn packets(&self) -> Vec<Packet> {
        self.datagrams()
            .iter()
            .map(|datagram| Packet::parse(datagram, 8192).expect("server sent a malformed packet"))
            .collect()
    }

    pub fn sequences(&self) -> Vec<SequenceNumber> {
        self.packets().iter().map(Packet::sequence).collect()
    }

    pub fn destinations(&self) -> Vec<SocketAddr> {
        self.sent.lock().iter().map(|(address, _)| *address).collect()
    }
}

impl PacketSender for RecordingSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SendError);
        }
        self.sent.lock().push((*address, payload.to_vec()));
        Ok(())
    }
}
