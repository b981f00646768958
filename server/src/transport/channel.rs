use std::{net::SocketAddr, sync::Arc, time::Duration};

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};

use super::{PacketReceiver, PacketSender, RecvError, SendError, Socket};

pub type Datagram = (SocketAddr, Box<[u8]>);

impl PacketSender for Sender<Datagram> {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        Sender::send(self, (*address, payload.into())).map_err(|_| SendError)
    }
}

struct PacketChannelReceiver {
    receiver: Receiver<Datagram>,
}

impl PacketChannelReceiver {
    fn new(receiver: Receiver<Datagram>) -> Self {
        Self { receiver }
    }
}

impl PacketReceiver for PacketChannelReceiver {
    fn receive(&mut self, timeout: Duration) -> Result<Option<(SocketAddr, Vec<u8>)>, RecvError> {
        match self.receiver.recv_timeout(timeout) {
            Ok((address, payload)) => Ok(Some((address, payload.into_vec()))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(RecvError),
        }
    }
}

/// An in-memory socket. Datagrams sent through it come out of `outbound`
/// tagged with their destination, datagrams pushed into `inbound` are
/// received tagged with their source.
pub struct ChannelSocket {
    local_addr: SocketAddr,
    outbound: Sender<Datagram>,
    inbound: Receiver<Datagram>,
}

impl ChannelSocket {
    pub fn new(local_addr: SocketAddr, outbound: Sender<Datagram>, inbound: Receiver<Datagram>) -> Self {
        Self {
            local_addr,
            outbound,
            inbound,
        }
    }
}

impl Socket for ChannelSocket {
    fn listen(self: Box<Self>) -> (Arc<dyn PacketSender>, Box<dyn PacketReceiver>) {
        (
            Arc::new(self.outbound),
            Box::new(PacketChannelReceiver::new(self.inbound)),
        )
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
