mod channel;
mod udp;

pub use channel::{ChannelSocket, Datagram};
pub use udp::UdpSocket;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Failed to send datagram")]
pub struct SendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Socket closed or failed while receiving")]
pub struct RecvError;

pub trait Socket: Send {
    /// Split the socket into a shared sending half and the receiving half
    /// owned by the receive loop
    fn listen(self: Box<Self>) -> (Arc<dyn PacketSender>, Box<dyn PacketReceiver>);
    fn local_addr(&self) -> SocketAddr;
}

pub trait PacketSender: Send + Sync {
    /// Sends a datagram to the given address
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
}

pub trait PacketReceiver: Send {
    /// Waits up to `timeout` for a datagram. `Ok(None)` means nothing arrived.
    fn receive(&mut self, timeout: Duration) -> Result<Option<(SocketAddr, Vec<u8>)>, RecvError>;
}
