use std::{
    io,
    net::{self, SocketAddr},
    sync::Arc,
    time::Duration,
};

use log::{debug, warn};

use super::{PacketReceiver, PacketSender, RecvError, SendError, Socket};

const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// A UDP socket bound to a local address
pub struct UdpSocket {
    socket: net::UdpSocket,
    local_addr: SocketAddr,
    max_datagram_size: usize,
}

impl UdpSocket {
    pub fn bind(address: SocketAddr, max_datagram_size: usize) -> io::Result<Self> {
        let socket = net::UdpSocket::bind(address)?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local_addr,
            max_datagram_size,
        })
    }
}

impl Socket for UdpSocket {
    fn listen(self: Box<Self>) -> (Arc<dyn PacketSender>, Box<dyn PacketReceiver>) {
        let sender = match self.socket.try_clone() {
            Ok(socket) => UdpPacketSender {
                socket: Some(socket),
            },
            Err(err) => {
                warn!("failed to clone UDP socket for sending: {}", err);
                UdpPacketSender { socket: None }
            }
        };
        let receiver = UdpPacketReceiver {
            socket: self.socket,
            buffer: vec![0; self.max_datagram_size],
            timeout: None,
        };
        (Arc::new(sender), Box::new(receiver))
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

struct UdpPacketSender {
    socket: Option<net::UdpSocket>,
}

impl PacketSender for UdpPacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        let Some(socket) = &self.socket else {
            return Err(SendError);
        };
        socket
            .send_to(payload, address)
            .map(|_| ())
            .map_err(|err| {
                debug!("send to {} failed: {}", address, err);
                SendError
            })
    }
}

struct UdpPacketReceiver {
    socket: net::UdpSocket,
    buffer: Vec<u8>,
    timeout: Option<Duration>,
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self, timeout: Duration) -> Result<Option<(SocketAddr, Vec<u8>)>, RecvError> {
        let timeout = timeout.max(MIN_READ_TIMEOUT);
        if self.timeout != Some(timeout) {
            self.socket
                .set_read_timeout(Some(timeout))
                .map_err(|_| RecvError)?;
            self.timeout = Some(timeout);
        }

        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => Ok(Some((address, self.buffer[..length].to_vec()))),
            Err(err) => match err.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Ok(None),
                // ICMP port unreachable from a previous send surfaces here on some platforms
                io::ErrorKind::ConnectionReset | io::ErrorKind::Interrupted => {
                    debug!("transient receive error: {}", err);
                    Ok(None)
                }
                _ => {
                    warn!("UDP receive failed: {}", err);
                    Err(RecvError)
                }
            },
        }
    }
}
