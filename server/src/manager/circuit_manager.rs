use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, info, trace, warn};
use parking_lot::{Mutex, RwLock};

use simcircuit_shared::{
    CircuitCode, Message, MessageCodec, MessagePayload, MessageType, Packet,
};

use crate::{
    circuit::{
        Circuit, CircuitConfig, CircuitIdentity, CircuitKey, CloseReason, InboundOutcome,
        StopNotice,
    },
    error::ManagerError,
    events::CircuitEvent,
    manager::manager_config::ManagerConfig,
    transport::{PacketReceiver, PacketSender, Socket, UdpSocket},
};

#[derive(Default)]
struct CircuitTable {
    circuits: HashMap<CircuitKey, Arc<Circuit>>,
    addresses: HashMap<SocketAddr, CircuitCode>,
}

impl CircuitTable {
    fn by_address(&self, address: &SocketAddr) -> Option<Arc<Circuit>> {
        let circuit_code = self.addresses.get(address)?;
        self.circuits
            .get(&CircuitKey {
                address: *address,
                circuit_code: *circuit_code,
            })
            .cloned()
    }

    fn remove(&mut self, key: &CircuitKey) -> Option<Arc<Circuit>> {
        let circuit = self.circuits.remove(key)?;
        if self.addresses.get(&key.address) == Some(&key.circuit_code) {
            self.addresses.remove(&key.address);
        }
        Some(circuit)
    }
}

// State shared between the manager handle and its receive loop
struct ManagerShared {
    config: ManagerConfig,
    codec: Arc<MessageCodec>,
    sender: Arc<dyn PacketSender>,
    table: RwLock<CircuitTable>,
    stop_sender: Sender<StopNotice>,
    stop_receiver: Receiver<StopNotice>,
    event_sender: Sender<CircuitEvent>,
    event_receiver: Receiver<CircuitEvent>,
    dropped: AtomicU64,
    shut_down: AtomicBool,
}

impl ManagerShared {
    fn emit(&self, event: CircuitEvent) {
        // the manager holds the receiving end, so this cannot fail
        if self.event_sender.send(event).is_err() {
            trace!("circuit event dropped");
        }
    }

    fn drop_datagram(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn process_datagram(&self, address: SocketAddr, datagram: &[u8]) -> Option<InboundOutcome> {
        let packet = match Packet::parse(datagram, self.config.circuit.max_body_size) {
            Ok(packet) => packet,
            Err(err) => {
                debug!("dropping malformed datagram from {}: {}", address, err);
                self.drop_datagram();
                return None;
            }
        };
        let use_circuit_code = packet.message_type() == Some(MessageType::UseCircuitCode);

        let circuit = self.table.read().by_address(&address);
        let Some(circuit) = circuit else {
            if use_circuit_code {
                debug!("UseCircuitCode from {} matches no admitted circuit", address);
            } else {
                trace!("dropping datagram from unknown address {}", address);
            }
            self.drop_datagram();
            return None;
        };

        if use_circuit_code {
            let claimed = self
                .codec
                .decode_packet(&packet)
                .ok()
                .and_then(|message| match message.into_payload() {
                    MessagePayload::UseCircuitCode(payload) => Some(payload.circuit_code),
                    _ => None,
                });
            if claimed != Some(circuit.circuit_code()) {
                debug!(
                    "dropping UseCircuitCode from {} claiming {:?}, bound to {}",
                    address,
                    claimed,
                    circuit.circuit_code()
                );
                self.drop_datagram();
                return None;
            }
        }

        Some(circuit.receive_packet_at(&packet, Instant::now()))
    }

    fn remove_circuit(&self, key: &CircuitKey) -> Option<Arc<Circuit>> {
        let circuit = self.table.write().remove(key)?;
        circuit.stop_with(CloseReason::Requested);
        let reason = circuit.close_reason().unwrap_or(CloseReason::Requested);
        info!("circuit {} removed: {}", key, reason);
        self.emit(CircuitEvent::Removed { key: *key, reason });
        Some(circuit)
    }

    fn maintain(&self) -> usize {
        let mut removed = 0;
        for notice in self.stop_receiver.try_iter() {
            let circuit = {
                let mut table = self.table.write();
                let stopped = table
                    .circuits
                    .get(&notice.key)
                    .is_some_and(|circuit| circuit.state().is_closing());
                if stopped {
                    table.remove(&notice.key)
                } else {
                    None
                }
            };
            if circuit.is_some() {
                info!("circuit {} removed: {}", notice.key, notice.reason);
                self.emit(CircuitEvent::Removed {
                    key: notice.key,
                    reason: notice.reason,
                });
                removed += 1;
            }
        }
        removed
    }
}

struct Listener {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns the socket and the table of active circuits, and demultiplexes
/// inbound datagrams to them
pub struct CircuitManager {
    shared: Arc<ManagerShared>,
    local_addr: SocketAddr,
    receiver: Mutex<Option<Box<dyn PacketReceiver>>>,
    listener: Mutex<Option<Listener>>,
}

impl CircuitManager {
    pub fn new(config: ManagerConfig, codec: Arc<MessageCodec>, socket: Box<dyn Socket>) -> Self {
        let local_addr = socket.local_addr();
        let (sender, receiver) = socket.listen();
        let (stop_sender, stop_receiver) = channel::unbounded();
        let (event_sender, event_receiver) = channel::unbounded();

        Self {
            shared: Arc::new(ManagerShared {
                config,
                codec,
                sender,
                table: RwLock::new(CircuitTable::default()),
                stop_sender,
                stop_receiver,
                event_sender,
                event_receiver,
                dropped: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
            }),
            local_addr,
            receiver: Mutex::new(Some(receiver)),
            listener: Mutex::new(None),
        }
    }

    /// Bind a UDP socket on `config.bind_address`
    pub fn bind(config: ManagerConfig, codec: Arc<MessageCodec>) -> Result<Self, ManagerError> {
        let address = config.bind_address;
        let socket = UdpSocket::bind(address, config.max_datagram_size)
            .map_err(|source| ManagerError::Bind { address, source })?;
        Ok(Self::new(config, codec, Box::new(socket)))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.shared.config
    }

    pub fn codec(&self) -> &Arc<MessageCodec> {
        &self.shared.codec
    }

    /// The sending half of the socket, shared by every circuit
    pub fn sender(&self) -> Arc<dyn PacketSender> {
        self.shared.sender.clone()
    }

    // Circuits

    /// Build a circuit using the manager's socket, codec and circuit config.
    /// It still has to be admitted with `add_circuit`.
    pub fn create_circuit(&self, identity: CircuitIdentity) -> Arc<Circuit> {
        self.create_circuit_with(identity, self.shared.config.circuit.clone())
    }

    pub fn create_circuit_with(&self, identity: CircuitIdentity, config: CircuitConfig) -> Arc<Circuit> {
        Circuit::new(
            identity,
            config,
            self.shared.codec.clone(),
            self.shared.sender.clone(),
        )
    }

    /// Admit a circuit. Each remote address may be bound to only one circuit.
    pub fn add_circuit(&self, circuit: Arc<Circuit>) -> Result<(), ManagerError> {
        if self.is_shut_down() {
            return Err(ManagerError::ShutDown);
        }
        self.shared.maintain();

        let key = circuit.key();
        if circuit.state().is_closing() {
            return Err(ManagerError::CircuitStopped { key });
        }
        {
            let mut table = self.shared.table.write();
            // shutdown raises the flag before draining under this lock
            if self.is_shut_down() {
                return Err(ManagerError::ShutDown);
            }
            if table.circuits.contains_key(&key) {
                return Err(ManagerError::CircuitExists { key });
            }
            if let Some(circuit_code) = table.addresses.get(&key.address) {
                return Err(ManagerError::AddressInUse {
                    address: key.address,
                    circuit_code: *circuit_code,
                });
            }
            table.addresses.insert(key.address, key.circuit_code);
            table.circuits.insert(key, circuit.clone());
        }

        circuit.attach_stop_notices(self.shared.stop_sender.clone());
        info!("circuit {} added", key);
        self.shared.emit(CircuitEvent::Added(key));

        // stopped before the notice channel was attached
        if circuit.state().is_closing() {
            self.shared.remove_circuit(&key);
        }
        Ok(())
    }

    /// Remove a circuit from the table and stop it
    pub fn remove_circuit(&self, key: &CircuitKey) -> Option<Arc<Circuit>> {
        self.shared.remove_circuit(key)
    }

    pub fn circuit(&self, key: &CircuitKey) -> Option<Arc<Circuit>> {
        self.shared.table.read().circuits.get(key).cloned()
    }

    pub fn circuit_by_address(&self, address: &SocketAddr) -> Option<Arc<Circuit>> {
        self.shared.table.read().by_address(address)
    }

    pub fn circuit_keys(&self) -> Vec<CircuitKey> {
        self.shared.table.read().circuits.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.shared.table.read().circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.table.read().circuits.is_empty()
    }

    /// Send a copy of `message` on every running circuit, returning how many
    /// accepted it
    pub fn broadcast(&self, message: &Message) -> usize {
        let mut circuits: Vec<Arc<Circuit>> = self.shared.table.read().circuits.values().cloned().collect();

        // shuffle order of circuits in order to avoid priority among peers
        fastrand::shuffle(&mut circuits);

        let mut sent = 0;
        for circuit in circuits {
            match circuit.send_message(message.clone()) {
                Ok(_) => sent += 1,
                Err(err) => trace!("broadcast skipped circuit {}: {}", circuit.key(), err),
            }
        }
        sent
    }

    // Receiving

    /// Route one datagram to the circuit bound to its source address.
    /// Returns `None` when the datagram was dropped.
    pub fn process_datagram(&self, address: SocketAddr, datagram: &[u8]) -> Option<InboundOutcome> {
        self.shared.process_datagram(address, datagram)
    }

    /// Number of datagrams dropped because they were malformed or matched no
    /// circuit
    pub fn dropped_datagrams(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Remove circuits which stopped themselves. The receive loop calls this
    /// after every poll.
    pub fn maintain(&self) -> usize {
        self.shared.maintain()
    }

    /// Start the receive loop on its own thread
    pub fn listen(&self) -> Result<(), ManagerError> {
        if self.is_shut_down() {
            return Err(ManagerError::ShutDown);
        }
        let Some(receiver) = self.receiver.lock().take() else {
            return Err(ManagerError::AlreadyListening);
        };

        let running = Arc::new(AtomicBool::new(true));
        let shared = self.shared.clone();
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("circuit-manager".to_string())
            .spawn(move || receive_loop(shared, receiver, flag))
            .map_err(ManagerError::ThreadSpawn)?;

        *self.listener.lock() = Some(Listener { running, handle });
        info!("circuit manager listening on {}", self.local_addr);
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(|listener| !listener.handle.is_finished())
    }

    // Events

    /// Drain every event queued since the last call
    pub fn events(&self) -> Vec<CircuitEvent> {
        self.shared.event_receiver.try_iter().collect()
    }

    /// A receiver for blocking on circuit events
    pub fn event_receiver(&self) -> Receiver<CircuitEvent> {
        self.shared.event_receiver.clone()
    }

    // Shutdown

    pub fn is_shut_down(&self) -> bool {
        self.shared.shut_down.load(Ordering::SeqCst)
    }

    /// Stop every circuit, stop the receive loop and release the socket.
    /// Calling this more than once does nothing.
    pub fn shutdown(&self) {
        if self.shared.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut circuits: Vec<Arc<Circuit>> = {
            let mut table = self.shared.table.write();
            table.addresses.clear();
            table.circuits.drain().map(|(_, circuit)| circuit).collect()
        };
        fastrand::shuffle(&mut circuits);
        for circuit in circuits {
            circuit.stop_with(CloseReason::ManagerShutdown);
            let reason = circuit.close_reason().unwrap_or(CloseReason::ManagerShutdown);
            self.shared.emit(CircuitEvent::Removed {
                key: circuit.key(),
                reason,
            });
        }

        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.running.store(false, Ordering::SeqCst);
            if listener.handle.thread().id() != thread::current().id()
                && listener.handle.join().is_err()
            {
                warn!("circuit manager receive loop panicked");
            }
        }
        self.receiver.lock().take();

        info!("circuit manager on {} shut down", self.local_addr);
    }
}

impl Drop for CircuitManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(shared: Arc<ManagerShared>, mut receiver: Box<dyn PacketReceiver>, running: Arc<AtomicBool>) {
    let timeout = shared.config.receive_timeout;
    while running.load(Ordering::SeqCst) {
        match receiver.receive(timeout) {
            Ok(Some((address, datagram))) => {
                shared.process_datagram(address, &datagram);
            }
            Ok(None) => {}
            Err(_) => {
                warn!("socket closed, circuit manager receive loop exiting");
                break;
            }
        }
        shared.maintain();
    }
}
