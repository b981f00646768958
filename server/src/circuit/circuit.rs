use std::{
    net::SocketAddr,
    sync::Arc,
    time::Instant,
};

use crossbeam::channel::Sender;
use log::{debug, info, trace, warn};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use simcircuit_shared::{
    CircuitContext, CompletePingCheck, DecodeError, Message, MessageCodec, MessagePayload,
    MessageType, Packet, PacketAck, PacketBuilder, PacketError, SequenceNumber, SequenceWindow,
    StampError, StartPingCheck, Timer,
};

use crate::{
    circuit::{
        ack_manager::AckManager,
        circuit_config::CircuitConfig,
        circuit_state::{CircuitState, CloseReason},
        identity::{CircuitIdentity, CircuitKey, SessionBinding},
        reliable_sender::ReliableSender,
        stats::CircuitStats,
        tick_thread::TickThread,
    },
    error::SendError,
    router::{DispatchOutcome, MessageRouter},
    transport::PacketSender,
};

// Both the ack trailer and a PacketAck body carry a one byte count
const MAX_ACKS_PER_PACKET: usize = u8::MAX as usize;

/// What a circuit did with one inbound datagram
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The circuit is not running, the datagram was ignored
    NotRunning,
    Malformed(PacketError),
    /// Sequence number was seen before; it was acknowledged again but not dispatched
    Duplicate { sequence: SequenceNumber },
    Undecodable(DecodeError),
    /// A transport control message consumed by the circuit itself
    Control(MessageType),
    Dispatched(DispatchOutcome),
}

/// Sent to the owning manager when a circuit stops
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StopNotice {
    pub key: CircuitKey,
    pub reason: CloseReason,
}

struct Lifecycle {
    state: CircuitState,
    reason: Option<CloseReason>,
}

struct PingState {
    next_id: u8,
    in_flight: Option<(u8, Instant)>,
}

struct Reliability {
    next_sequence: SequenceNumber,
    sender: ReliableSender,
    acks: AckManager,
    window: SequenceWindow,
    idle_timer: Timer,
    ping_timer: Option<Timer>,
    ping: PingState,
    logout_sequence: Option<SequenceNumber>,
    stats: CircuitStats,
}

impl Reliability {
    fn next_sequence(&mut self) -> SequenceNumber {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1).max(1);
        sequence
    }

    /// Returns true when the acknowledged packet carried the logout reply
    fn acknowledge(&mut self, sequence: SequenceNumber) -> bool {
        self.sender.acknowledge(sequence) && self.logout_sequence == Some(sequence)
    }
}

/// One reliable session with a single remote peer
pub struct Circuit {
    identity: CircuitIdentity,
    binding: RwLock<Option<SessionBinding>>,
    config: CircuitConfig,
    codec: Arc<MessageCodec>,
    sender: Arc<dyn PacketSender>,
    router: MessageRouter,
    lifecycle: RwLock<Lifecycle>,
    reliability: Mutex<Reliability>,
    stop_notices: Mutex<Option<Sender<StopNotice>>>,
    tick_thread: Mutex<Option<TickThread>>,
}

impl Circuit {
    pub fn new(
        identity: CircuitIdentity,
        config: CircuitConfig,
        codec: Arc<MessageCodec>,
        sender: Arc<dyn PacketSender>,
    ) -> Arc<Self> {
        let now = Instant::now();
        let reliability = Reliability {
            next_sequence: 1,
            sender: ReliableSender::new(),
            acks: AckManager::new(),
            window: SequenceWindow::new(config.duplicate_window),
            idle_timer: Timer::new_at(config.idle_timeout, now),
            ping_timer: config
                .ping_interval
                .map(|interval| Timer::new_at(interval, now)),
            ping: PingState {
                next_id: 0,
                in_flight: None,
            },
            logout_sequence: None,
            stats: CircuitStats::default(),
        };

        Arc::new(Self {
            identity,
            binding: RwLock::new(Some(SessionBinding {
                agent_id: identity.agent_id,
                session_id: identity.session_id,
            })),
            config,
            codec,
            sender,
            router: MessageRouter::new(),
            lifecycle: RwLock::new(Lifecycle {
                state: CircuitState::Starting,
                reason: None,
            }),
            reliability: Mutex::new(reliability),
            stop_notices: Mutex::new(None),
            tick_thread: Mutex::new(None),
        })
    }

    // Identity

    pub fn identity(&self) -> &CircuitIdentity {
        &self.identity
    }

    pub fn key(&self) -> CircuitKey {
        self.identity.key()
    }

    pub fn circuit_code(&self) -> u32 {
        self.identity.circuit_code
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.identity.remote_address
    }

    pub fn scene_id(&self) -> Uuid {
        self.identity.scene_id
    }

    /// `None` once the binding has been cleared
    pub fn agent_id(&self) -> Option<Uuid> {
        self.binding.read().map(|binding| binding.agent_id)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.binding.read().map(|binding| binding.session_id)
    }

    /// Forget the agent/session binding. Messages dispatched afterwards fail
    /// to stamp and are dropped.
    pub fn clear_binding(&self) {
        *self.binding.write() = None;
    }

    /// The context stamped onto every dispatched message
    pub fn context(&self) -> Result<CircuitContext, StampError> {
        let binding = *self.binding.read();
        binding
            .map(|binding| CircuitContext {
                circuit_code: self.identity.circuit_code,
                agent_id: binding.agent_id,
                session_id: binding.session_id,
                scene_id: self.identity.scene_id,
            })
            .ok_or(StampError::IdentityCleared {
                circuit_code: self.identity.circuit_code,
            })
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn codec(&self) -> &Arc<MessageCodec> {
        &self.codec
    }

    // Lifecycle

    pub fn state(&self) -> CircuitState {
        self.lifecycle.read().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == CircuitState::Running
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.lifecycle.read().reason
    }

    /// Move from Starting to Running and start the tick thread if one is
    /// configured. Returns false if the circuit was not in Starting.
    pub fn start(self: &Arc<Self>) -> bool {
        {
            let mut lifecycle = self.lifecycle.write();
            if lifecycle.state != CircuitState::Starting {
                return false;
            }
            lifecycle.state = CircuitState::Running;
        }

        let now = Instant::now();
        {
            let mut guard = self.reliability.lock();
            let reliability = &mut *guard;
            reliability.idle_timer.reset_at(now);
            if let Some(timer) = reliability.ping_timer.as_mut() {
                timer.reset_at(now);
            }
        }

        if let Some(interval) = self.config.tick_interval {
            let name = format!("circuit-{}", self.identity.circuit_code);
            match TickThread::spawn(Arc::downgrade(self), interval, name) {
                Ok(tick_thread) => *self.tick_thread.lock() = Some(tick_thread),
                Err(err) => {
                    warn!("failed to spawn tick thread for circuit {}: {}", self.key(), err);
                    self.stop_with(CloseReason::Requested);
                    return false;
                }
            }
        }

        info!("circuit {} started", self.key());
        true
    }

    /// Stop the circuit. Calling this on a stopping or stopped circuit does nothing.
    pub fn stop(&self) -> bool {
        self.stop_with(CloseReason::Requested)
    }

    /// Stop the circuit, recording `reason`. Returns false if it was already
    /// stopping or stopped.
    pub fn stop_with(&self, reason: CloseReason) -> bool {
        {
            let mut lifecycle = self.lifecycle.write();
            if lifecycle.state.is_closing() {
                return false;
            }
            lifecycle.state = CircuitState::Stopping;
            lifecycle.reason = Some(reason);
        }

        self.router.close();
        let tick_thread = self.tick_thread.lock().take();
        if let Some(tick_thread) = tick_thread {
            tick_thread.cancel();
        }
        {
            let mut reliability = self.reliability.lock();
            reliability.sender.clear();
            reliability.acks.clear();
        }

        self.lifecycle.write().state = CircuitState::Stopped;
        info!("circuit {} stopped: {}", self.key(), reason);

        let notices = self.stop_notices.lock().take();
        if let Some(notices) = notices {
            let notice = StopNotice {
                key: self.key(),
                reason,
            };
            if notices.send(notice).is_err() {
                trace!("manager of circuit {} is gone", self.key());
            }
        }
        true
    }

    /// Answer a logout request. `reply` is sent reliably and the circuit stops
    /// once the peer acknowledges it, or once its resends run out.
    pub fn begin_logout(&self, reply: Message) -> Result<SequenceNumber, SendError> {
        let mut reply = reply;
        reply.set_reliable(true);
        self.send(reply, Instant::now(), true)
    }

    /// Finish a logout without waiting for any acknowledgement
    pub fn complete_logout(&self) -> bool {
        self.stop_with(CloseReason::LogoutComplete)
    }

    pub(crate) fn attach_stop_notices(&self, notices: Sender<StopNotice>) {
        *self.stop_notices.lock() = Some(notices);
    }

    pub fn stats(&self) -> CircuitStats {
        let reliability = self.reliability.lock();
        let mut stats = reliability.stats;
        stats.outstanding = reliability.sender.len();
        stats
    }

    // Outbound

    /// Send a message, returning the sequence number of its packet. Pending
    /// acks are appended to the packet.
    pub fn send_message(&self, message: Message) -> Result<SequenceNumber, SendError> {
        self.send_message_at(message, Instant::now())
    }

    pub fn send_message_at(&self, message: Message, now: Instant) -> Result<SequenceNumber, SendError> {
        self.send(message, now, false)
    }

    fn send(&self, message: Message, now: Instant, logout: bool) -> Result<SequenceNumber, SendError> {
        if !self.is_running() {
            return Err(SendError::CircuitNotRunning);
        }

        let (message_type, payload) = self.codec.encode(&message);
        let reliable = message.is_reliable();

        let (sequence, datagram, acks) = {
            let mut reliability = self.reliability.lock();
            if reliable && reliability.sender.len() >= self.config.max_outstanding {
                warn!(
                    "circuit {} has {} unacknowledged packets, refusing {}",
                    self.key(),
                    reliability.sender.len(),
                    message_type
                );
                return Err(SendError::OutstandingFull {
                    limit: self.config.max_outstanding,
                });
            }

            let sequence = reliability.next_sequence();
            let acks = reliability
                .acks
                .take(self.config.max_appended_acks.min(MAX_ACKS_PER_PACKET));
            let datagram = PacketBuilder::new(sequence)
                .reliable(reliable)
                .acks(&acks)
                .build(message_type, &payload);

            if reliable {
                let stored = if acks.is_empty() {
                    datagram.clone()
                } else {
                    PacketBuilder::new(sequence)
                        .reliable(true)
                        .build(message_type, &payload)
                };
                reliability.sender.record(sequence, stored, now);
                if logout {
                    reliability.logout_sequence = Some(sequence);
                }
            }
            reliability.stats.packets_sent += 1;
            reliability.stats.acks_sent += acks.len() as u64;
            (sequence, datagram, acks)
        };

        trace!("circuit {} sending {} as {}", self.key(), message_type, sequence);
        let result = self.sender.send(&self.identity.remote_address, &datagram);
        if result.is_err() && !acks.is_empty() {
            let mut reliability = self.reliability.lock();
            reliability.stats.acks_sent -= acks.len() as u64;
            reliability.acks.restore(acks);
        }
        match result {
            Ok(()) => Ok(sequence),
            Err(_) if reliable => {
                warn!(
                    "circuit {} failed to send packet {}, it will be resent",
                    self.key(),
                    sequence
                );
                Ok(sequence)
            }
            Err(_) => {
                warn!("circuit {} failed to send packet {}", self.key(), sequence);
                Err(SendError::Transport { sequence })
            }
        }
    }

    /// Resend overdue reliable packets, flush pending acks, send a keepalive
    /// ping and stop the circuit if it went idle or a packet ran out of resends
    pub fn tick(&self, now: Instant) {
        if !self.is_running() {
            return;
        }

        let mut outgoing = Vec::new();
        let mut close = None;
        {
            let mut guard = self.reliability.lock();
            let reliability = &mut *guard;

            if reliability.idle_timer.ringing_at(now) {
                close = Some(CloseReason::Timeout);
            } else {
                let plan = reliability.sender.collect_due(
                    now,
                    self.config.resend_timeout,
                    self.config.max_resends,
                );
                if !plan.exhausted.is_empty() {
                    let logout = reliability
                        .logout_sequence
                        .is_some_and(|sequence| plan.exhausted.contains(&sequence));
                    close = Some(if logout {
                        CloseReason::LogoutComplete
                    } else {
                        CloseReason::RetransmitExhausted
                    });
                } else {
                    reliability.stats.packets_resent += plan.resend.len() as u64;
                    outgoing.extend(plan.resend.into_iter().map(|(_, datagram)| datagram));

                    outgoing.extend(self.ack_packets(reliability));

                    let ping_due = reliability
                        .ping_timer
                        .as_ref()
                        .is_some_and(|timer| timer.ringing_at(now));
                    if ping_due {
                        if let Some(timer) = reliability.ping_timer.as_mut() {
                            timer.reset_at(now);
                        }
                        let ping_id = reliability.ping.next_id;
                        reliability.ping.next_id = ping_id.wrapping_add(1);
                        reliability.ping.in_flight = Some((ping_id, now));
                        let ping = StartPingCheck {
                            ping_id,
                            oldest_unacked: reliability.sender.oldest().unwrap_or(0),
                        };
                        reliability.stats.packets_sent += 1;
                        let sequence = reliability.next_sequence();
                        let (message_type, payload) = self.codec.encode(&Message::new(ping));
                        outgoing.push(PacketBuilder::new(sequence).build(message_type, &payload));
                    }
                }
            }
        }

        for datagram in outgoing {
            if self.sender.send(&self.identity.remote_address, &datagram).is_err() {
                debug!("circuit {} failed to send during tick", self.key());
            }
        }

        if let Some(reason) = close {
            warn!("circuit {} closing: {}", self.key(), reason);
            self.stop_with(reason);
        }
    }

    /// Drain pending acks into PacketAck datagrams
    fn ack_packets(&self, reliability: &mut Reliability) -> Vec<Vec<u8>> {
        let mut outgoing = Vec::new();
        while !reliability.acks.is_empty() {
            let packets = reliability.acks.take(MAX_ACKS_PER_PACKET);
            reliability.stats.acks_sent += packets.len() as u64;
            reliability.stats.packets_sent += 1;
            let sequence = reliability.next_sequence();
            let (message_type, payload) = self.codec.encode(&Message::new(PacketAck { packets }));
            outgoing.push(PacketBuilder::new(sequence).build(message_type, &payload));
        }
        outgoing
    }

    /// Acknowledge everything received so far, then stop with `LogoutComplete`
    fn finish_logout(&self) {
        let outgoing = self.ack_packets(&mut self.reliability.lock());
        for datagram in outgoing {
            if self.sender.send(&self.identity.remote_address, &datagram).is_err() {
                debug!("circuit {} failed to flush acks before logout", self.key());
            }
        }
        self.complete_logout();
    }

    // Inbound

    pub fn receive_datagram(&self, datagram: &[u8]) -> InboundOutcome {
        self.receive_datagram_at(datagram, Instant::now())
    }

    pub fn receive_datagram_at(&self, datagram: &[u8], now: Instant) -> InboundOutcome {
        match Packet::parse(datagram, self.config.max_body_size) {
            Ok(packet) => self.receive_packet_at(&packet, now),
            Err(err) => {
                debug!("circuit {} dropping malformed datagram: {}", self.key(), err);
                InboundOutcome::Malformed(err)
            }
        }
    }

    /// Handle one parsed packet: record activity, consume appended acks,
    /// suppress duplicates, handle transport control messages and dispatch
    /// everything else to the router
    pub fn receive_packet_at(&self, packet: &Packet, now: Instant) -> InboundOutcome {
        if !self.is_running() {
            return InboundOutcome::NotRunning;
        }

        let sequence = packet.sequence();
        let mut logout_acked = false;
        let duplicate = {
            let mut reliability = self.reliability.lock();
            reliability.idle_timer.reset_at(now);
            reliability.stats.packets_received += 1;
            for ack in packet.acks() {
                logout_acked |= reliability.acknowledge(*ack);
            }
            if packet.is_reliable() {
                reliability.acks.push(sequence);
            }
            let duplicate = reliability.window.try_insert(sequence).is_err();
            if duplicate {
                reliability.stats.duplicates_received += 1;
            }
            duplicate
        };

        if logout_acked {
            self.finish_logout();
            return InboundOutcome::NotRunning;
        }
        if duplicate {
            debug!("circuit {} ignoring duplicate packet {}", self.key(), sequence);
            return InboundOutcome::Duplicate { sequence };
        }

        let message = match self.codec.decode_packet(packet) {
            Ok(message) => message,
            Err(err) => {
                debug!("circuit {} dropping packet {}: {}", self.key(), sequence, err);
                return InboundOutcome::Undecodable(err);
            }
        };

        match message.payload() {
            MessagePayload::PacketAck(acks) => {
                let mut logout_acked = false;
                {
                    let mut reliability = self.reliability.lock();
                    for ack in &acks.packets {
                        logout_acked |= reliability.acknowledge(*ack);
                    }
                }
                if logout_acked {
                    self.finish_logout();
                }
                return InboundOutcome::Control(MessageType::PacketAck);
            }
            MessagePayload::StartPingCheck(ping) => {
                let reply = Message::new(CompletePingCheck {
                    ping_id: ping.ping_id,
                });
                if let Err(err) = self.send_message_at(reply, now) {
                    debug!("circuit {} could not answer ping: {}", self.key(), err);
                }
                return InboundOutcome::Control(MessageType::StartPingCheck);
            }
            MessagePayload::CompletePingCheck(pong) => {
                let mut reliability = self.reliability.lock();
                if let Some((ping_id, sent)) = reliability.ping.in_flight {
                    if ping_id == pong.ping_id {
                        reliability.stats.last_rtt = Some(now.saturating_duration_since(sent));
                        reliability.ping.in_flight = None;
                    }
                }
                return InboundOutcome::Control(MessageType::CompletePingCheck);
            }
            _ => {}
        }

        // no new dispatch once stopping has begun
        if !self.is_running() {
            return InboundOutcome::NotRunning;
        }
        InboundOutcome::Dispatched(self.router.dispatch(message, self.context()))
    }
}
