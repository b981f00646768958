//! Protocol level logout: the reply is sent reliably and the circuit stops
//! once the peer acknowledges it, or once the reply runs out of resends.

use std::{
    net::SocketAddr,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use simcircuit_server::{
    Circuit, CircuitEvent, CircuitManager, CircuitState, CloseReason, DispatchOutcome,
    DropReason, InboundOutcome, ManagerConfig, SendError,
};
use simcircuit_shared::{LogoutReply, Message, MessageCodec, MessageType, TeleportStart};
use simcircuit_test::{init_logger, manual_config, test_identity, LocalSocketPair, RemotePeer};

fn logout_handler(circuit: Weak<Circuit>) -> impl Fn(Message) + Send + Sync + 'static {
    move |message: Message| {
        let Some(circuit) = circuit.upgrade() else {
            return;
        };
        let Some(context) = message.context() else {
            return;
        };
        let reply = LogoutReply {
            agent_id: context.agent_id,
            session_id: context.session_id,
            item_ids: Vec::new(),
        };
        circuit.clear_binding();
        circuit.begin_logout(Message::new(reply)).unwrap();
    }
}

struct LogoutFixture {
    pair: LocalSocketPair,
    manager: CircuitManager,
    circuit: Arc<Circuit>,
    peer: RemotePeer,
    address: SocketAddr,
}

fn fixture() -> LogoutFixture {
    init_logger();
    let mut pair = LocalSocketPair::new();
    let config = ManagerConfig {
        bind_address: pair.server_addr(),
        circuit: manual_config(),
        ..ManagerConfig::default()
    };
    let manager = CircuitManager::new(config, Arc::new(MessageCodec::new()), pair.take_server_socket());

    let address = LocalSocketPair::client_addr();
    let identity = test_identity(31, address);
    let circuit = manager.create_circuit(identity);
    circuit
        .router()
        .message_routing()
        .insert(MessageType::LogoutRequest, logout_handler(Arc::downgrade(&circuit)));
    manager.add_circuit(circuit.clone()).unwrap();
    circuit.start();

    LogoutFixture {
        pair,
        manager,
        circuit,
        peer: RemotePeer::new(&identity),
        address,
    }
}

#[test]
fn acknowledged_logout_reply_completes_the_logout() {
    let LogoutFixture {
        pair,
        manager,
        circuit,
        mut peer,
        address,
    } = fixture();

    let request = peer.logout_request();
    manager.process_datagram(address, &request).unwrap();

    let sent = pair.drain_from_server();
    assert_eq!(sent.len(), 1);
    let reply = peer.decode(&sent[0].1);
    assert_eq!(reply.message_type(), MessageType::LogoutReply);
    assert!(reply.is_reliable());
    // the request was reliable, its ack rides on the reply
    assert_eq!(reply.appended_acks(), &[1]);
    assert!(circuit.is_running());

    let ack = peer.ack(&[reply.sequence().unwrap()]);
    assert_eq!(
        manager.process_datagram(address, &ack),
        Some(InboundOutcome::Control(MessageType::PacketAck))
    );
    assert_eq!(circuit.state(), CircuitState::Stopped);
    assert_eq!(circuit.close_reason(), Some(CloseReason::LogoutComplete));

    assert_eq!(manager.maintain(), 1);
    assert!(manager.is_empty());
    assert!(manager.events().contains(&CircuitEvent::Removed {
        key: circuit.key(),
        reason: CloseReason::LogoutComplete
    }));
}

#[test]
fn logout_reply_acked_in_a_trailer_completes_the_logout() {
    let LogoutFixture {
        pair,
        manager,
        circuit,
        mut peer,
        address,
    } = fixture();

    manager.process_datagram(address, &peer.logout_request()).unwrap();
    let (_, datagram) = pair.drain_from_server().remove(0);
    let reply_sequence = peer.parse(&datagram).sequence();

    let sequence = peer.next_sequence();
    let carrier = peer.packet_with(
        sequence,
        &Message::reliable(TeleportStart { teleport_flags: 0 }),
        &[reply_sequence],
    );
    assert_eq!(
        manager.process_datagram(address, &carrier),
        Some(InboundOutcome::NotRunning)
    );
    assert_eq!(circuit.close_reason(), Some(CloseReason::LogoutComplete));

    // the carrier is still acknowledged before the circuit stops
    let sent = pair.drain_from_server();
    assert_eq!(sent.len(), 1);
    assert_eq!(peer.acks_in(&sent[0].1), vec![sequence]);
}

#[test]
fn unacknowledged_logout_reply_still_completes_the_logout() {
    let LogoutFixture {
        pair,
        manager,
        circuit,
        mut peer,
        address,
    } = fixture();

    manager.process_datagram(address, &peer.logout_request()).unwrap();
    let start = Instant::now();

    for round in 1..=3u64 {
        circuit.tick(start + Duration::from_secs(round));
        assert!(circuit.is_running());
    }
    // original reply plus three resends
    assert_eq!(pair.drain_from_server().len(), 4);

    circuit.tick(start + Duration::from_secs(4));
    assert_eq!(circuit.close_reason(), Some(CloseReason::LogoutComplete));
    assert_eq!(manager.maintain(), 1);
}

#[test]
fn messages_after_the_binding_is_cleared_are_dropped() {
    let LogoutFixture {
        manager,
        circuit,
        mut peer,
        address,
        ..
    } = fixture();
    circuit.router().enable_receive_queue(true);

    manager.process_datagram(address, &peer.logout_request()).unwrap();
    assert_eq!(circuit.agent_id(), None);

    let late = peer.packet(&Message::new(TeleportStart { teleport_flags: 0 }));
    assert_eq!(
        manager.process_datagram(address, &late),
        Some(InboundOutcome::Dispatched(DispatchOutcome::Dropped(
            DropReason::StampFailed
        )))
    );
    assert!(circuit.router().receive_queue().is_empty());
}

#[test]
fn logout_needs_a_running_circuit() {
    let LogoutFixture {
        manager: _manager,
        circuit,
        ..
    } = fixture();
    circuit.stop();
    let reply = LogoutReply {
        agent_id: circuit.identity().agent_id,
        session_id: circuit.identity().session_id,
        item_ids: Vec::new(),
    };
    assert_eq!(
        circuit.begin_logout(Message::new(reply)),
        Err(SendError::CircuitNotRunning)
    );
    assert!(!circuit.complete_logout());
    assert_eq!(circuit.close_reason(), Some(CloseReason::Requested));
}
