//! Circuit manager: demultiplexing by remote address, UseCircuitCode checks,
//! the receive loop over an in-memory socket and shutdown.

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use simcircuit_server::{
    CircuitEvent, CircuitManager, CloseReason, DispatchOutcome, InboundOutcome, ManagerConfig,
    ManagerError, Route,
};
use simcircuit_shared::{GenericMessage, Message, MessageCodec, MessageType, TeleportStart};
use simcircuit_test::{
    init_logger, manual_config, test_identity, wait_until, HandlerProbe, LocalSocketPair,
    RemotePeer,
};

const WAIT: Duration = Duration::from_secs(2);

fn manual_manager(pair: &mut LocalSocketPair) -> CircuitManager {
    let config = ManagerConfig {
        bind_address: pair.server_addr(),
        circuit: manual_config(),
        ..ManagerConfig::default()
    };
    CircuitManager::new(config, Arc::new(MessageCodec::new()), pair.take_server_socket())
}

fn address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[test]
fn datagram_for_unregistered_circuit_code_is_discarded() {
    init_logger();
    let mut pair = LocalSocketPair::new();
    let manager = manual_manager(&mut pair);

    let identity = test_identity(1, address(14001));
    let circuit = manager.create_circuit(identity);
    manager.add_circuit(circuit.clone()).unwrap();
    circuit.start();
    let probe = HandlerProbe::new();
    circuit
        .router()
        .message_routing()
        .insert(MessageType::UseCircuitCode, probe.handler());

    let stranger = test_identity(77, address(14077));
    let mut stranger_peer = RemotePeer::new(&stranger);
    let before = manager.len();

    let outcome = manager.process_datagram(stranger.remote_address, &stranger_peer.claim_circuit());
    assert!(outcome.is_none());
    let datagram = stranger_peer.packet(&Message::new(TeleportStart { teleport_flags: 0 }));
    assert!(manager
        .process_datagram(stranger.remote_address, &datagram)
        .is_none());

    assert_eq!(manager.len(), before);
    assert_eq!(manager.dropped_datagrams(), 2);
    assert_eq!(probe.count(), 0);
    assert!(circuit.is_running());
}

#[test]
fn use_circuit_code_must_match_the_bound_circuit() {
    let mut pair = LocalSocketPair::new();
    let manager = manual_manager(&mut pair);

    let identity = test_identity(1, address(14001));
    let circuit = manager.create_circuit(identity);
    manager.add_circuit(circuit.clone()).unwrap();
    circuit.start();
    let probe = HandlerProbe::new();
    circuit
        .router()
        .message_routing()
        .insert(MessageType::UseCircuitCode, probe.handler());

    let mut peer = RemotePeer::new(&identity);
    let forged = peer.use_circuit_code(77);
    assert!(manager.process_datagram(identity.remote_address, &forged).is_none());
    assert_eq!(manager.dropped_datagrams(), 1);
    assert_eq!(probe.count(), 0);

    let claim = peer.claim_circuit();
    assert_eq!(
        manager.process_datagram(identity.remote_address, &claim),
        Some(InboundOutcome::Dispatched(DispatchOutcome::Handled(
            Route::Message(MessageType::UseCircuitCode)
        )))
    );
    assert_eq!(probe.count(), 1);
}

#[test]
fn datagrams_reach_only_the_circuit_bound_to_their_source() {
    let mut pair = LocalSocketPair::new();
    let manager = manual_manager(&mut pair);

    let first_identity = test_identity(1, address(14001));
    let second_identity = test_identity(2, address(14002));
    let first = manager.create_circuit(first_identity);
    let second = manager.create_circuit(second_identity);
    manager.add_circuit(first.clone()).unwrap();
    manager.add_circuit(second.clone()).unwrap();
    first.start();
    second.start();

    let first_probe = HandlerProbe::new();
    let second_probe = HandlerProbe::new();
    first
        .router()
        .message_routing()
        .insert(MessageType::TeleportStart, first_probe.handler());
    second
        .router()
        .message_routing()
        .insert(MessageType::TeleportStart, second_probe.handler());

    let mut peer = RemotePeer::new(&second_identity);
    for _ in 0..3 {
        let datagram = peer.packet(&Message::new(TeleportStart { teleport_flags: 0 }));
        manager.process_datagram(second_identity.remote_address, &datagram);
    }

    assert_eq!(first_probe.count(), 0);
    assert_eq!(second_probe.count(), 3);
    let context = second_probe.last().unwrap().context().copied().unwrap();
    assert_eq!(context.circuit_code, 2);
    assert_eq!(context.agent_id, second_identity.agent_id);
}

#[test]
fn removed_circuit_no_longer_receives() {
    let mut pair = LocalSocketPair::new();
    let manager = manual_manager(&mut pair);
    let identity = test_identity(3, address(14003));
    let circuit = manager.create_circuit(identity);
    manager.add_circuit(circuit.clone()).unwrap();
    circuit.start();

    let removed = manager.remove_circuit(&identity.key()).unwrap();
    assert!(Arc::ptr_eq(&removed, &circuit));
    assert_eq!(circuit.close_reason(), Some(CloseReason::Requested));

    let mut peer = RemotePeer::new(&identity);
    let datagram = peer.packet(&Message::new(TeleportStart { teleport_flags: 0 }));
    assert!(manager.process_datagram(identity.remote_address, &datagram).is_none());

    // the address is free again
    let replacement = manager.create_circuit(test_identity(4, identity.remote_address));
    assert!(manager.add_circuit(replacement).is_ok());
}

#[test]
fn listening_manager_serves_a_remote_peer() {
    init_logger();
    let mut pair = LocalSocketPair::new();
    let mut config = ManagerConfig {
        bind_address: pair.server_addr(),
        receive_timeout: Duration::from_millis(10),
        ..ManagerConfig::default()
    };
    config.circuit.tick_interval = Some(Duration::from_millis(10));
    config.circuit.ping_interval = None;
    let manager = CircuitManager::new(config, Arc::new(MessageCodec::new()), pair.take_server_socket());

    let client_addr = LocalSocketPair::client_addr();
    let identity = test_identity(9, client_addr);
    let circuit = manager.create_circuit(identity);

    let weak = Arc::downgrade(&circuit);
    circuit
        .router()
        .generic_message_routing()
        .insert("echo".to_string(), move |message: Message| {
            let Some(circuit) = weak.upgrade() else {
                return;
            };
            let request = message.as_generic_message().unwrap();
            let reply = GenericMessage::new(request.agent_id, request.session_id, "echo-reply")
                .with_params(request.params.clone());
            circuit.send_message(Message::reliable(reply)).unwrap();
        });

    manager.add_circuit(circuit.clone()).unwrap();
    assert!(circuit.start());
    manager.listen().unwrap();
    assert!(manager.is_listening());

    let mut peer = RemotePeer::new(&identity);
    let request = Message::reliable(peer.generic("echo").with_params(vec!["ping".to_string()]));
    let request_sequence = peer.next_sequence();
    pair.send_to_server(client_addr, &peer.packet_with(request_sequence, &request, &[]));

    let deadline = Instant::now() + WAIT;
    let mut reply = None;
    let mut request_acked = false;
    while (reply.is_none() || !request_acked) && Instant::now() < deadline {
        let Some((destination, datagram)) = pair.receive_from_server(Duration::from_millis(20)) else {
            continue;
        };
        assert_eq!(destination, client_addr);
        request_acked |= peer.acks_in(&datagram).contains(&request_sequence);
        let message = peer.decode(&datagram);
        if let Some(generic) = message.as_generic_message() {
            reply = Some((message.sequence().unwrap(), generic.clone()));
        }
    }
    assert!(request_acked);
    let (reply_sequence, reply) = reply.expect("no reply from the server");
    assert_eq!(reply.method, "echo-reply");
    assert_eq!(reply.params, vec!["ping".to_string()]);
    assert_eq!(circuit.stats().outstanding, 1);

    pair.send_to_server(client_addr, &peer.ack(&[reply_sequence]));
    assert!(wait_until(WAIT, || circuit.stats().outstanding == 0));

    manager.shutdown();
    assert!(!manager.is_listening());
    assert_eq!(circuit.close_reason(), Some(CloseReason::ManagerShutdown));
    assert_eq!(
        manager.events(),
        vec![
            CircuitEvent::Added(identity.key()),
            CircuitEvent::Removed {
                key: identity.key(),
                reason: CloseReason::ManagerShutdown
            }
        ]
    );
}

#[test]
fn listening_manager_drops_circuits_that_time_out() {
    let mut pair = LocalSocketPair::new();
    let mut config = ManagerConfig {
        bind_address: pair.server_addr(),
        receive_timeout: Duration::from_millis(10),
        ..ManagerConfig::default()
    };
    config.circuit.tick_interval = Some(Duration::from_millis(5));
    config.circuit.ping_interval = None;
    config.circuit.idle_timeout = Duration::from_millis(50);
    let manager = CircuitManager::new(config, Arc::new(MessageCodec::new()), pair.take_server_socket());
    let events = manager.event_receiver();

    let identity = test_identity(5, address(14005));
    let circuit = manager.create_circuit(identity);
    manager.add_circuit(circuit.clone()).unwrap();
    circuit.start();
    manager.listen().unwrap();

    assert_eq!(events.recv_timeout(WAIT), Ok(CircuitEvent::Added(identity.key())));
    assert_eq!(
        events.recv_timeout(WAIT),
        Ok(CircuitEvent::Removed {
            key: identity.key(),
            reason: CloseReason::Timeout
        })
    );
    assert!(manager.is_empty());
}

#[test]
fn udp_socket_round_trip() {
    init_logger();
    let mut config = ManagerConfig {
        bind_address: address(0),
        receive_timeout: Duration::from_millis(10),
        ..ManagerConfig::default()
    };
    config.circuit.tick_interval = Some(Duration::from_millis(10));
    config.circuit.ping_interval = None;
    let manager = CircuitManager::bind(config, Arc::new(MessageCodec::new())).unwrap();
    let server_addr = manager.local_addr();
    assert_ne!(server_addr.port(), 0);

    let client = std::net::UdpSocket::bind(address(0)).unwrap();
    client.set_read_timeout(Some(WAIT)).unwrap();
    let identity = test_identity(21, client.local_addr().unwrap());
    let circuit = manager.create_circuit(identity);
    let probe = HandlerProbe::new();
    circuit
        .router()
        .message_routing()
        .insert(MessageType::TeleportStart, probe.handler());
    manager.add_circuit(circuit.clone()).unwrap();
    circuit.start();
    manager.listen().unwrap();

    let mut peer = RemotePeer::new(&identity);
    let datagram = peer.packet(&Message::reliable(TeleportStart { teleport_flags: 3 }));
    client.send_to(&datagram, server_addr).unwrap();

    assert!(probe.wait_for(1, WAIT));
    let mut buffer = [0u8; 1500];
    let (length, from) = client.recv_from(&mut buffer).unwrap();
    assert_eq!(from.port(), server_addr.port());
    assert_eq!(peer.acks_in(&buffer[..length]), vec![1]);
}

#[test]
fn bind_failure_is_reported() {
    let taken = std::net::UdpSocket::bind(address(0)).unwrap();
    let config = ManagerConfig {
        bind_address: taken.local_addr().unwrap(),
        ..ManagerConfig::default()
    };
    let result = CircuitManager::bind(config, Arc::new(MessageCodec::new()));
    assert!(matches!(result, Err(ManagerError::Bind { .. })));
}

#[test]
fn shutdown_is_idempotent_and_final() {
    let mut pair = LocalSocketPair::new();
    let manager = manual_manager(&mut pair);
    let first = manager.create_circuit(test_identity(1, address(14001)));
    let second = manager.create_circuit(test_identity(2, address(14002)));
    manager.add_circuit(first.clone()).unwrap();
    manager.add_circuit(second.clone()).unwrap();
    first.start();
    manager.listen().unwrap();

    manager.shutdown();
    manager.shutdown();

    assert!(manager.is_shut_down());
    assert!(manager.is_empty());
    assert_eq!(first.close_reason(), Some(CloseReason::ManagerShutdown));
    assert_eq!(second.close_reason(), Some(CloseReason::ManagerShutdown));
    assert!(matches!(manager.listen(), Err(ManagerError::ShutDown)));

    let removals = manager
        .events()
        .into_iter()
        .filter(|event| matches!(event, CircuitEvent::Removed { .. }))
        .count();
    assert_eq!(removals, 2);
}
