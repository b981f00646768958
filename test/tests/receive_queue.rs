//! Fallback receive queue: disabled by default, ordered, with blocking,
//! timed and non-blocking consumers, closed when the circuit stops.

use std::{thread, time::Duration};

use simcircuit_server::{DispatchOutcome, DropReason, InboundOutcome, ReceiveError};
use simcircuit_shared::{Message, MessageType, TeleportStart};
use simcircuit_test::{manual_config, started_circuit};

fn teleport(flags: u32) -> Message {
    Message::new(TeleportStart {
        teleport_flags: flags,
    })
}

#[test]
fn disabled_queue_is_a_usage_error() {
    let (circuit, _, mut peer) = started_circuit(manual_config());
    let router = circuit.router();
    assert!(!router.receive_queue().is_enabled());

    assert_eq!(router.receive().unwrap_err(), ReceiveError::QueueDisabled);
    assert_eq!(router.receive_timeout_ms(10).unwrap_err(), ReceiveError::QueueDisabled);
    assert_eq!(router.try_receive().unwrap_err(), ReceiveError::QueueDisabled);

    // unclaimed messages are dropped rather than queued
    assert_eq!(
        circuit.receive_datagram(&peer.packet(&teleport(0))),
        InboundOutcome::Dispatched(DispatchOutcome::Dropped(DropReason::Unrouted))
    );
}

#[test]
fn unclaimed_messages_are_queued_in_arrival_order() {
    let (circuit, _, mut peer) = started_circuit(manual_config());
    let router = circuit.router();
    router.enable_receive_queue(true);

    for flags in 0..3 {
        assert_eq!(
            circuit.receive_datagram(&peer.packet(&teleport(flags))),
            InboundOutcome::Dispatched(DispatchOutcome::Queued)
        );
    }
    assert_eq!(router.receive_queue().len(), 3);

    for flags in 0..3 {
        let message = router.receive_timeout_ms(100).unwrap();
        assert_eq!(message.message_type(), MessageType::TeleportStart);
        assert_eq!(message.sequence(), Some(flags + 1));
        assert_eq!(message.context().unwrap().scene_id, circuit.scene_id());
    }
    assert_eq!(router.try_receive(), Ok(None));
}

#[test]
fn empty_queue_times_out() {
    let (circuit, _, _) = started_circuit(manual_config());
    circuit.router().enable_receive_queue(true);
    assert_eq!(
        circuit.router().receive_timeout(Duration::from_millis(20)),
        Err(ReceiveError::Timeout)
    );
}

#[test]
fn blocked_consumer_receives_a_message_from_another_thread() {
    let (circuit, _, mut peer) = started_circuit(manual_config());
    circuit.router().enable_receive_queue(true);

    let consumer = {
        let circuit = circuit.clone();
        thread::spawn(move || circuit.router().receive())
    };
    thread::sleep(Duration::from_millis(20));
    circuit.receive_datagram(&peer.packet(&teleport(7)));

    let message = consumer.join().unwrap().unwrap();
    assert_eq!(message.payload(), teleport(7).payload());
}

#[test]
fn stopping_the_circuit_closes_the_queue_after_draining() {
    let (circuit, _, mut peer) = started_circuit(manual_config());
    circuit.router().enable_receive_queue(true);
    circuit.receive_datagram(&peer.packet(&teleport(1)));

    circuit.stop();
    assert!(circuit.router().receive_queue().is_closed());

    assert!(circuit.router().receive().is_ok());
    assert_eq!(circuit.router().receive().unwrap_err(), ReceiveError::Closed);
    assert_eq!(
        circuit.router().receive_timeout_ms(10).unwrap_err(),
        ReceiveError::Closed
    );
}

#[test]
fn stopping_wakes_a_blocked_consumer() {
    let (circuit, _, _) = started_circuit(manual_config());
    circuit.router().enable_receive_queue(true);

    let consumer = {
        let circuit = circuit.clone();
        thread::spawn(move || circuit.router().receive())
    };
    thread::sleep(Duration::from_millis(20));
    circuit.stop();

    assert_eq!(consumer.join().unwrap().unwrap_err(), ReceiveError::Closed);
}
