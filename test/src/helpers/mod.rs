mod handler_probe;
mod recording_sender;
mod remote_peer;

pub use handler_probe::HandlerProbe;
pub use recording_sender::RecordingSender;
pub use remote_peer::RemotePeer;

use std::{
    net::SocketAddr,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use uuid::Uuid;

use simcircuit_server::{Circuit, CircuitConfig, CircuitIdentity};
use simcircuit_shared::{CircuitCode, MessageCodec};

/// Route `log` output through the test harness. Safe to call from every test.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_identity(circuit_code: CircuitCode, address: SocketAddr) -> CircuitIdentity {
    CircuitIdentity {
        circuit_code,
        remote_address: address,
        agent_id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
        scene_id: Uuid::new_v4(),
    }
}

/// Circuit config with no tick thread and no keepalive, so tests drive time
/// through `Circuit::tick`
pub fn manual_config() -> CircuitConfig {
    CircuitConfig {
        tick_interval: None,
        ping_interval: None,
        ..CircuitConfig::default()
    }
}

/// A started circuit writing into a `RecordingSender`, and the peer on the
/// other end of it
pub fn started_circuit(config: CircuitConfig) -> (Arc<Circuit>, Arc<RecordingSender>, RemotePeer) {
    let identity = test_identity(1234, "127.0.0.1:13000".parse().unwrap());
    let sender = RecordingSender::new();
    let circuit = Circuit::new(identity, config, Arc::new(MessageCodec::new()), sender.clone());
    assert!(circuit.start());
    (circuit, sender, RemotePeer::new(&identity))
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
