use std::{
    net::SocketAddr,
    sync::{Arc, Weak},
    thread,
};

use log::{info, warn};

use simcircuit_server::{
    shared::{
        GenericMessage, GridInstantMessageDialog, LogoutReply, Message, MessageCodec, MessageType,
        Uuid,
    },
    Circuit, CircuitEvent, CircuitIdentity, CircuitManager, CircuitServerError, ManagerConfig,
    ReceiveError,
};

// The demo admits one viewer, as a login service would have arranged
const VIEWER_PORT: u16 = 9001;
const VIEWER_CIRCUIT_CODE: u32 = 1;

pub struct App {
    manager: CircuitManager,
}

impl App {
    pub fn new(bind_address: SocketAddr) -> Result<Self, CircuitServerError> {
        let config = ManagerConfig {
            bind_address,
            ..ManagerConfig::default()
        };
        let manager = CircuitManager::bind(config, Arc::new(MessageCodec::new()))?;

        let identity = CircuitIdentity {
            circuit_code: VIEWER_CIRCUIT_CODE,
            remote_address: SocketAddr::from(([127, 0, 0, 1], VIEWER_PORT)),
            agent_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            scene_id: Uuid::new_v4(),
        };
        info!(
            "expecting agent {} with circuit code {} from {}",
            identity.agent_id, identity.circuit_code, identity.remote_address
        );

        let circuit = manager.create_circuit(identity);
        register_handlers(&circuit);
        spawn_queue_consumer(&circuit);

        manager.add_circuit(circuit.clone())?;
        circuit.start();
        manager.listen()?;
        info!("Simcircuit Server listening on {}", manager.local_addr());

        Ok(Self { manager })
    }

    /// Block until the demo circuit is gone
    pub fn run(&self) {
        let events = self.manager.event_receiver();
        while let Ok(event) = events.recv() {
            match event {
                CircuitEvent::Added(key) => info!("circuit {} admitted", key),
                CircuitEvent::Removed { key, reason } => {
                    info!("circuit {} removed: {}", key, reason);
                    if self.manager.is_empty() {
                        break;
                    }
                }
            }
        }
        self.manager.shutdown();
        info!("Basic Simcircuit Server Demo finished");
    }
}

fn register_handlers(circuit: &Arc<Circuit>) {
    let router = circuit.router();

    let weak = Arc::downgrade(circuit);
    router
        .generic_message_routing()
        .insert("echo".to_string(), move |message: Message| {
            let Some(request) = message.as_generic_message() else {
                return;
            };
            info!("Server recv <- echo {:?}", request.params);
            let reply = GenericMessage::new(request.agent_id, request.session_id, "echo")
                .with_params(request.params.clone());
            send(&weak, Message::reliable(reply));
        });

    router.im_message_routing().insert(
        GridInstantMessageDialog::MessageFromAgent,
        |message: Message| {
            if let Some(im) = message.as_instant_message() {
                info!("Server recv <- instant message to {}: {}", im.to_agent_id, im.message);
            }
        },
    );

    let weak = Arc::downgrade(circuit);
    router
        .message_routing()
        .insert(MessageType::LogoutRequest, move |message: Message| {
            let (Some(circuit), Some(context)) = (weak.upgrade(), message.context()) else {
                return;
            };
            info!("agent {} logging out", context.agent_id);
            let reply = LogoutReply {
                agent_id: context.agent_id,
                session_id: context.session_id,
                item_ids: Vec::new(),
            };
            circuit.clear_binding();
            if let Err(err) = circuit.begin_logout(Message::new(reply)) {
                warn!("could not answer logout: {}", err);
                circuit.complete_logout();
            }
        });
}

// Logs whatever no handler claimed until the circuit stops
fn spawn_queue_consumer(circuit: &Arc<Circuit>) {
    circuit.router().enable_receive_queue(true);
    let weak = Arc::downgrade(circuit);
    let spawned = thread::Builder::new()
        .name("demo-receive-queue".to_string())
        .spawn(move || loop {
            let Some(circuit) = weak.upgrade() else {
                return;
            };
            match circuit.router().receive_timeout_ms(1000) {
                Ok(message) => info!("Server recv <- unclaimed {}", message.message_type()),
                Err(ReceiveError::Timeout) => {}
                Err(_) => return,
            }
        });
    if let Err(err) = spawned {
        warn!("receive queue consumer not started: {}", err);
    }
}

fn send(circuit: &Weak<Circuit>, message: Message) {
    let Some(circuit) = circuit.upgrade() else {
        return;
    };
    let message_type = message.message_type();
    if let Err(err) = circuit.send_message(message) {
        warn!("Server send -> {} failed: {}", message_type, err);
    }
}
