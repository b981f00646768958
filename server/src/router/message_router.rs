use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    time::Duration,
};

use log::{debug, trace, warn};

use simcircuit_shared::{
    CircuitContext, GridInstantMessageDialog, Message, MessageCodec, MessagePayload, MessageType,
    StampError,
};

use crate::{
    error::ReceiveError,
    router::{
        receive_queue::ReceiveQueue,
        routing_table::{Handler, RoutingTable},
    },
};

/// Which table the handler of a dispatched message came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Message(MessageType),
    Generic(String),
    Godlike(String),
    InstantMessage(GridInstantMessageDialog),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The body could not be decoded, or no decoder exists for its type
    Undecodable,
    /// Context could not be stamped onto the message
    StampFailed,
    /// An instant message claimed an agent or session other than the circuit's
    IdentityMismatch,
    /// No handler matched and the receive queue is disabled or closed
    Unrouted,
}

/// Exactly one of these happens to every message handed to the router
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled(Route),
    Queued,
    Dropped(DropReason),
}

/// Per-circuit dispatch of decoded messages to registered handlers
pub struct MessageRouter {
    message_routing: RoutingTable<MessageType>,
    generic_message_routing: RoutingTable<String>,
    godlike_message_routing: RoutingTable<String>,
    im_message_routing: RoutingTable<GridInstantMessageDialog>,
    receive_queue: ReceiveQueue,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self {
            message_routing: RoutingTable::new(),
            generic_message_routing: RoutingTable::new(),
            godlike_message_routing: RoutingTable::new(),
            im_message_routing: RoutingTable::new(),
            receive_queue: ReceiveQueue::new(),
        }
    }

    // Routing tables

    pub fn message_routing(&self) -> &RoutingTable<MessageType> {
        &self.message_routing
    }

    pub fn generic_message_routing(&self) -> &RoutingTable<String> {
        &self.generic_message_routing
    }

    pub fn godlike_message_routing(&self) -> &RoutingTable<String> {
        &self.godlike_message_routing
    }

    pub fn im_message_routing(&self) -> &RoutingTable<GridInstantMessageDialog> {
        &self.im_message_routing
    }

    // Receive queue

    pub fn receive_queue(&self) -> &ReceiveQueue {
        &self.receive_queue
    }

    pub fn enable_receive_queue(&self, enabled: bool) {
        self.receive_queue.enable(enabled);
    }

    pub fn receive(&self) -> Result<Message, ReceiveError> {
        self.receive_queue.receive()
    }

    pub fn receive_timeout(&self, timeout: Duration) -> Result<Message, ReceiveError> {
        self.receive_queue.receive_timeout(timeout)
    }

    pub fn receive_timeout_ms(&self, timeout_ms: u64) -> Result<Message, ReceiveError> {
        self.receive_timeout(Duration::from_millis(timeout_ms))
    }

    pub fn try_receive(&self) -> Result<Option<Message>, ReceiveError> {
        self.receive_queue.try_receive()
    }

    pub(crate) fn close(&self) {
        self.receive_queue.close();
    }

    // Dispatch

    /// Decode a message body and dispatch it. Bodies which cannot be decoded
    /// are dropped.
    pub fn dispatch_body(
        &self,
        codec: &MessageCodec,
        message_type: MessageType,
        body: &[u8],
        context: Result<CircuitContext, StampError>,
    ) -> DispatchOutcome {
        match codec.decode(message_type, body) {
            Ok(message) => self.dispatch(message, context),
            Err(err) => {
                debug!("dropping undecodable {}: {}", message_type, err);
                DispatchOutcome::Dropped(DropReason::Undecodable)
            }
        }
    }

    /// Stamp `context` onto the message and deliver it to at most one handler,
    /// falling back to the receive queue
    pub fn dispatch(
        &self,
        mut message: Message,
        context: Result<CircuitContext, StampError>,
    ) -> DispatchOutcome {
        let stamped = context.and_then(|context| message.stamp(context).map(|_| context));
        let context = match stamped {
            Ok(context) => context,
            Err(err) => {
                debug!("dropping {}: {}", message.message_type(), err);
                return DispatchOutcome::Dropped(DropReason::StampFailed);
            }
        };

        let message_type = message.message_type();
        if let Some(handler) = self.message_routing.get(&message_type) {
            invoke(&handler, message);
            return DispatchOutcome::Handled(Route::Message(message_type));
        }

        match message.payload() {
            MessagePayload::ImprovedInstantMessage(im) => {
                if im.agent_id != context.agent_id || im.session_id != context.session_id {
                    debug!(
                        "dropping instant message with foreign identity on circuit {}",
                        context.circuit_code
                    );
                    return DispatchOutcome::Dropped(DropReason::IdentityMismatch);
                }
                let dialog = im.dialog;
                match self.im_message_routing.get(&dialog) {
                    Some(handler) => {
                        invoke(&handler, message);
                        DispatchOutcome::Handled(Route::InstantMessage(dialog))
                    }
                    None => self.enqueue(message),
                }
            }
            MessagePayload::GenericMessage(generic) => {
                let method = generic.method.clone();
                match self.generic_message_routing.get(method.as_str()) {
                    Some(handler) => {
                        invoke(&handler, message);
                        DispatchOutcome::Handled(Route::Generic(method))
                    }
                    None => self.enqueue(message),
                }
            }
            MessagePayload::GodlikeMessage(godlike) => {
                let method = godlike.method.clone();
                match self.godlike_message_routing.get(method.as_str()) {
                    Some(handler) => {
                        invoke(&handler, message);
                        DispatchOutcome::Handled(Route::Godlike(method))
                    }
                    None => self.enqueue(message),
                }
            }
            _ => self.enqueue(message),
        }
    }

    fn enqueue(&self, message: Message) -> DispatchOutcome {
        let message_type = message.message_type();
        match self.receive_queue.push(message) {
            Ok(()) => DispatchOutcome::Queued,
            Err(_) => {
                trace!("no route for {}", message_type);
                DispatchOutcome::Dropped(DropReason::Unrouted)
            }
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

// A panicking handler must not take the receive path down with it
fn invoke(handler: &Handler, message: Message) {
    let message_type = message.message_type();
    if catch_unwind(AssertUnwindSafe(|| handler(message))).is_err() {
        warn!("handler for {} panicked", message_type);
    }
}
