mod message_router;
mod receive_queue;
mod routing_table;

pub use message_router::{DispatchOutcome, DropReason, MessageRouter, Route};
pub use receive_queue::ReceiveQueue;
pub use routing_table::{Handler, RoutingTable};
