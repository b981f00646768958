use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use simcircuit_shared::Message;

/// Records every message a handler receives. Clones share the same record.
#[derive(Clone)]
pub struct HandlerProbe {
    messages: Arc<Mutex<Vec<Message>>>,
    notify: Sender<()>,
    notified: Receiver<()>,
}

impl HandlerProbe {
    pub fn new() -> Self {
        let (notify, notified) = channel::unbounded();
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            notify,
            notified,
        }
    }

    /// A handler to register in a routing table
    pub fn handler(&self) -> impl Fn(Message) + Send + Sync + 'static {
        let messages = self.messages.clone();
        let notify = self.notify.clone();
        move |message: Message| {
            messages.lock().push(message);
            let _ = notify.send(());
        }
    }

    pub fn count(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages.lock().last().cloned()
    }

    /// Block until the handler has run `count` times in total, or `timeout`
    /// passes. Returns whether the count was reached.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.count() < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.notified.recv_timeout(remaining).is_err() {
                return self.count() >= count;
            }
        }
        true
    }
}

impl Default for HandlerProbe {
    fn default() -> Self {
        Self::new()
    }
}
