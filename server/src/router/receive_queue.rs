use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use simcircuit_shared::Message;

use crate::error::ReceiveError;

/// Ordered queue of messages no handler claimed, consumed by blocking
/// receivers. Disabled until `enable` is called.
pub struct ReceiveQueue {
    enabled: AtomicBool,
    sender: Mutex<Option<Sender<Message>>>,
    receiver: Receiver<Message>,
}

impl ReceiveQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            enabled: AtomicBool::new(false),
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    pub fn enable(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Hands the message back when the queue is disabled or closed
    pub(crate) fn push(&self, message: Message) -> Result<(), Message> {
        if !self.is_enabled() {
            return Err(message);
        }
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            return Err(message);
        };
        sender.send(message).map_err(|err| err.into_inner())
    }

    /// Wakes every blocked receiver once the queue has drained
    pub(crate) fn close(&self) {
        self.sender.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn receive(&self) -> Result<Message, ReceiveError> {
        self.check_enabled()?;
        self.receiver.recv().map_err(|_| ReceiveError::Closed)
    }

    pub fn receive_timeout(&self, timeout: Duration) -> Result<Message, ReceiveError> {
        self.check_enabled()?;
        self.receiver.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ReceiveError::Timeout,
            RecvTimeoutError::Disconnected => ReceiveError::Closed,
        })
    }

    pub fn try_receive(&self) -> Result<Option<Message>, ReceiveError> {
        self.check_enabled()?;
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ReceiveError::Closed),
        }
    }

    fn check_enabled(&self) -> Result<(), ReceiveError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(ReceiveError::QueueDisabled)
        }
    }
}

impl Default for ReceiveQueue {
    fn default() -> Self {
        Self::new()
    }
}
