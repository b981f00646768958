use std::{
    io,
    sync::Weak,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use log::warn;

use crate::circuit::Circuit;

/// Periodic driver of `Circuit::tick`. Dropping the cancel sender wakes the
/// thread immediately.
pub(crate) struct TickThread {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl TickThread {
    pub fn spawn(circuit: Weak<Circuit>, interval: Duration, name: String) -> io::Result<Self> {
        let (cancel, cancelled) = channel::bounded::<()>(0);
        let handle = thread::Builder::new().name(name).spawn(move || loop {
            match cancelled.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let Some(circuit) = circuit.upgrade() else {
                        break;
                    };
                    circuit.tick(Instant::now());
                    if !circuit.is_running() {
                        break;
                    }
                }
                _ => break,
            }
        })?;
        Ok(Self { cancel, handle })
    }

    /// Never joins when called from the tick thread itself
    pub fn cancel(self) {
        drop(self.cancel);
        if self.handle.thread().id() == thread::current().id() {
            return;
        }
        if self.handle.join().is_err() {
            warn!("circuit tick thread panicked");
        }
    }
}
