//! Cooperative shutdown signal.
//!
//! [`Shutdown`] owns the sending half of a channel that never carries a message;
//! triggering drops it. Every [`CancelToken`] holds a receiver, which becomes
//! disconnected at that moment, so tokens can be polled or used as a `select!`
//! arm next to the sample channel. Dropping the last [`Shutdown`] clone cancels
//! as well.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct Shutdown {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            signal: self.signal.clone(),
        }
    }

    /// Cancel every token handed out by this signal. Idempotent.
    pub fn trigger(&self) {
        let mut guard = match self.trigger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready (disconnected) once cancelled.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.signal
    }
}
