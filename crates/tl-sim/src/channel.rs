//! Bounded FIFO hand-off between the sampler and the control task.
//!
//! Sends never block: a full queue refuses the sample and the caller moves on.
//! Receives block, optionally with a timeout and a [`CancelToken`].

use crate::cancel::CancelToken;
use crate::error::{SimError, SimResult};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, never, select};
use std::time::Duration;
use tl_controls::SensorSample;

/// Queue depth used when none is configured.
pub const DEFAULT_CAPACITY: usize = 5;

/// Result of a non-blocking send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    /// Queue at capacity; the sample was discarded.
    Full,
}

/// Result of a blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    Sample(SensorSample),
    TimedOut,
    Cancelled,
    /// Every sender is gone and the queue is drained.
    Closed,
}

/// Create a sample channel holding at most `capacity` queued samples.
pub fn bounded(capacity: usize) -> SimResult<(SampleSender, SampleReceiver)> {
    if capacity == 0 {
        return Err(SimError::InvalidArg {
            what: "channel capacity must be positive",
        });
    }
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    Ok((SampleSender { tx }, SampleReceiver { rx }))
}

#[derive(Debug, Clone)]
pub struct SampleSender {
    tx: Sender<SensorSample>,
}

impl SampleSender {
    pub fn try_send(&self, sample: SensorSample) -> SimResult<SendOutcome> {
        match self.tx.try_send(sample) {
            Ok(()) => Ok(SendOutcome::Queued),
            Err(TrySendError::Full(_)) => Ok(SendOutcome::Full),
            Err(TrySendError::Disconnected(_)) => Err(SimError::ChannelClosed),
        }
    }
}

#[derive(Debug)]
pub struct SampleReceiver {
    rx: Receiver<SensorSample>,
}

impl SampleReceiver {
    /// Wait for the next sample. `None` waits indefinitely.
    pub fn recv(&self, timeout: Option<Duration>) -> RecvOutcome {
        match timeout {
            None => match self.rx.recv() {
                Ok(sample) => RecvOutcome::Sample(sample),
                Err(_) => RecvOutcome::Closed,
            },
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(sample) => RecvOutcome::Sample(sample),
                Err(RecvTimeoutError::Timeout) => RecvOutcome::TimedOut,
                Err(RecvTimeoutError::Disconnected) => RecvOutcome::Closed,
            },
        }
    }

    /// Wait for the next sample or for `cancel`, whichever comes first.
    pub fn recv_or_cancel(&self, cancel: &CancelToken, timeout: Option<Duration>) -> RecvOutcome {
        if cancel.is_cancelled() {
            return RecvOutcome::Cancelled;
        }
        let deadline = match timeout {
            Some(timeout) => crossbeam_channel::after(timeout),
            None => never(),
        };
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(sample) => RecvOutcome::Sample(sample),
                Err(_) => RecvOutcome::Closed,
            },
            recv(cancel.receiver()) -> _ => RecvOutcome::Cancelled,
            recv(deadline) -> _ => RecvOutcome::TimedOut,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
