/// In-process transport. Envelopes published through a [`LoopbackPublisher`]
/// are queued until the owning node spins.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bevy::log::debug;

use super::msg::{Envelope, Twist};
use super::transport::{Transport, TransportError};

#[derive(Default)]
struct Queue {
    pending: VecDeque<Envelope>,
    closed: bool,
}

/// Loopback transport with a bounded history depth.
///
/// When more than `depth` envelopes are waiting, the oldest are discarded.
pub struct LoopbackTransport {
    queue: Arc<Mutex<Queue>>,
    depth: usize,
}

/// Cloneable handle publishing into a [`LoopbackTransport`].
#[derive(Clone)]
pub struct LoopbackPublisher {
    queue: Arc<Mutex<Queue>>,
    depth: usize,
}

impl LoopbackTransport {
    pub fn new(depth: usize) -> (Self, LoopbackPublisher) {
        let depth = depth.max(1);
        let queue = Arc::new(Mutex::new(Queue::default()));
        (
            Self { queue: queue.clone(), depth },
            LoopbackPublisher { queue, depth },
        )
    }
}

impl LoopbackPublisher {
    /// Queue a message. Returns `false` once the transport has been shut down.
    pub fn publish(&self, topic: &str, twist: Twist) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.closed {
            return false;
        }
        queue.pending.push_back(Envelope::new(topic, twist));
        while queue.pending.len() > self.depth {
            if let Some(dropped) = queue.pending.pop_front() {
                debug!("Loopback queue full, dropping message on '{}'", dropped.topic);
            }
        }
        true
    }
}

impl Transport for LoopbackTransport {
    fn receive(&mut self, _timeout: Duration) -> Result<Vec<Envelope>, TransportError> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.closed {
            return Err(TransportError::Closed);
        }
        Ok(queue.pending.drain(..).collect())
    }

    fn shutdown(&mut self) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.closed = true;
        queue.pending.clear();
    }

    fn describe(&self) -> String {
        format!("loopback(depth={})", self.depth)
    }
}
