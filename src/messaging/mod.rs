/// Topic-based messaging used to feed velocity commands into the game.
///
/// This module is organized into:
/// - **msg**: message payloads (`Twist`, `Vector3`, `Envelope`)
/// - **wire**: datagram codec (magic bytes + bincode)
/// - **transport**: the `Transport` trait and its error type
/// - **udp**: UDP transport and publisher
/// - **loopback**: in-process transport with a bounded queue
///
/// A [`Node`] owns one transport and a list of subscriptions. Spinning the
/// node pulls pending envelopes from the transport and hands each one to the
/// handlers subscribed to its topic.

use std::time::Duration;

use bevy::log::{debug, info};

pub mod loopback;
pub mod msg;
pub mod transport;
pub mod udp;
pub mod wire;

pub use loopback::{LoopbackPublisher, LoopbackTransport};
pub use msg::{Envelope, Twist, Vector3};
pub use transport::{Transport, TransportError};
pub use udp::{UdpPublisher, UdpTransport};

/// Callback invoked for every message delivered on a subscribed topic.
pub type Handler = Box<dyn FnMut(&Twist) + Send + Sync>;

struct Subscription {
    topic: String,
    handler: Handler,
}

pub struct Node {
    name: String,
    transport: Box<dyn Transport>,
    subscriptions: Vec<Subscription>,
    shut_down: bool,
}

impl Node {
    pub fn new(name: impl Into<String>, transport: impl Transport) -> Self {
        let name = name.into();
        info!("Node '{}' created on {}", name, transport.describe());
        Self {
            name,
            transport: Box::new(transport),
            subscriptions: Vec::new(),
            shut_down: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Register `handler` for messages on `topic`. Several handlers may share
    /// a topic; they run in registration order.
    pub fn subscribe(&mut self, topic: impl Into<String>, handler: impl FnMut(&Twist) + Send + Sync + 'static) {
        let topic = topic.into();
        info!("Node '{}' subscribed to '{}'", self.name, topic);
        self.subscriptions.push(Subscription {
            topic,
            handler: Box::new(handler),
        });
    }

    /// Process pending messages, waiting at most `timeout` for the first one.
    ///
    /// Returns how many handler invocations happened. Messages on topics
    /// without a subscriber are dropped.
    pub fn spin_once(&mut self, timeout: Duration) -> Result<usize, TransportError> {
        if self.shut_down {
            return Err(TransportError::Closed);
        }

        let mut delivered = 0;
        for envelope in self.transport.receive(timeout)? {
            let mut matched = false;
            for sub in self.subscriptions.iter_mut().filter(|s| s.topic == envelope.topic) {
                (sub.handler)(&envelope.twist);
                matched = true;
                delivered += 1;
            }
            if !matched {
                debug!("Node '{}' ignoring message on '{}'", self.name, envelope.topic);
            }
        }
        Ok(delivered)
    }

    /// Drop all subscriptions and close the transport. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.subscriptions.clear();
        self.transport.shutdown();
        self.shut_down = true;
        info!("Node '{}' shut down", self.name);
    }
}
