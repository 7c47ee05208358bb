/// Transport abstraction underneath a [`Node`](super::Node).
///
/// A transport only moves envelopes; topic matching and handler dispatch
/// happen in the node.

use std::time::Duration;

use thiserror::Error;

use super::msg::Envelope;
use super::wire::WireError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] WireError),
    #[error("transport closed")]
    Closed,
}

/// Inbound side of a message transport.
pub trait Transport: Send + Sync + 'static {
    /// Collect pending envelopes, waiting at most `timeout` for the first one.
    ///
    /// Returns an empty batch when nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<Vec<Envelope>, TransportError>;

    /// Release the underlying resources. Later calls to `receive` fail with
    /// [`TransportError::Closed`].
    fn shutdown(&mut self);

    /// Short label used in logs.
    fn describe(&self) -> String;
}
