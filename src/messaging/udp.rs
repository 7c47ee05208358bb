/// UDP datagram transport and the matching publisher.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use bevy::log::{debug, info, warn};

use super::msg::{Envelope, Twist};
use super::transport::{Transport, TransportError};
use super::wire::{decode_envelope, encode_envelope, MAX_DATAGRAM_LEN};

/// Shortest read timeout handed to the socket. A zero timeout is rejected by
/// `set_read_timeout`.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Most datagrams read by a single `receive`. Anything beyond stays queued in
/// the socket for the next call.
pub const MAX_BATCH: usize = 64;

/// Receives envelopes sent to a bound UDP socket.
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    local_addr: SocketAddr,
    buf: Box<[u8; MAX_DATAGRAM_LEN]>,
}

impl UdpTransport {
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        let local_addr = socket.local_addr()?;
        info!("UDP transport listening on {}", local_addr);
        Ok(Self {
            socket: Some(socket),
            local_addr,
            buf: Box::new([0; MAX_DATAGRAM_LEN]),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Read one datagram. `Ok(None)` means the wait ran out or, in
    /// non-blocking mode, nothing is queued.
    fn recv_datagram(socket: &UdpSocket, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        match socket.recv_from(buf) {
            Ok((len, _from)) => Ok(Some(len)),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            // Reported on some platforms after an ICMP port-unreachable; not fatal for a listener.
            Err(e) if e.kind() == ErrorKind::ConnectionReset => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn push_decoded(&self, len: usize, batch: &mut Vec<Envelope>) {
        match decode_envelope(&self.buf[..len]) {
            Ok(envelope) => batch.push(envelope),
            Err(e) => warn!("Dropping datagram ({} bytes) on {}: {}", len, self.local_addr, e),
        }
    }

    /// Wait up to `timeout` for a first datagram, then take whatever else is
    /// already queued without blocking, stopping at [`MAX_BATCH`] datagrams or
    /// once `timeout` has elapsed.
    ///
    /// Only a failure before the first datagram is an error. Later failures
    /// end the batch early and keep what was already decoded.
    fn drain(&mut self, socket: &UdpSocket, timeout: Duration) -> Result<Vec<Envelope>, TransportError> {
        let wait = timeout.max(MIN_WAIT);
        let deadline = Instant::now() + wait;
        let mut batch = Vec::new();

        socket.set_nonblocking(false)?;
        socket.set_read_timeout(Some(wait))?;
        let Some(len) = Self::recv_datagram(socket, &mut self.buf[..])? else {
            return Ok(batch);
        };
        self.push_decoded(len, &mut batch);

        if let Err(e) = self.drain_queued(socket, deadline, &mut batch) {
            warn!("Receive on {} cut short after {} envelope(s): {}", self.local_addr, batch.len(), e);
        }

        debug!("Received {} envelope(s) on {}", batch.len(), self.local_addr);
        Ok(batch)
    }

    fn drain_queued(
        &mut self,
        socket: &UdpSocket,
        deadline: Instant,
        batch: &mut Vec<Envelope>,
    ) -> Result<(), TransportError> {
        socket.set_nonblocking(true)?;
        let mut datagrams = 1;
        while datagrams < MAX_BATCH && Instant::now() < deadline {
            let Some(len) = Self::recv_datagram(socket, &mut self.buf[..])? else {
                break;
            };
            self.push_decoded(len, batch);
            datagrams += 1;
        }
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn receive(&mut self, timeout: Duration) -> Result<Vec<Envelope>, TransportError> {
        let socket = self.socket.take().ok_or(TransportError::Closed)?;
        let result = self.drain(&socket, timeout);
        self.socket = Some(socket);
        result
    }

    fn shutdown(&mut self) {
        if self.socket.take().is_some() {
            info!("UDP transport on {} closed", self.local_addr);
        }
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.local_addr)
    }
}

/// Sends envelopes to a remote [`UdpTransport`].
pub struct UdpPublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpPublisher {
    pub fn connect(target: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let target = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "no address resolved"))?;
        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        Ok(Self { socket, target })
    }

    pub fn publish(&self, topic: &str, twist: Twist) -> Result<(), TransportError> {
        let payload = encode_envelope(&Envelope::new(topic, twist))?;
        self.socket.send_to(&payload, self.target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_reaches_bound_transport() {
        let mut transport = UdpTransport::bind("127.0.0.1:0").unwrap();
        let publisher = UdpPublisher::connect(transport.local_addr()).unwrap();

        publisher.publish("player1/cmd_vel", Twist::planar(5.0, 0.0)).unwrap();
        publisher.publish("player2/cmd_vel", Twist::planar(0.0, -2.0)).unwrap();

        let mut received = Vec::new();
        for _ in 0..50 {
            received.extend(transport.receive(Duration::from_millis(20)).unwrap());
            if received.len() == 2 {
                break;
            }
        }

        assert_eq!(received.len(), 2);
        assert_eq!(received[0].topic, "player1/cmd_vel");
        assert_eq!(received[1].twist, Twist::planar(0.0, -2.0));
    }

    #[test]
    fn test_receive_stops_at_batch_limit() {
        let mut transport = UdpTransport::bind("127.0.0.1:0").unwrap();
        let publisher = UdpPublisher::connect(transport.local_addr()).unwrap();
        let sent = MAX_BATCH + 5;
        for i in 0..sent {
            publisher.publish("player1/cmd_vel", Twist::planar(i as f64, 0.0)).unwrap();
        }

        let first = transport.receive(Duration::from_secs(1)).unwrap();
        assert_eq!(first.len(), MAX_BATCH);
        assert_eq!(first[0].twist, Twist::planar(0.0, 0.0));

        let mut rest = Vec::new();
        for _ in 0..50 {
            rest.extend(transport.receive(Duration::from_millis(20)).unwrap());
            if rest.len() == sent - MAX_BATCH {
                break;
            }
        }
        assert_eq!(rest.len(), 5);
        assert_eq!(rest[4].twist, Twist::planar((sent - 1) as f64, 0.0));
    }

    #[test]
    fn test_receive_times_out_with_empty_batch() {
        let mut transport = UdpTransport::bind("127.0.0.1:0").unwrap();
        let batch = transport.receive(Duration::from_millis(5)).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_receive_after_shutdown_fails() {
        let mut transport = UdpTransport::bind("127.0.0.1:0").unwrap();
        transport.shutdown();
        assert!(matches!(
            transport.receive(Duration::from_millis(1)),
            Err(TransportError::Closed)
        ));
    }
}
