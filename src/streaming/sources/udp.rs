//! UDP transport delivering raw PCM bursts to the producer.

use crate::config::BridgeConfig;
use crate::streaming::error::{StreamError, StreamResult};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::{net::UdpSocket, time::timeout};
use tracing::{debug, info, warn};

/// State of the UDP socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdpState {
    /// No socket yet.
    Unbound,
    /// Socket bound and receiving.
    Bound,
    /// The last receive failed.
    Error,
}

/// Receives datagrams into a buffer allocated once at construction.
///
/// No acknowledgement, ordering or retry is exchanged with the sender; every
/// datagram is one burst. The buffer holds one byte more than
/// `max_payload_bytes` so that a datagram the kernel had to cut short can be
/// told apart from one that fit exactly.
pub struct UdpBurstSource {
    address: SocketAddr,
    state: UdpState,
    socket: Option<UdpSocket>,
    recv_buffer: Box<[u8]>,
    max_payload_bytes: usize,

    // Statistics
    packets_received: u64,
    bytes_received: u64,
    receive_errors: u64,
    oversized_datagrams: u64,
    last_peer: Option<SocketAddr>,
}

impl UdpBurstSource {
    /// Create an unbound source for `config.bind_socket_addr()`.
    pub fn new(config: &BridgeConfig) -> StreamResult<Self> {
        config.validate()?;

        Ok(Self {
            address: config.bind_socket_addr(),
            state: UdpState::Unbound,
            socket: None,
            recv_buffer: vec![0u8; config.max_payload_bytes + 1].into_boxed_slice(),
            max_payload_bytes: config.max_payload_bytes,
            packets_received: 0,
            bytes_received: 0,
            receive_errors: 0,
            oversized_datagrams: 0,
            last_peer: None,
        })
    }

    /// Bind the socket and return the actual local address.
    ///
    /// A bind failure is fatal to startup.
    pub async fn bind(&mut self) -> StreamResult<SocketAddr> {
        if let Some(socket) = &self.socket {
            return Ok(socket.local_addr()?);
        }

        let socket = UdpSocket::bind(self.address)
            .await
            .map_err(|e| StreamError::bind(self.address, e))?;
        let local = socket.local_addr()?;

        info!(address = %local, "UDP server listening on {local}");

        self.socket = Some(socket);
        self.state = UdpState::Bound;

        Ok(local)
    }

    /// Wait for the next datagram and return its payload.
    ///
    /// A datagram longer than `max_payload_bytes` is rejected whole with a
    /// recoverable [`StreamError::Protocol`] and counted, since part of it was
    /// already lost in the kernel.
    pub async fn recv_burst(&mut self) -> StreamResult<&[u8]> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(StreamError::InvalidState(
                "UDP source is not bound".to_string(),
            ));
        };

        match socket.recv_from(&mut self.recv_buffer).await {
            Ok((len, peer)) => {
                self.packets_received += 1;
                self.bytes_received += len as u64;
                self.state = UdpState::Bound;

                if self.last_peer != Some(peer) {
                    info!(%peer, "receiving audio from {peer}");
                    self.last_peer = Some(peer);
                }

                if len > self.max_payload_bytes {
                    self.oversized_datagrams += 1;
                    if self.oversized_datagrams == 1 {
                        warn!(
                            %peer,
                            limit = self.max_payload_bytes,
                            "datagram exceeds max payload, dropping"
                        );
                    }
                    return Err(StreamError::protocol(
                        "udp",
                        format!(
                            "datagram from {peer} exceeds {} bytes",
                            self.max_payload_bytes
                        ),
                    ));
                }

                Ok(&self.recv_buffer[..len])
            }
            Err(e) => {
                self.receive_errors += 1;
                self.state = UdpState::Error;
                debug!(error = %e, "UDP receive failed");
                Err(StreamError::Network(e))
            }
        }
    }

    /// Like [`UdpBurstSource::recv_burst`] but gives up after `wait`, returning `None`.
    pub async fn recv_burst_timeout(&mut self, wait: Duration) -> StreamResult<Option<&[u8]>> {
        match timeout(wait, self.recv_burst()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Actual bound address, if bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Get the current socket state.
    pub const fn connection_state(&self) -> UdpState {
        self.state
    }

    /// Peer that sent the most recent datagram.
    pub const fn last_peer(&self) -> Option<SocketAddr> {
        self.last_peer
    }

    /// Get packet statistics: (packets, bytes, receive errors).
    pub const fn packet_stats(&self) -> (u64, u64, u64) {
        (
            self.packets_received,
            self.bytes_received,
            self.receive_errors,
        )
    }

    /// Datagrams dropped for exceeding `max_payload_bytes`.
    pub const fn oversized_datagrams(&self) -> u64 {
        self.oversized_datagrams
    }
}
