//! Sending client: packs PCM blocks into datagrams addressed to the bridge.

use super::error::{StreamError, StreamResult};
use crate::config::{FRAME_SIZE, MAX_PAYLOAD_BYTES, SAMPLE_WIDTH};
use crate::conversions::{encode_le_i16, f32_to_i16};
use crate::error::BridgeError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Counters kept by [`BurstSender`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Datagrams sent successfully.
    pub packets_sent: u64,
    /// Samples carried by those datagrams.
    pub samples_sent: u64,
    /// Datagrams that failed to send.
    pub send_errors: u64,
}

/// Sends mono i16 PCM to a bridge in blocks of `block_size` samples.
pub struct BurstSender {
    socket: UdpSocket,
    target: SocketAddr,
    block_size: usize,
    packet: Box<[u8]>,
    stats: SenderStats,
}

impl BurstSender {
    /// Bind an ephemeral socket and target `target` with the reference block size.
    pub async fn connect(target: SocketAddr) -> StreamResult<Self> {
        Self::with_block_size(target, FRAME_SIZE).await
    }

    /// Bind an ephemeral socket and target `target`, sending `block_size` samples per datagram.
    ///
    /// A block must fit in one [`MAX_PAYLOAD_BYTES`] datagram, otherwise the
    /// receiving bridge would drop it.
    pub async fn with_block_size(target: SocketAddr, block_size: usize) -> StreamResult<Self> {
        if block_size == 0 {
            return Err(BridgeError::invalid_parameter("block_size", "must be > 0").into());
        }
        if block_size.saturating_mul(SAMPLE_WIDTH) > MAX_PAYLOAD_BYTES {
            return Err(BridgeError::invalid_parameter(
                "block_size",
                format!(
                    "{block_size} samples exceed the {MAX_PAYLOAD_BYTES}-byte datagram payload"
                ),
            )
            .into());
        }

        let local = SocketAddr::new(
            match target.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                IpAddr::V6(_) => IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
            },
            0,
        );
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| StreamError::bind(local, e))?;

        info!(%target, block_size, "sending audio to {target}");

        Ok(Self {
            socket,
            target,
            block_size,
            packet: vec![0u8; block_size * SAMPLE_WIDTH].into_boxed_slice(),
            stats: SenderStats::default(),
        })
    }

    /// Send `samples`, split into datagrams of at most `block_size` samples.
    ///
    /// Returns the number of datagrams sent. The first failing send aborts the call.
    pub async fn send_samples(&mut self, samples: &[i16]) -> StreamResult<usize> {
        let mut sent = 0;
        for block in samples.chunks(self.block_size) {
            let len = encode_le_i16(block, &mut self.packet);
            self.send_packet(len, block.len()).await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Quantise float samples in [-1.0, 1.0] and send them.
    pub async fn send_f32(&mut self, samples: &[f32]) -> StreamResult<usize> {
        let mut sent = 0;
        for block in samples.chunks(self.block_size) {
            for (pair, &sample) in self.packet.chunks_exact_mut(SAMPLE_WIDTH).zip(block) {
                pair.copy_from_slice(&f32_to_i16(sample).to_le_bytes());
            }
            self.send_packet(block.len() * SAMPLE_WIDTH, block.len())
                .await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Send raw bytes as one datagram, unmodified.
    pub async fn send_raw(&mut self, payload: &[u8]) -> StreamResult<()> {
        match self.socket.send_to(payload, self.target).await {
            Ok(_) => {
                self.stats.packets_sent += 1;
                self.stats.samples_sent += (payload.len() / SAMPLE_WIDTH) as u64;
                Ok(())
            }
            Err(e) => {
                self.stats.send_errors += 1;
                Err(StreamError::Network(e))
            }
        }
    }

    /// Samples per datagram.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Address datagrams are sent to.
    pub const fn target(&self) -> SocketAddr {
        self.target
    }

    /// Sender counters.
    pub const fn stats(&self) -> SenderStats {
        self.stats
    }

    async fn send_packet(&mut self, len: usize, samples: usize) -> StreamResult<()> {
        match self.socket.send_to(&self.packet[..len], self.target).await {
            Ok(_) => {
                self.stats.packets_sent += 1;
                self.stats.samples_sent += samples as u64;
                if self.stats.packets_sent % 100 == 0 {
                    debug!(
                        packets = self.stats.packets_sent,
                        errors = self.stats.send_errors,
                        "packets sent"
                    );
                }
                Ok(())
            }
            Err(e) => {
                self.stats.send_errors += 1;
                warn!(error = %e, target = %self.target, "send failed");
                Err(StreamError::Network(e))
            }
        }
    }
}
