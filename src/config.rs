//! Process-wide bridge configuration.
//!
//! All sizes are fixed once a [`BridgeConfig`] has been handed to the ring and
//! the adapters. Nothing is re-read at runtime and nothing is persisted.

use crate::error::{BridgeError, BridgeResult};
use crate::streaming::traits::AudioFormatInfo;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Reference sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Reference channel count (mono).
pub const CHANNELS: u16 = 1;

/// Reference consumer frame size in samples.
pub const FRAME_SIZE: usize = 512;

/// Number of frames the reference ring can hold.
pub const RING_FRAMES: usize = 8;

/// Reference ring capacity in samples.
pub const BUFFER_CAPACITY: usize = FRAME_SIZE * RING_FRAMES;

/// Reference UDP port the producer listens on.
pub const UDP_PORT: u16 = 5005;

/// Largest datagram payload expected from the transport (Ethernet MTU minus IP/UDP headers).
pub const MAX_PAYLOAD_BYTES: usize = 1472;

/// Bursts between producer activity log lines.
pub const ACTIVITY_LOG_INTERVAL: u64 = 100;

/// Width of one PCM sample on the wire.
pub const SAMPLE_WIDTH: usize = std::mem::size_of::<i16>();

/// Immutable configuration shared by the ring, both adapters and the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Sample rate of the PCM stream in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count. The ring treats samples as opaque, so this only
    /// affects timing and format reporting.
    pub channels: u16,
    /// Samples handed to the streaming host per service interval (F).
    pub frame_size: usize,
    /// Ring capacity in samples (C). Must hold at least one frame.
    pub buffer_capacity: usize,
    /// Address the transport binds to.
    pub bind_address: IpAddr,
    /// Port the transport binds to. Zero picks an ephemeral port.
    pub port: u16,
    /// Receive buffer size for one datagram.
    pub max_payload_bytes: usize,
    /// Producer logs buffer fill every this many bursts; zero disables.
    pub activity_log_interval: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            frame_size: FRAME_SIZE,
            buffer_capacity: BUFFER_CAPACITY,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: UDP_PORT,
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            activity_log_interval: ACTIVITY_LOG_INTERVAL,
        }
    }
}

impl BridgeConfig {
    /// Loopback configuration on an ephemeral port, used by tests and local demos.
    pub fn loopback() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..Self::default()
        }
    }

    /// Copy with a different sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Copy with a different frame size, keeping the ring at the same number of frames.
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        let frames = self.ring_frames().max(1);
        self.frame_size = frame_size;
        self.buffer_capacity = frame_size.saturating_mul(frames);
        self
    }

    /// Copy with a ring capacity of `frames` whole frames.
    pub fn with_ring_frames(mut self, frames: usize) -> Self {
        self.buffer_capacity = self.frame_size.saturating_mul(frames);
        self
    }

    /// Copy with an explicit ring capacity in samples.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Copy bound to a different address and port.
    pub fn with_bind(mut self, address: IpAddr, port: u16) -> Self {
        self.bind_address = address;
        self.port = port;
        self
    }

    /// Copy with a different activity log interval.
    pub fn with_activity_log_interval(mut self, interval: u64) -> Self {
        self.activity_log_interval = interval;
        self
    }

    /// Check that every size is usable.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.sample_rate == 0 {
            return Err(BridgeError::invalid_config("sample_rate", "must be > 0"));
        }
        if self.channels == 0 {
            return Err(BridgeError::invalid_config("channels", "must be > 0"));
        }
        if self.frame_size == 0 {
            return Err(BridgeError::invalid_config("frame_size", "must be > 0"));
        }
        if self.buffer_capacity < self.frame_size {
            return Err(BridgeError::invalid_config(
                "buffer_capacity",
                format!(
                    "{} samples cannot hold one frame of {}",
                    self.buffer_capacity, self.frame_size
                ),
            ));
        }
        if self.max_payload_bytes < SAMPLE_WIDTH {
            return Err(BridgeError::invalid_config(
                "max_payload_bytes",
                format!("must hold at least one {SAMPLE_WIDTH}-byte sample"),
            ));
        }
        Ok(())
    }

    /// Whole frames that fit in the ring.
    pub const fn ring_frames(&self) -> usize {
        if self.frame_size == 0 {
            0
        } else {
            self.buffer_capacity / self.frame_size
        }
    }

    /// Time between host pulls: one frame at the configured rate.
    pub fn frame_interval(&self) -> Duration {
        self.samples_to_duration(self.frame_size)
    }

    /// Worst-case latency added by a full ring.
    pub fn buffer_latency(&self) -> Duration {
        self.samples_to_duration(self.buffer_capacity)
    }

    /// Socket address for the transport.
    pub const fn bind_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Maximum samples carried by one datagram.
    pub const fn max_burst_samples(&self) -> usize {
        self.max_payload_bytes / SAMPLE_WIDTH
    }

    /// Format of the PCM stream on both sides of the bridge.
    pub fn format_info(&self) -> AudioFormatInfo {
        AudioFormatInfo {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: 16,
        }
    }

    fn samples_to_duration(&self, samples: usize) -> Duration {
        let per_second = u64::from(self.sample_rate) * u64::from(self.channels.max(1));
        if per_second == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(samples as u64 * 1_000_000_000 / per_second)
    }
}
