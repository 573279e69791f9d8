//! Buffering and flow control between a bursty network producer and a
//! fixed-cadence frame consumer.
//!
//! This module provides:
//! - A fixed-capacity sample ring with drop-oldest overflow and zero-padded reads
//! - The producer adapter that queues inbound datagram payloads
//! - The consumer adapter that emits one frame per host pull, or silence
//! - A UDP transport, a sending client and frame sinks for the host side
//! - The cooperative poll loop that ties them together
//!
//! The ring, both adapters and the sink trait are always available. The
//! network pieces need the `streaming` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use pcm_bridge::{BridgeConfig, streaming::*};
//!
//! async fn bridge() -> Result<(), StreamError> {
//!     let (sink, frames) = ChannelSink::bounded(64);
//!     let mut bridge = AudioBridge::new(BridgeConfig::default(), sink)?;
//!     let stop = bridge.shutdown_token();
//!
//!     tokio::spawn(async move {
//!         while let Ok(frame) = frames.recv() {
//!             deliver_to_host(frame);
//!         }
//!     });
//!
//!     bridge.run().await?;
//!     Ok(())
//! }
//! ```

pub mod buffers;
pub mod consumer;
pub mod error;
pub mod producer;
pub mod traits;

#[cfg(feature = "streaming")]
pub mod bridge;

#[cfg(feature = "streaming")]
pub mod sender;

#[cfg(feature = "streaming")]
pub mod sinks;

#[cfg(feature = "streaming")]
pub mod sources;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use buffers::{BufferStats, RingReader, RingWriter, SampleRing};
pub use consumer::{ConsumerStats, FeedState, FrameConsumer, SilenceFrame};
pub use error::{StreamError, StreamResult};
pub use producer::{BurstProducer, ProducerStats};
pub use traits::{AudioFormatInfo, FrameSink, SinkMetrics};

#[cfg(feature = "streaming")]
pub use bridge::{AudioBridge, BridgeState, BridgeStats};

#[cfg(feature = "streaming")]
pub use sender::{BurstSender, SenderStats};

#[cfg(feature = "streaming")]
pub use sinks::{ChannelSink, NullSink, WriterSink};

#[cfg(feature = "streaming")]
pub use sources::{UdpBurstSource, UdpState};
