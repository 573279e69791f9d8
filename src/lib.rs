// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # PCM Bridge
//!
//! Bridges two independently clocked audio domains: signed 16-bit PCM
//! arriving in bursts over UDP, and a streaming host that pulls one
//! fixed-size frame per service interval.
//!
//! The core is a fixed-capacity sample ring with two total operations:
//! writes never block (the oldest unread samples are overwritten when it is
//! full) and reads always return the requested number of samples (missing
//! ones are silence). On top of it sit a producer adapter that decodes
//! datagram payloads, and a consumer adapter that hands the host either a
//! full frame of real audio or a full frame of silence, never a mix.
//!
//! ## Features
//!
//! - `streaming` (default): UDP transport, sending client, frame sinks and
//!   the async poll loop (`tokio`, `tokio-util`, `crossbeam`).
//! - `cli`: the `pcm_bridge` binary.
//!
//! ## Quick Start
//!
//! ```rust
//! use pcm_bridge::{BridgeConfig, FeedState, SampleRing};
//! use pcm_bridge::streaming::{BurstProducer, FrameConsumer};
//!
//! let config = BridgeConfig::default();
//! let (writer, reader) = SampleRing::with_config(&config).unwrap().split();
//! let mut producer = BurstProducer::new(writer, &config).unwrap();
//! let mut consumer = FrameConsumer::new(reader, &config).unwrap();
//!
//! // Nothing queued yet: the host gets silence.
//! assert!(consumer.pull_frame().iter().all(|&s| s == 0));
//! assert_eq!(consumer.state(), FeedState::Starved);
//!
//! // One frame of little-endian samples arrives.
//! let payload: Vec<u8> = std::iter::repeat(100i16.to_le_bytes())
//!     .take(config.frame_size)
//!     .flatten()
//!     .collect();
//! producer.on_burst(&payload);
//!
//! assert!(consumer.pull_frame().iter().all(|&s| s == 100));
//! assert_eq!(consumer.state(), FeedState::Feeding);
//! ```
//!
//! ## Error Handling
//!
//! Overflow and underrun are operating conditions, not errors. Errors only
//! arise from configuration and from the I/O boundaries:
//!
//! ```rust
//! use pcm_bridge::{BridgeConfig, BridgeError};
//!
//! let config = BridgeConfig::default().with_buffer_capacity(100);
//! match config.validate() {
//!     Err(BridgeError::InvalidConfig(msg)) => assert!(msg.contains("buffer_capacity")),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

pub mod config;
pub mod conversions;
pub mod error;
pub mod streaming;

pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use streaming::{
    BufferStats, BurstProducer, FeedState, FrameConsumer, FrameSink, SampleRing, SilenceFrame,
    StreamError, StreamResult,
};

#[cfg(feature = "streaming")]
pub use streaming::{AudioBridge, BridgeStats, BurstSender};
