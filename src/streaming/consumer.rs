//! Consumer side: hands the streaming host exactly one frame per service interval.

use super::buffers::{BufferStats, RingReader};
use super::producer::check_ring_fits_frame;
use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use std::fmt;
use tracing::{debug, info};

/// Immutable all-zero frame substituted while the ring is starved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilenceFrame {
    samples: Box<[i16]>,
}

impl SilenceFrame {
    /// Create a silence frame of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0i16; len].into_boxed_slice(),
        }
    }

    /// The zero samples.
    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    /// Frame length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check whether the frame is zero-length.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Whether the last pull was served from real audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    /// Fewer than one frame was available; silence was emitted.
    #[default]
    Starved,
    /// A full frame of real audio was emitted.
    Feeding,
}

impl fmt::Display for FeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starved => f.write_str("starved"),
            Self::Feeding => f.write_str("feeding"),
        }
    }
}

/// Counters kept by [`FrameConsumer`]. Observational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Frames handed to the host.
    pub frames_pulled: u64,
    /// Frames drawn from the ring.
    pub real_frames: u64,
    /// Frames replaced by silence.
    pub silent_frames: u64,
    /// Transitions from feeding to starved.
    pub starvation_episodes: u64,
    /// State after the most recent pull.
    pub state: FeedState,
}

/// Pulls fixed-size frames from the ring on the host's cadence.
///
/// Each pull is all-or-nothing: if a full frame is available it is returned
/// oldest-first, otherwise the [`SilenceFrame`] is returned and the ring is
/// left untouched for the next pull.
#[derive(Debug)]
pub struct FrameConsumer {
    reader: RingReader,
    frame: Box<[i16]>,
    silence: SilenceFrame,
    stats: ConsumerStats,
}

impl FrameConsumer {
    /// Create a consumer reading `config.frame_size`-sample frames from `reader`.
    ///
    /// Fails if the ring behind `reader` cannot hold one frame.
    pub fn new(reader: RingReader, config: &BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        check_ring_fits_frame(reader.capacity(), config)?;

        Ok(Self {
            reader,
            frame: vec![0i16; config.frame_size].into_boxed_slice(),
            silence: SilenceFrame::new(config.frame_size),
            stats: ConsumerStats::default(),
        })
    }

    /// Produce the next frame for the host.
    ///
    /// Never blocks and never allocates. The returned slice always holds
    /// exactly `frame_size` samples.
    pub fn pull_frame(&mut self) -> &[i16] {
        let feeding = self.reader.try_read_exact(&mut self.frame);
        let state = if feeding {
            FeedState::Feeding
        } else {
            FeedState::Starved
        };

        if state != self.stats.state {
            if state == FeedState::Starved {
                self.stats.starvation_episodes += 1;
            }
            debug!(
                from = %self.stats.state,
                to = %state,
                available = self.reader.available(),
                "feed state changed"
            );
        }

        self.stats.state = state;
        self.stats.frames_pulled += 1;

        if feeding {
            self.stats.real_frames += 1;
            &self.frame[..]
        } else {
            self.stats.silent_frames += 1;
            self.silence.as_slice()
        }
    }

    /// Record a host interface activation change. Only logged.
    pub fn set_interface(&self, interface: u8, alt_setting: u8) {
        info!(interface, alt_setting, "audio interface {interface} set to alt {alt_setting}");
    }

    /// State after the most recent pull.
    pub const fn state(&self) -> FeedState {
        self.stats.state
    }

    /// Samples per frame.
    pub fn frame_size(&self) -> usize {
        self.frame.len()
    }

    /// The frame returned while starved.
    pub const fn silence(&self) -> &SilenceFrame {
        &self.silence
    }

    /// Consumer counters.
    pub const fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// Ring statistics as seen from the consumer side.
    pub fn buffer_stats(&self) -> BufferStats {
        self.reader.stats()
    }
}
