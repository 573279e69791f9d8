//! Producer side: turns inbound datagram payloads into ring writes.

use super::buffers::{BufferStats, RingWriter};
use crate::config::BridgeConfig;
use crate::conversions::decode_le_i16;
use crate::error::{BridgeError, BridgeResult};
use tracing::{info, trace};

/// Counters kept by [`BurstProducer`]. Observational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Bursts handed to [`BurstProducer::on_burst`], including empty ones.
    pub bursts: u64,
    /// Payload bytes received.
    pub bytes: u64,
    /// Samples written to the ring.
    pub samples: u64,
    /// Trailing bytes dropped because they did not form a whole sample.
    pub discarded_bytes: u64,
}

/// Appends each inbound burst to the ring.
///
/// Payloads are decoded through a scratch buffer allocated once at
/// construction, so [`BurstProducer::on_burst`] never allocates and never
/// blocks. Bursts longer than the scratch buffer are decoded in pieces.
#[derive(Debug)]
pub struct BurstProducer {
    writer: RingWriter,
    scratch: Box<[i16]>,
    activity_log_interval: u64,
    stats: ProducerStats,
}

impl BurstProducer {
    /// Create a producer writing into `writer`, sized by `config.max_payload_bytes`.
    ///
    /// The ring behind `writer` must hold at least one `config.frame_size` frame.
    pub fn new(writer: RingWriter, config: &BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        check_ring_fits_frame(writer.capacity(), config)?;

        Ok(Self {
            writer,
            scratch: vec![0i16; config.max_burst_samples()].into_boxed_slice(),
            activity_log_interval: config.activity_log_interval,
            stats: ProducerStats::default(),
        })
    }

    /// Queue one burst of little-endian i16 PCM. Returns the number of samples queued.
    ///
    /// Any trailing odd byte is discarded. An empty payload still counts as a burst.
    pub fn on_burst(&mut self, payload: &[u8]) -> usize {
        let mut remaining = payload;
        let mut queued = 0;

        loop {
            let decoded = decode_le_i16(remaining, &mut self.scratch);
            if decoded.samples > 0 {
                self.writer.write(&self.scratch[..decoded.samples]);
                queued += decoded.samples;
            }
            self.stats.discarded_bytes += decoded.discarded_bytes as u64;
            remaining = &remaining[decoded.consumed_bytes..];

            if decoded.samples == 0 || remaining.len() < 2 {
                break;
            }
        }

        self.stats.bursts += 1;
        self.stats.bytes += payload.len() as u64;
        self.stats.samples += queued as u64;

        trace!(bytes = payload.len(), samples = queued, "burst queued");
        self.log_activity();

        queued
    }

    /// Queue samples that are already decoded.
    pub fn on_samples(&mut self, samples: &[i16]) {
        self.writer.write(samples);
        self.stats.bursts += 1;
        self.stats.bytes += (samples.len() * 2) as u64;
        self.stats.samples += samples.len() as u64;
        self.log_activity();
    }

    /// Bursts received so far.
    pub const fn bursts(&self) -> u64 {
        self.stats.bursts
    }

    /// Producer counters.
    pub const fn stats(&self) -> ProducerStats {
        self.stats
    }

    /// Ring statistics as seen from the producer side.
    pub fn buffer_stats(&self) -> BufferStats {
        self.writer.stats()
    }

    fn log_activity(&self) {
        if self.activity_log_interval == 0 || self.stats.bursts % self.activity_log_interval != 0 {
            return;
        }
        let buffer = self.writer.stats();
        info!(
            bursts = self.stats.bursts,
            available = buffer.available,
            capacity = buffer.capacity,
            overwritten = buffer.samples_overwritten,
            "received {} bursts, buffer {}/{}",
            self.stats.bursts,
            buffer.available,
            buffer.capacity
        );
    }
}

/// Reject a ring that cannot hold one frame, which would starve the consumer forever.
pub(crate) fn check_ring_fits_frame(capacity: usize, config: &BridgeConfig) -> BridgeResult<()> {
    if config.frame_size > capacity {
        return Err(BridgeError::invalid_config(
            "frame_size",
            format!(
                "{} samples do not fit the {capacity}-sample ring",
                config.frame_size
            ),
        ));
    }
    Ok(())
}
