//! Seams between the bridge core and its external collaborators.

use super::error::StreamResult;
use std::fmt;

/// Consumes frames on behalf of the streaming host.
///
/// The bridge calls [`FrameSink::send_frame`] once per service interval with
/// exactly one frame. Implementations must not block: they sit on the same
/// cooperative loop as the network receive path.
pub trait FrameSink: Send {
    /// Deliver one frame of `F` samples to the host.
    fn send_frame(&mut self, frame: &[i16]) -> StreamResult<()>;

    /// Called when the host activates or deactivates the streaming interface.
    fn set_interface(&mut self, interface: u8, alt_setting: u8) {
        let _ = (interface, alt_setting);
    }

    /// Flush anything the sink buffers internally.
    fn flush(&mut self) -> StreamResult<()> {
        Ok(())
    }

    /// Get sink-specific metrics.
    fn metrics(&self) -> SinkMetrics {
        SinkMetrics::default()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn send_frame(&mut self, frame: &[i16]) -> StreamResult<()> {
        (**self).send_frame(frame)
    }

    fn set_interface(&mut self, interface: u8, alt_setting: u8) {
        (**self).set_interface(interface, alt_setting);
    }

    fn flush(&mut self) -> StreamResult<()> {
        (**self).flush()
    }

    fn metrics(&self) -> SinkMetrics {
        (**self).metrics()
    }
}

/// Information about the PCM format crossing the bridge.
///
/// Samples are always signed and little-endian on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormatInfo {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u8,
}

impl AudioFormatInfo {
    /// Bytes occupied by `samples` samples.
    pub const fn bytes_per_frame(&self, samples: usize) -> usize {
        samples * (self.bits_per_sample as usize / 8)
    }
}

impl fmt::Display for AudioFormatInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s{}le {} Hz x{}",
            self.bits_per_sample, self.sample_rate, self.channels
        )
    }
}

/// Metrics for monitoring frame sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkMetrics {
    /// Frames accepted by the sink.
    pub frames_received: u64,
    /// Bytes accepted by the sink.
    pub bytes_received: u64,
    /// Frames the sink had to drop.
    pub frames_dropped: u64,
}
