//! Frame sinks standing in for the streaming host's endpoint.

use super::error::{StreamError, StreamResult};
use super::traits::{FrameSink, SinkMetrics};
use crate::config::SAMPLE_WIDTH;
use crate::conversions::samples_as_le_bytes;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::io::Write;
use tracing::{trace, warn};

/// Forwards frames over a bounded channel.
///
/// Never blocks: when the receiver lags and the channel is full the frame is
/// dropped and counted.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<Vec<i16>>,
    metrics: SinkMetrics,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it, holding up to `capacity` frames.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Vec<i16>>) {
        let (sender, receiver) = channel::bounded(capacity);
        (
            Self {
                sender,
                metrics: SinkMetrics::default(),
            },
            receiver,
        )
    }
}

impl FrameSink for ChannelSink {
    fn send_frame(&mut self, frame: &[i16]) -> StreamResult<()> {
        match self.sender.try_send(frame.to_vec()) {
            Ok(()) => {
                self.metrics.frames_received += 1;
                self.metrics.bytes_received += (frame.len() * SAMPLE_WIDTH) as u64;
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.frames_dropped += 1;
                trace!(dropped = self.metrics.frames_dropped, "frame channel full");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(StreamError::host_link("frame receiver disconnected"))
            }
        }
    }

    fn metrics(&self) -> SinkMetrics {
        self.metrics.clone()
    }
}

/// Writes frames as little-endian PCM to any [`Write`] implementation.
///
/// Useful for piping the stream into a playback device or a file.
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: W,
    metrics: SinkMetrics,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            metrics: SinkMetrics::default(),
        }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameSink for WriterSink<W> {
    fn send_frame(&mut self, frame: &[i16]) -> StreamResult<()> {
        let bytes = samples_as_le_bytes(frame);
        if let Err(err) = self.writer.write_all(&bytes) {
            self.metrics.frames_dropped += 1;
            warn!(error = %err, "failed to write frame");
            return Err(StreamError::host_link(err.to_string()));
        }
        self.metrics.frames_received += 1;
        self.metrics.bytes_received += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> StreamResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn metrics(&self) -> SinkMetrics {
        self.metrics.clone()
    }
}

/// Accepts and discards every frame.
#[derive(Debug, Default)]
pub struct NullSink {
    metrics: SinkMetrics,
}

impl FrameSink for NullSink {
    fn send_frame(&mut self, frame: &[i16]) -> StreamResult<()> {
        self.metrics.frames_received += 1;
        self.metrics.bytes_received += (frame.len() * SAMPLE_WIDTH) as u64;
        Ok(())
    }

    fn metrics(&self) -> SinkMetrics {
        self.metrics.clone()
    }
}
