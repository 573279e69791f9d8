//! Fixed-capacity sample ring shared by the burst producer and the frame consumer.
//!
//! [`SampleRing`] is the only stateful piece of the bridge. Its storage is
//! allocated once and both [`SampleRing::write`] and [`SampleRing::read`] are
//! total: writes never block or fail (the oldest unread samples are dropped
//! when the ring is full) and reads always fill the whole output slice
//! (missing samples become silence).

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// A fixed-capacity FIFO of signed 16-bit PCM samples.
///
/// Overflow policy is drop-oldest: once `available == capacity`, each new
/// sample overwrites the oldest unread one and the read cursor moves with it,
/// so a later read still returns the newest `capacity` samples in order.
#[derive(Debug)]
pub struct SampleRing {
    storage: Box<[i16]>,
    write_cursor: usize,
    read_cursor: usize,
    available: usize,

    samples_written: u64,
    samples_read: u64,
    samples_overwritten: u64,
    overflow_events: u64,
}

impl SampleRing {
    /// Create a zero-filled ring holding `capacity` samples.
    pub fn new(capacity: usize) -> BridgeResult<Self> {
        if capacity == 0 {
            return Err(BridgeError::invalid_parameter("capacity", "must be > 0"));
        }

        Ok(Self {
            storage: vec![0i16; capacity].into_boxed_slice(),
            write_cursor: 0,
            read_cursor: 0,
            available: 0,
            samples_written: 0,
            samples_read: 0,
            samples_overwritten: 0,
            overflow_events: 0,
        })
    }

    /// Create a ring sized by `config.buffer_capacity` after validating the config.
    pub fn with_config(config: &BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        Self::new(config.buffer_capacity)
    }

    /// Append `samples` in order, overwriting the oldest unread samples if the ring fills.
    pub fn write(&mut self, samples: &[i16]) {
        let total = samples.len();
        if total == 0 {
            return;
        }

        let capacity = self.capacity();
        self.samples_written += total as u64;

        // Anything older than the newest `capacity` samples would be overwritten
        // within this same call, so skip straight past it.
        let skipped = total.saturating_sub(capacity);
        self.write_cursor = (self.write_cursor + skipped) % capacity;
        self.copy_in(&samples[skipped..]);

        let free = capacity - self.available;
        if total > free {
            self.samples_overwritten += (total - free) as u64;
            self.overflow_events += 1;
            self.available = capacity;
            self.read_cursor = self.write_cursor;
        } else {
            self.available += total;
        }
    }

    /// Pop up to `out.len()` samples in FIFO order, zero-filling the remainder.
    ///
    /// Always fills all of `out`. Returns how many of those samples were real data.
    pub fn read(&mut self, out: &mut [i16]) -> usize {
        let count = out.len().min(self.available);
        self.copy_out(&mut out[..count]);
        out[count..].fill(0);

        self.available -= count;
        self.samples_read += count as u64;
        count
    }

    /// Fill `out` with real samples only if at least `out.len()` are available.
    ///
    /// Leaves the ring untouched and returns `false` otherwise.
    pub fn try_read_exact(&mut self, out: &mut [i16]) -> bool {
        if self.available < out.len() {
            return false;
        }
        self.read(out);
        true
    }

    /// Samples currently holding unread data.
    #[inline]
    pub const fn available(&self) -> usize {
        self.available
    }

    /// Total sample slots, fixed at construction.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Check whether the ring holds no unread data.
    pub const fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Check whether the next write will overwrite unread data.
    pub fn is_full(&self) -> bool {
        self.available == self.capacity()
    }

    /// Index of the next slot to be written.
    pub const fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Index of the next slot to be read.
    pub const fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Snapshot of fill level and lifetime counters.
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            available: self.available,
            capacity: self.capacity(),
            samples_written: self.samples_written,
            samples_read: self.samples_read,
            samples_overwritten: self.samples_overwritten,
            overflow_events: self.overflow_events,
        }
    }

    /// Discard all unread data. Counters are kept.
    pub fn clear(&mut self) {
        self.read_cursor = self.write_cursor;
        self.available = 0;
    }

    /// Hand the ring to exactly one writer and one reader.
    pub fn split(self) -> (RingWriter, RingReader) {
        let shared = Arc::new(Mutex::new(self));
        (
            RingWriter {
                ring: Arc::clone(&shared),
            },
            RingReader { ring: shared },
        )
    }

    fn copy_in(&mut self, samples: &[i16]) {
        let capacity = self.capacity();
        let start = self.write_cursor;
        let first = samples.len().min(capacity - start);

        self.storage[start..start + first].copy_from_slice(&samples[..first]);
        self.storage[..samples.len() - first].copy_from_slice(&samples[first..]);

        self.write_cursor = (start + samples.len()) % capacity;
    }

    fn copy_out(&mut self, out: &mut [i16]) {
        let capacity = self.capacity();
        let start = self.read_cursor;
        let first = out.len().min(capacity - start);
        let rest = out.len() - first;

        out[..first].copy_from_slice(&self.storage[start..start + first]);
        out[first..].copy_from_slice(&self.storage[..rest]);

        self.read_cursor = (start + out.len()) % capacity;
    }
}

/// Statistics about ring occupancy and data loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Unread samples at snapshot time.
    pub available: usize,
    /// Ring capacity in samples.
    pub capacity: usize,
    /// Samples written since creation.
    pub samples_written: u64,
    /// Real samples read since creation (zero padding excluded).
    pub samples_read: u64,
    /// Unread samples lost to drop-oldest overwrites.
    pub samples_overwritten: u64,
    /// Writes that overwrote at least one unread sample.
    pub overflow_events: u64,
}

impl BufferStats {
    /// Get the buffer level (0.0 to 1.0).
    pub fn level(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.available as f64 / self.capacity as f64
        }
    }

    /// Check if any unread data has ever been overwritten.
    pub const fn has_overflowed(&self) -> bool {
        self.samples_overwritten > 0
    }
}

/// Producer half of a split [`SampleRing`].
///
/// Each call holds the ring's lock only for one bounded, allocation-free copy,
/// so the producer may run on a different thread or task than the consumer.
#[derive(Debug)]
pub struct RingWriter {
    ring: Arc<Mutex<SampleRing>>,
}

impl RingWriter {
    /// Append samples; see [`SampleRing::write`].
    #[inline]
    pub fn write(&self, samples: &[i16]) {
        self.ring.lock().write(samples);
    }

    /// Samples currently holding unread data.
    pub fn available(&self) -> usize {
        self.ring.lock().available()
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    /// Snapshot of ring statistics.
    pub fn stats(&self) -> BufferStats {
        self.ring.lock().stats()
    }
}

/// Consumer half of a split [`SampleRing`].
#[derive(Debug)]
pub struct RingReader {
    ring: Arc<Mutex<SampleRing>>,
}

impl RingReader {
    /// Pop samples with zero padding; see [`SampleRing::read`].
    #[inline]
    pub fn read(&self, out: &mut [i16]) -> usize {
        self.ring.lock().read(out)
    }

    /// All-or-nothing read under a single lock; see [`SampleRing::try_read_exact`].
    #[inline]
    pub fn try_read_exact(&self, out: &mut [i16]) -> bool {
        self.ring.lock().try_read_exact(out)
    }

    /// Samples currently holding unread data.
    pub fn available(&self) -> usize {
        self.ring.lock().available()
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    /// Snapshot of ring statistics.
    pub fn stats(&self) -> BufferStats {
        self.ring.lock().stats()
    }

    /// Discard all unread data.
    pub fn clear(&self) {
        self.ring.lock().clear();
    }
}
