//! Tests for the streaming module.
//!
//! Covers the sample ring, both adapters, error classification and the
//! UDP bridge end to end.

use crate::config::BridgeConfig;

mod adapter_tests;

#[cfg(feature = "streaming")]
mod bridge_tests;

/// Helper producing `len` consecutive sample values starting at `start`.
pub(crate) fn ramp(start: i16, len: usize) -> Vec<i16> {
    (0..len).map(|i| start.wrapping_add(i as i16)).collect()
}

/// Helper encoding samples the way the transport carries them.
pub(crate) fn le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Helper building a config with the given frame size and ring capacity.
pub(crate) fn sized_config(frame_size: usize, buffer_capacity: usize) -> BridgeConfig {
    BridgeConfig {
        frame_size,
        buffer_capacity,
        activity_log_interval: 0,
        ..BridgeConfig::default()
    }
}
