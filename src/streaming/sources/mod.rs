//! Network transports feeding the producer.

pub mod udp;

pub use udp::{UdpBurstSource, UdpState};
