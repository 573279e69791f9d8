//! Tests for the UDP transport, the sending client and the bridge loop.

use super::super::bridge::*;
use super::super::error::StreamError;
use super::super::sender::BurstSender;
use super::super::sinks::{ChannelSink, NullSink};
use super::super::sources::{UdpBurstSource, UdpState};
use super::super::traits::FrameSink;
use super::{le_bytes, ramp};
use crate::config::{BridgeConfig, MAX_PAYLOAD_BYTES, SAMPLE_WIDTH};
use crate::error::BridgeError;
use std::time::Duration;

fn loopback_config() -> BridgeConfig {
    BridgeConfig::loopback().with_activity_log_interval(0)
}

#[tokio::test]
async fn test_service_pull_without_network() {
    let (sink, frames) = ChannelSink::bounded(8);
    let mut bridge = AudioBridge::new(loopback_config(), sink).unwrap();

    assert_eq!(bridge.ingest(&le_bytes(&[42; 512])), 512);
    bridge.service_pull().unwrap();
    bridge.service_pull().unwrap();

    let first = frames.try_recv().unwrap();
    let second = frames.try_recv().unwrap();
    assert!(first.iter().all(|&s| s == 42));
    assert!(second.iter().all(|&s| s == 0));

    let stats = bridge.stats();
    assert_eq!(stats.consumer.real_frames, 1);
    assert_eq!(stats.consumer.silent_frames, 1);
    assert_eq!(stats.sink.frames_received, 2);
    assert!((stats.silence_ratio() - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_loopback_end_to_end() {
    let (sink, frames) = ChannelSink::bounded(256);
    let mut bridge = AudioBridge::new(loopback_config(), sink).unwrap();
    let address = bridge.bind().await.unwrap();
    let stop = bridge.shutdown_token();

    let audio = ramp(1, 2048);
    let to_send = audio.clone();
    let sender_task = tokio::spawn(async move {
        let mut sender = BurstSender::connect(address).await.unwrap();
        let sent = sender.send_samples(&to_send).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        stop.cancel();
        (sent, sender.stats())
    });

    let stats = bridge.run().await.unwrap();
    let (sent, sender_stats) = sender_task.await.unwrap();

    assert_eq!(sent, 4);
    assert_eq!(sender_stats.packets_sent, 4);
    assert_eq!(sender_stats.samples_sent, 2048);
    assert_eq!(bridge.state(), &BridgeState::Stopped);
    assert_eq!(stats.packets_received, 4);
    assert_eq!(stats.producer.samples, 2048);

    let mut received = Vec::new();
    while let Ok(frame) = frames.try_recv() {
        assert_eq!(frame.len(), 512);
        if frame.iter().any(|&s| s != 0) {
            assert!(frame.iter().all(|&s| s != 0), "frame mixed silence and audio");
            received.extend(frame);
        }
    }
    assert_eq!(received, audio);
    assert_eq!(stats.consumer.real_frames, 4);
}

#[tokio::test]
async fn test_run_twice_is_rejected() {
    let mut bridge = AudioBridge::new(loopback_config(), NullSink::default()).unwrap();
    let stop = bridge.shutdown_token();
    stop.cancel();

    bridge.run().await.unwrap();
    assert_eq!(bridge.state(), &BridgeState::Stopped);

    let err = bridge.run().await.unwrap_err();
    assert!(matches!(err, StreamError::InvalidState(_)));
}

#[tokio::test]
async fn test_bind_failure_is_fatal() {
    let mut first = AudioBridge::new(loopback_config(), NullSink::default()).unwrap();
    let taken = first.bind().await.unwrap();

    let config = loopback_config().with_bind(taken.ip(), taken.port());
    let mut second = AudioBridge::new(config, NullSink::default()).unwrap();
    let err = second.run().await.unwrap_err();

    assert!(matches!(err, StreamError::Bind { .. }));
    assert!(err.is_fatal());
    assert!(second.state().is_error());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = loopback_config().with_buffer_capacity(10);
    let result = AudioBridge::new(config, NullSink::default());
    assert!(matches!(result, Err(StreamError::Config(_))));
}

#[tokio::test]
async fn test_sink_errors_are_recovered() {
    struct FailingSink {
        calls: u64,
    }

    impl FrameSink for FailingSink {
        fn send_frame(&mut self, _frame: &[i16]) -> crate::streaming::StreamResult<()> {
            self.calls += 1;
            Err(StreamError::host_link("endpoint not ready"))
        }
    }

    let mut bridge =
        AudioBridge::new(loopback_config(), FailingSink { calls: 0 }).unwrap();
    let stop = bridge.shutdown_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.cancel();
    });

    let stats = bridge.run().await.unwrap();
    assert!(stats.sink_errors >= 1);
    assert_eq!(stats.sink_errors, bridge.sink().calls);
}

#[tokio::test]
async fn test_source_requires_bind() {
    let mut source = UdpBurstSource::new(&loopback_config()).unwrap();
    assert_eq!(source.connection_state(), UdpState::Unbound);
    assert!(source.local_addr().is_none());

    let err = source.recv_burst().await.unwrap_err();
    assert!(matches!(err, StreamError::InvalidState(_)));
}

#[tokio::test]
async fn test_source_receives_raw_datagram() {
    let mut source = UdpBurstSource::new(&loopback_config()).unwrap();
    let address = source.bind().await.unwrap();
    assert_eq!(source.connection_state(), UdpState::Bound);

    let mut sender = BurstSender::connect(address).await.unwrap();
    sender.send_raw(&[1, 0, 2, 0, 3]).await.unwrap();

    let payload = source
        .recv_burst_timeout(Duration::from_secs(2))
        .await
        .unwrap()
        .unwrap()
        .to_vec();
    assert_eq!(payload, vec![1u8, 0, 2, 0, 3]);
    assert_eq!(source.packet_stats(), (1, 5, 0));
    assert!(source.last_peer().is_some());
}

#[tokio::test]
async fn test_source_timeout_returns_none() {
    let mut source = UdpBurstSource::new(&loopback_config()).unwrap();
    source.bind().await.unwrap();

    let payload = source
        .recv_burst_timeout(Duration::from_millis(20))
        .await
        .unwrap();
    assert!(payload.is_none());
}

#[tokio::test]
async fn test_sender_quantises_floats() {
    let mut source = UdpBurstSource::new(&loopback_config()).unwrap();
    let address = source.bind().await.unwrap();

    let mut sender = BurstSender::with_block_size(address, 2).await.unwrap();
    assert_eq!(sender.send_f32(&[1.0, -1.0, 0.0]).await.unwrap(), 2);

    let first = source.recv_burst().await.unwrap().to_vec();
    assert_eq!(first, le_bytes(&[i16::MAX, -i16::MAX]));
    let second = source.recv_burst().await.unwrap().to_vec();
    assert_eq!(second, le_bytes(&[0]));
    assert_eq!(sender.stats().samples_sent, 3);
}

#[tokio::test]
async fn test_sender_rejects_zero_block() {
    let result = BurstSender::with_block_size("127.0.0.1:5005".parse().unwrap(), 0).await;
    assert!(matches!(result, Err(StreamError::Config(_))));
}

#[tokio::test]
async fn test_sender_rejects_block_larger_than_datagram() {
    let target = "127.0.0.1:5005".parse().unwrap();
    let largest = MAX_PAYLOAD_BYTES / SAMPLE_WIDTH;

    let too_big = BurstSender::with_block_size(target, largest + 1).await;
    match too_big {
        Err(StreamError::Config(BridgeError::InvalidParameter(msg))) => {
            assert!(msg.contains("block_size"), "{msg}")
        }
        other => panic!("expected block_size rejection, got {:?}", other.err()),
    }

    let sender = BurstSender::with_block_size(target, largest).await.unwrap();
    assert_eq!(sender.block_size(), 736);
}

#[tokio::test]
async fn test_source_drops_oversized_datagram() {
    let config = BridgeConfig {
        max_payload_bytes: 8,
        ..loopback_config()
    };
    let mut source = UdpBurstSource::new(&config).unwrap();
    let address = source.bind().await.unwrap();

    let mut sender = BurstSender::connect(address).await.unwrap();
    sender.send_raw(&[1u8; 12]).await.unwrap();
    sender.send_raw(&le_bytes(&[1, 2, 3, 4])).await.unwrap();

    let err = source.recv_burst().await.unwrap_err();
    assert!(matches!(err, StreamError::Protocol { .. }));
    assert!(err.is_recoverable());
    assert_eq!(source.oversized_datagrams(), 1);

    // A payload of exactly the limit still fits.
    let payload = source.recv_burst().await.unwrap().to_vec();
    assert_eq!(payload, le_bytes(&[1, 2, 3, 4]));
    assert_eq!(source.oversized_datagrams(), 1);
}

#[tokio::test]
async fn test_bridge_counts_oversized_datagrams() {
    let config = BridgeConfig {
        max_payload_bytes: 8,
        ..loopback_config()
    };
    let mut bridge = AudioBridge::new(config, NullSink::default()).unwrap();
    let address = bridge.bind().await.unwrap();
    let stop = bridge.shutdown_token();

    tokio::spawn(async move {
        let mut sender = BurstSender::connect(address).await.unwrap();
        sender.send_raw(&le_bytes(&ramp(1, 6))).await.unwrap();
        sender.send_raw(&le_bytes(&ramp(1, 4))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.cancel();
    });

    let stats = bridge.run().await.unwrap();
    assert_eq!(stats.packets_received, 2);
    assert_eq!(stats.oversized_datagrams, 1);
    assert_eq!(stats.receive_errors, 1);
    assert_eq!(stats.producer.samples, 4);
}

#[tokio::test]
async fn test_set_interface_reaches_sink_without_touching_ring() {
    #[derive(Default)]
    struct RecordingSink {
        interfaces: Vec<(u8, u8)>,
    }

    impl FrameSink for RecordingSink {
        fn send_frame(&mut self, _frame: &[i16]) -> crate::streaming::StreamResult<()> {
            Ok(())
        }

        fn set_interface(&mut self, interface: u8, alt_setting: u8) {
            self.interfaces.push((interface, alt_setting));
        }
    }

    let mut bridge = AudioBridge::new(loopback_config(), RecordingSink::default()).unwrap();
    bridge.ingest(&le_bytes(&ramp(1, 100)));

    bridge.set_interface(1, 1);
    bridge.set_interface(1, 0);

    assert_eq!(bridge.sink().interfaces, vec![(1, 1), (1, 0)]);
    assert_eq!(bridge.consumer().buffer_stats().available, 100);
}

#[test]
fn test_error_warnings_are_rate_limited() {
    assert!(warn_due(1));
    assert!(!warn_due(2));
    assert!(!warn_due(ERROR_LOG_INTERVAL - 1));
    assert!(warn_due(ERROR_LOG_INTERVAL));
    assert!(!warn_due(ERROR_LOG_INTERVAL + 1));
    assert!(warn_due(ERROR_LOG_INTERVAL * 3));

    let warned = (1..=1_000).filter(|&streak| warn_due(streak)).count();
    assert_eq!(warned, 11);
}
