//! Tests for the producer and consumer adapters.

use super::super::buffers::SampleRing;
use super::super::consumer::*;
use super::super::producer::*;
use super::{le_bytes, ramp, sized_config};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

fn adapters(config: &BridgeConfig) -> (BurstProducer, FrameConsumer) {
    let (writer, reader) = SampleRing::with_config(config).unwrap().split();
    (
        BurstProducer::new(writer, config).unwrap(),
        FrameConsumer::new(reader, config).unwrap(),
    )
}

#[test]
fn test_scenario_full_frame_of_real_audio() {
    let config = sized_config(512, 4096);
    let (mut producer, mut consumer) = adapters(&config);

    producer.on_samples(&[100; 512]);
    let frame = consumer.pull_frame();

    assert_eq!(frame.len(), 512);
    assert!(frame.iter().all(|&s| s == 100));
    assert_eq!(consumer.buffer_stats().available, 0);
    assert_eq!(consumer.state(), FeedState::Feeding);
}

#[test]
fn test_scenario_no_writes_gives_silence() {
    let config = sized_config(512, 4096);
    let (_producer, mut consumer) = adapters(&config);

    let frame = consumer.pull_frame();
    assert_eq!(frame.len(), 512);
    assert!(frame.iter().all(|&s| s == 0));
    assert_eq!(consumer.buffer_stats().available, 0);
    assert_eq!(consumer.state(), FeedState::Starved);
}

#[test]
fn test_scenario_overflow_then_drain() {
    let config = sized_config(512, 4096);
    let mut ring = SampleRing::with_config(&config).unwrap();
    ring.write(&ramp(0, 5000));
    let (_writer, reader) = ring.split();
    let mut consumer = FrameConsumer::new(reader, &config).unwrap();

    // The earliest 5000 - 4096 = 904 samples were overwritten.
    for k in 0..8 {
        let frame = consumer.pull_frame();
        let expected = ramp(904 + (k * 512) as i16, 512);
        assert_eq!(frame, expected.as_slice(), "frame {k}");
    }

    assert_eq!(consumer.buffer_stats().available, 0);
    assert_eq!(consumer.buffer_stats().samples_overwritten, 904);
    assert!(consumer.pull_frame().iter().all(|&s| s == 0));
    assert_eq!(consumer.stats().real_frames, 8);
    assert_eq!(consumer.stats().silent_frames, 1);
}

#[test]
fn test_overflow_through_producer_bursts() {
    let config = sized_config(512, 4096);
    let (mut producer, mut consumer) = adapters(&config);

    // 10000 bytes, far larger than one datagram's scratch buffer.
    let queued = producer.on_burst(&le_bytes(&ramp(0, 5000)));
    assert_eq!(queued, 5000);

    let first = consumer.pull_frame();
    assert_eq!(first, ramp(904, 512).as_slice());
}

#[test]
fn test_partial_frame_is_not_drained() {
    let config = sized_config(8, 32);
    let (mut producer, mut consumer) = adapters(&config);

    producer.on_samples(&ramp(1, 7));
    let frame = consumer.pull_frame();
    assert!(frame.iter().all(|&s| s == 0));
    assert_eq!(consumer.buffer_stats().available, 7);

    producer.on_samples(&[8]);
    assert_eq!(consumer.pull_frame(), ramp(1, 8).as_slice());
    assert_eq!(consumer.buffer_stats().available, 0);
}

#[test]
fn test_frames_never_mix_silence_and_audio() {
    let config = sized_config(16, 64);
    let (mut producer, mut consumer) = adapters(&config);

    for burst_len in [3usize, 20, 1, 9, 40, 0, 7, 15, 2] {
        producer.on_samples(&ramp(1, burst_len));
        let frame = consumer.pull_frame();
        let zeros = frame.iter().filter(|&&s| s == 0).count();
        assert!(zeros == 0 || zeros == frame.len(), "mixed frame {frame:?}");
    }
}

#[test]
fn test_silence_frame_is_all_zero_for_any_size() {
    for frame_size in [1usize, 2, 64, 160, 512, 1000] {
        let config = sized_config(frame_size, frame_size * 8);
        let (_producer, mut consumer) = adapters(&config);

        assert_eq!(consumer.silence().len(), frame_size);
        assert!(consumer.silence().as_slice().iter().all(|&s| s == 0));

        let expected = vec![0i16; frame_size];
        assert_eq!(consumer.pull_frame(), expected.as_slice());
        assert_eq!(consumer.pull_frame(), expected.as_slice());
    }
}

#[test]
fn test_feed_state_follows_instantaneous_level() {
    let config = sized_config(4, 16);
    let (mut producer, mut consumer) = adapters(&config);

    consumer.pull_frame();
    assert_eq!(consumer.state(), FeedState::Starved);

    producer.on_samples(&ramp(1, 8));
    consumer.pull_frame();
    assert_eq!(consumer.state(), FeedState::Feeding);
    consumer.pull_frame();
    assert_eq!(consumer.state(), FeedState::Feeding);

    consumer.pull_frame();
    assert_eq!(consumer.state(), FeedState::Starved);

    producer.on_samples(&ramp(1, 4));
    consumer.pull_frame();
    assert_eq!(consumer.state(), FeedState::Feeding);
    consumer.pull_frame();

    let stats = consumer.stats();
    assert_eq!(stats.frames_pulled, 6);
    assert_eq!(stats.real_frames, 3);
    assert_eq!(stats.silent_frames, 3);
    assert_eq!(stats.starvation_episodes, 2);
}

#[test]
fn test_interface_change_does_not_touch_stream() {
    let config = sized_config(4, 16);
    let (mut producer, mut consumer) = adapters(&config);
    producer.on_samples(&[1, 2, 3, 4]);

    consumer.set_interface(1, 0);
    consumer.set_interface(1, 1);

    assert_eq!(consumer.buffer_stats().available, 4);
    assert_eq!(consumer.pull_frame(), &[1i16, 2, 3, 4]);
}

#[test]
fn test_producer_discards_trailing_byte() {
    let config = sized_config(4, 16);
    let (mut producer, consumer) = adapters(&config);

    let mut payload = le_bytes(&[10, -10, 300]);
    payload.push(0x7f);
    assert_eq!(producer.on_burst(&payload), 3);

    let stats = producer.stats();
    assert_eq!(stats.bursts, 1);
    assert_eq!(stats.bytes, 7);
    assert_eq!(stats.samples, 3);
    assert_eq!(stats.discarded_bytes, 1);
    assert_eq!(consumer.buffer_stats().available, 3);
}

#[test]
fn test_producer_counts_empty_and_single_byte_bursts() {
    let config = sized_config(4, 16);
    let (mut producer, consumer) = adapters(&config);

    assert_eq!(producer.on_burst(&[]), 0);
    assert_eq!(producer.on_burst(&[0xff]), 0);

    assert_eq!(producer.bursts(), 2);
    assert_eq!(producer.stats().discarded_bytes, 1);
    assert_eq!(consumer.buffer_stats().samples_written, 0);
}

#[test]
fn test_producer_splits_oversized_payload_in_order() {
    let config = BridgeConfig {
        max_payload_bytes: 10,
        ..sized_config(4, 64)
    };
    let (mut producer, mut consumer) = adapters(&config);

    let mut payload = le_bytes(&ramp(1, 23));
    payload.push(0);
    assert_eq!(producer.on_burst(&payload), 23);
    assert_eq!(producer.stats().discarded_bytes, 1);

    for k in 0..5 {
        assert_eq!(consumer.pull_frame(), ramp(1 + 4 * k, 4).as_slice());
    }
    assert_eq!(consumer.buffer_stats().available, 3);
}

#[test]
fn test_burst_counter_is_monotonic() {
    let config = sized_config(4, 16).with_activity_log_interval(2);
    let (mut producer, _consumer) = adapters(&config);

    let mut previous = producer.bursts();
    for len in 0..10 {
        producer.on_burst(&le_bytes(&ramp(0, len)));
        assert_eq!(producer.bursts(), previous + 1);
        previous = producer.bursts();
    }
}

#[test]
fn test_adapters_reject_invalid_config() {
    let good = sized_config(4, 16);
    let bad = sized_config(0, 16);
    let (writer, reader) = SampleRing::with_config(&good).unwrap().split();

    assert!(BurstProducer::new(writer, &bad).is_err());
    assert!(FrameConsumer::new(reader, &bad).is_err());
    assert!(SampleRing::with_config(&sized_config(8, 4)).is_err());
}

#[test]
fn test_adapters_reject_ring_smaller_than_frame() {
    let config = sized_config(16, 64);
    let (writer, reader) = SampleRing::new(8).unwrap().split();

    let producer = BurstProducer::new(writer, &config);
    let consumer = FrameConsumer::new(reader, &config);

    match consumer {
        Err(BridgeError::InvalidConfig(msg)) => assert!(msg.contains("frame_size"), "{msg}"),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
    assert!(matches!(producer, Err(BridgeError::InvalidConfig(_))));
}

#[test]
fn test_adapters_accept_ring_of_exactly_one_frame() {
    let config = sized_config(16, 64);
    let (writer, reader) = SampleRing::new(16).unwrap().split();

    let mut producer = BurstProducer::new(writer, &config).unwrap();
    let mut consumer = FrameConsumer::new(reader, &config).unwrap();

    producer.on_samples(&ramp(1, 16));
    assert_eq!(consumer.pull_frame(), ramp(1, 16).as_slice());
}
