//! The cooperative poll loop joining the transport, the ring and the host.

use super::{
    buffers::{BufferStats, SampleRing},
    consumer::{ConsumerStats, FrameConsumer},
    error::{StreamError, StreamResult},
    producer::{BurstProducer, ProducerStats},
    sources::UdpBurstSource,
    traits::{FrameSink, SinkMetrics},
};
use crate::config::BridgeConfig;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consecutive errors on one side between repeated warnings.
pub(crate) const ERROR_LOG_INTERVAL: u64 = 100;

/// Whether the `streak`-th consecutive error should be logged at `warn`.
///
/// The first error of a run is always reported, then one in every
/// [`ERROR_LOG_INTERVAL`] while the run lasts.
pub(crate) const fn warn_due(streak: u64) -> bool {
    streak == 1 || streak % ERROR_LOG_INTERVAL == 0
}

/// Represents the current state of a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    /// Built but not yet running
    Idle,
    /// Poll loop is active
    Running,
    /// Poll loop exited after a shutdown request
    Stopped,
    /// Poll loop exited on a fatal error
    Error(String),
}

impl BridgeState {
    /// Check if the bridge can be started
    pub const fn can_start(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Check if the bridge is in an error state
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Bridges UDP bursts into fixed-cadence frames delivered to a [`FrameSink`].
///
/// One task runs [`AudioBridge::run`], which alternates between the host's
/// frame timer and socket receives. Both handlers run to completion before
/// the loop polls again, so ring operations never overlap.
pub struct AudioBridge<S: FrameSink> {
    config: BridgeConfig,
    state: BridgeState,
    source: UdpBurstSource,
    producer: BurstProducer,
    consumer: FrameConsumer,
    sink: S,
    shutdown: CancellationToken,

    start_time: Option<Instant>,
    receive_errors: u64,
    sink_errors: u64,
    receive_streak: u64,
    sink_streak: u64,
}

impl<S: FrameSink> AudioBridge<S> {
    /// Build the ring, both adapters and the (unbound) transport.
    pub fn new(config: BridgeConfig, sink: S) -> StreamResult<Self> {
        let ring = SampleRing::with_config(&config)?;
        let (writer, reader) = ring.split();

        Ok(Self {
            source: UdpBurstSource::new(&config)?,
            producer: BurstProducer::new(writer, &config)?,
            consumer: FrameConsumer::new(reader, &config)?,
            config,
            state: BridgeState::Idle,
            sink,
            shutdown: CancellationToken::new(),
            start_time: None,
            receive_errors: 0,
            sink_errors: 0,
            receive_streak: 0,
            sink_streak: 0,
        })
    }

    /// Bind the transport ahead of [`AudioBridge::run`], returning the local address.
    pub async fn bind(&mut self) -> StreamResult<SocketAddr> {
        self.source.bind().await
    }

    /// Token that stops [`AudioBridge::run`] when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the poll loop until the shutdown token is cancelled or a fatal error occurs.
    ///
    /// Binds the transport first if needed; a bind failure is returned immediately.
    pub async fn run(&mut self) -> StreamResult<BridgeStats> {
        if !self.state.can_start() {
            return Err(StreamError::InvalidState(format!(
                "Cannot start bridge in state {:?}",
                self.state
            )));
        }

        let local = match self.source.bind().await {
            Ok(addr) => addr,
            Err(e) => {
                self.state = BridgeState::Error(e.to_string());
                return Err(e);
            }
        };

        self.state = BridgeState::Running;
        self.start_time = Some(Instant::now());
        let format = self.config.format_info();
        info!(
            address = %local,
            format = %format,
            frame_size = self.config.frame_size,
            frame_bytes = format.bytes_per_frame(self.config.frame_size),
            capacity = self.config.buffer_capacity,
            "bridge running"
        );

        let shutdown = self.shutdown.clone();
        let mut ticker = interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.service_pull() {
                        Ok(()) => self.sink_streak = 0,
                        Err(e) => self.recover(e, ErrorSide::Sink)?,
                    }
                }
                received = self.source.recv_burst() => {
                    let outcome = match received {
                        Ok(payload) => {
                            self.producer.on_burst(payload);
                            Ok(())
                        }
                        Err(e) => Err(e),
                    };
                    match outcome {
                        Ok(()) => self.receive_streak = 0,
                        Err(e) => self.recover(e, ErrorSide::Receive)?,
                    }
                }
            }
        }

        if let Err(e) = self.sink.flush() {
            warn!(error = %e, "failed to flush sink on shutdown");
        }
        self.state = BridgeState::Stopped;

        let stats = self.stats();
        info!(
            bursts = stats.producer.bursts,
            frames = stats.consumer.frames_pulled,
            silent_frames = stats.consumer.silent_frames,
            overwritten = stats.buffer.samples_overwritten,
            "bridge stopped"
        );
        Ok(stats)
    }

    /// Serve one host pull: take a frame from the consumer and hand it to the sink.
    pub fn service_pull(&mut self) -> StreamResult<()> {
        let frame = self.consumer.pull_frame();
        self.sink.send_frame(frame)
    }

    /// Feed one burst payload to the producer, bypassing the socket.
    pub fn ingest(&mut self, payload: &[u8]) -> usize {
        self.producer.on_burst(payload)
    }

    /// Forward a host interface activation change to the consumer log and the sink.
    pub fn set_interface(&mut self, interface: u8, alt_setting: u8) {
        self.consumer.set_interface(interface, alt_setting);
        self.sink.set_interface(interface, alt_setting);
    }

    /// Get the current bridge state.
    pub const fn state(&self) -> &BridgeState {
        &self.state
    }

    /// Configuration the bridge was built with.
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Bound transport address, if bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.source.local_addr()
    }

    /// The consumer adapter.
    pub const fn consumer(&self) -> &FrameConsumer {
        &self.consumer
    }

    /// The producer adapter.
    pub const fn producer(&self) -> &BurstProducer {
        &self.producer
    }

    /// The frame sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Get bridge statistics.
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            runtime: self.start_time.map(|t| t.elapsed()).unwrap_or_default(),
            producer: self.producer.stats(),
            consumer: self.consumer.stats(),
            buffer: self.consumer.buffer_stats(),
            sink: self.sink.metrics(),
            packets_received: self.source.packet_stats().0,
            oversized_datagrams: self.source.oversized_datagrams(),
            receive_errors: self.receive_errors,
            sink_errors: self.sink_errors,
        }
    }

    fn recover(&mut self, error: StreamError, side: ErrorSide) -> StreamResult<()> {
        if error.is_fatal() {
            self.state = BridgeState::Error(error.to_string());
            return Err(error);
        }

        let streak = match side {
            ErrorSide::Receive => {
                self.receive_errors += 1;
                self.receive_streak += 1;
                self.receive_streak
            }
            ErrorSide::Sink => {
                self.sink_errors += 1;
                self.sink_streak += 1;
                self.sink_streak
            }
        };

        if warn_due(streak) {
            warn!(error = %error, side = ?side, streak, "recovered from stream error");
        } else {
            debug!(error = %error, side = ?side, streak, "recovered from stream error");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum ErrorSide {
    Receive,
    Sink,
}

/// Statistics for monitoring a bridge.
#[derive(Debug, Clone)]
pub struct BridgeStats {
    /// Time since the poll loop started.
    pub runtime: Duration,
    /// Producer counters.
    pub producer: ProducerStats,
    /// Consumer counters.
    pub consumer: ConsumerStats,
    /// Ring occupancy and loss counters.
    pub buffer: BufferStats,
    /// Sink counters.
    pub sink: SinkMetrics,
    /// Datagrams received by the transport.
    pub packets_received: u64,
    /// Datagrams dropped for exceeding the payload limit.
    pub oversized_datagrams: u64,
    /// Recoverable receive errors.
    pub receive_errors: u64,
    /// Recoverable sink errors.
    pub sink_errors: u64,
}

impl BridgeStats {
    /// Fraction of pulled frames that were silence (0.0 to 1.0).
    pub fn silence_ratio(&self) -> f64 {
        if self.consumer.frames_pulled == 0 {
            0.0
        } else {
            self.consumer.silent_frames as f64 / self.consumer.frames_pulled as f64
        }
    }
}
