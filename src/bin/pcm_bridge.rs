//! Command-line entry point: run the bridge, or stream PCM from stdin to one.

use clap::{Parser, Subcommand};
use pcm_bridge::streaming::{AudioBridge, BurstSender, FrameSink, NullSink, WriterSink};
use pcm_bridge::{BridgeConfig, StreamResult, config};
use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(version, about = "Bridge bursty UDP PCM into a fixed-cadence frame stream")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Receive bursts over UDP and emit one frame per interval.
    Serve {
        /// Address to bind.
        #[arg(long, env = "PCM_BRIDGE_BIND", default_value = "0.0.0.0")]
        bind: IpAddr,
        /// UDP port to listen on.
        #[arg(long, env = "PCM_BRIDGE_PORT", default_value_t = config::UDP_PORT)]
        port: u16,
        /// Sample rate in Hz.
        #[arg(long, default_value_t = config::SAMPLE_RATE)]
        sample_rate: u32,
        /// Samples per frame pulled by the host.
        #[arg(long, default_value_t = config::FRAME_SIZE)]
        frame_size: usize,
        /// Ring capacity in frames.
        #[arg(long, default_value_t = config::RING_FRAMES)]
        ring_frames: usize,
        /// Bursts between activity log lines (0 disables).
        #[arg(long, default_value_t = config::ACTIVITY_LOG_INTERVAL)]
        log_interval: u64,
        /// Write frames to stdout as little-endian PCM instead of discarding them.
        #[arg(long)]
        stdout: bool,
    },
    /// Read little-endian i16 PCM from stdin and send it to a bridge in real time.
    Send {
        /// Bridge address, e.g. 192.168.1.50:5005.
        target: SocketAddr,
        /// Samples per datagram.
        #[arg(long, default_value_t = config::FRAME_SIZE)]
        block_size: usize,
        /// Sample rate used to pace sending.
        #[arg(long, default_value_t = config::SAMPLE_RATE)]
        sample_rate: u32,
    },
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve {
            bind,
            port,
            sample_rate,
            frame_size,
            ring_frames,
            log_interval,
            stdout,
        } => {
            let config = BridgeConfig::default()
                .with_bind(bind, port)
                .with_sample_rate(sample_rate)
                .with_frame_size(frame_size)
                .with_ring_frames(ring_frames)
                .with_activity_log_interval(log_interval);
            if stdout {
                serve(config, WriterSink::new(std::io::stdout())).await
            } else {
                serve(config, NullSink::default()).await
            }
        }
        Command::Send {
            target,
            block_size,
            sample_rate,
        } => send(target, block_size, sample_rate).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pcm_bridge failed");
            ExitCode::FAILURE
        }
    }
}

async fn serve<S: FrameSink>(config: BridgeConfig, sink: S) -> StreamResult<()> {
    let mut bridge = AudioBridge::new(config, sink)?;
    bridge.bind().await?;

    let stop = bridge.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        stop.cancel();
    });

    let stats = bridge.run().await?;
    info!(
        runtime_ms = stats.runtime.as_millis() as u64,
        packets = stats.packets_received,
        silence_ratio = stats.silence_ratio(),
        "done"
    );
    Ok(())
}

async fn send(target: SocketAddr, block_size: usize, sample_rate: u32) -> StreamResult<()> {
    let probe = BridgeConfig::default()
        .with_sample_rate(sample_rate)
        .with_frame_size(block_size);
    probe.validate()?;

    let mut sender = BurstSender::with_block_size(target, block_size).await?;
    let mut stdin = tokio::io::stdin();
    let mut bytes = vec![0u8; block_size * config::SAMPLE_WIDTH];
    let mut ticker = tokio::time::interval(probe.frame_interval());

    loop {
        let mut filled = 0;
        while filled < bytes.len() {
            let n = stdin.read(&mut bytes[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            break;
        }

        ticker.tick().await;
        if let Err(e) = sender.send_raw(&bytes[..filled]).await {
            if e.is_fatal() {
                return Err(e);
            }
        }
        if filled < bytes.len() {
            break;
        }
    }

    let stats = sender.stats();
    info!(
        packets = stats.packets_sent,
        errors = stats.send_errors,
        "stopped streaming"
    );
    Ok(())
}
