//! ipmtctl - drive a SmartMesh IP mote over its serial API
//!
//! The mote UART is reached through a serial-over-TCP bridge (`--connect`).
//! Without one, commands run against an in-process simulated mote.
//!
//! # Usage
//!
//! ```bash
//! # Expose a simulated mote on the default port
//! ipmtctl serve
//!
//! # Query it from another terminal
//! ipmtctl --connect 127.0.0.1:9100 info
//! ipmtctl --connect 127.0.0.1:9100 get networkId
//! ipmtctl --connect 127.0.0.1:9100 join
//! ipmtctl --connect 127.0.0.1:9100 send --port 60000 "hello"
//! ```

mod bridge;
mod config;
mod ops;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ipmt_link::{ByteTransport, Session};
use ipmt_sim::{SimulatedMote, ThreadedMote};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

/// SmartMesh IP mote serial API client
#[derive(Parser, Debug)]
#[command(name = "ipmtctl")]
#[command(about = "Drive a SmartMesh IP mote over its serial API")]
#[command(version)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial-over-TCP bridge address (host:port)
    #[arg(long)]
    connect: Option<String>,

    /// Reply timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve a simulated mote on a TCP port
    Serve {
        /// Listen address (host:port)
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Show mote identity, network and state
    Info,

    /// Read one parameter by its API name (e.g. networkId, moteStatus)
    Get { param: String },

    /// Set the network id
    SetNetworkId { network_id: u16 },

    /// Join the network and wait until operational
    Join,

    /// Send a packet to the manager
    Send {
        /// Local port to bind
        #[arg(short, long, default_value = "60000")]
        port: u16,

        /// Treat the payload as hex
        #[arg(long)]
        hex: bool,

        payload: String,
    },

    /// Print notifications as they arrive
    Listen {
        /// Stop after this many notifications
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run<T: ByteTransport>(
    session: &mut Session<T>,
    command: Commands,
    timeout: Duration,
) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Info => ops::info(session, timeout, &mut out)?,
        Commands::Get { param } => ops::get_param(session, &param, timeout, &mut out)?,
        Commands::SetNetworkId { network_id } => {
            ops::set_network_id(session, network_id, timeout, &mut out)?
        }
        Commands::Join => ops::join(session, timeout, &mut out)?,
        Commands::Send { port, hex, payload } => {
            let payload = if hex {
                hex::decode(payload.trim()).context("payload is not valid hex")?
            } else {
                payload.into_bytes()
            };
            ops::send(session, payload, port, timeout, &mut out)?
        }
        Commands::Listen { count } => ops::listen(session, count, &mut out)?,
        Commands::Serve { .. } => anyhow::bail!("serve does not run over a session"),
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let mut config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if let Some(address) = args.connect {
        config.connect = Some(address);
    }
    if let Some(ms) = args.timeout_ms {
        config.reply_timeout_ms = ms;
    }
    let timeout = config.reply_timeout();

    if let Commands::Serve { listen } = args.command {
        let address = listen.unwrap_or(config.serve_address);
        return bridge::serve(&address, config.sim).await;
    }

    let command = args.command;
    match config.connect {
        Some(address) => {
            let mut session = bridge::connect(&address, config.link).await?;
            tokio::task::spawn_blocking(move || run(&mut session, command, timeout)).await?
        }
        None => {
            info!("no bridge configured, using a simulated mote");
            let mote = SimulatedMote::from_config(&config.sim)?;
            let (_mote, mut session) = ThreadedMote::spawn(mote, config.link);
            tokio::task::spawn_blocking(move || run(&mut session, command, timeout)).await?
        }
    }
}
