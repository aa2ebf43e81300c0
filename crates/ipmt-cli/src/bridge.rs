//! Serial-over-TCP bridge.
//!
//! A mote UART exposed on a TCP port carries the raw HDLC byte stream in both
//! directions. `serve` puts a simulated mote behind such a port; `connect`
//! attaches a host link to one.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ipmt_link::{BufferedTransport, LinkConfig, MoteLink, Session};
use ipmt_sim::{SimConfig, SimulatedMote};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Uptime tick of a served mote.
const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Transport writing host frames to the socket writer task.
pub type TcpTransport = BufferedTransport<Box<dyn FnMut(Vec<u8>) + Send>>;

// ============================================================================
// Serve
// ============================================================================

/// Accept clients one at a time, each talking to a freshly booted mote.
pub async fn serve(address: &str, sim: SimConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("simulated mote listening on {}", listener.local_addr()?);
    serve_on(listener, sim).await
}

async fn serve_on(listener: TcpListener, sim: SimConfig) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "client connected");

        let mote = SimulatedMote::from_config(&sim)?;
        if let Err(e) = serve_connection(stream, mote).await {
            warn!(%peer, "connection error: {}", e);
        }
        info!(%peer, "client disconnected");
    }
}

async fn serve_connection(mut stream: TcpStream, mut mote: SimulatedMote) -> io::Result<()> {
    let (mut reader, mut writer) = stream.split();
    let mut read_buf = [0u8; 1024];
    let mut clock = tokio::time::interval(CLOCK_TICK);

    // Boot event, if configured
    writer.write_all(&mote.take_output()).await?;

    loop {
        tokio::select! {
            result = reader.read(&mut read_buf) => {
                match result? {
                    0 => return Ok(()),
                    n => mote.feed(&read_buf[..n]),
                }
            }
            _ = clock.tick() => {
                mote.advance(1);
            }
        }

        let output = mote.take_output();
        if !output.is_empty() {
            writer.write_all(&output).await?;
            writer.flush().await?;
        }
    }
}

// ============================================================================
// Connect
// ============================================================================

/// Connect to a bridge and return a host link session driven by background
/// reader and writer tasks.
pub async fn connect(address: &str, config: LinkConfig) -> anyhow::Result<Session<TcpTransport>> {
    let stream = TcpStream::connect(address)
        .await
        .with_context(|| format!("connecting to {}", address))?;
    stream.set_nodelay(true)?;
    info!("connected to {}", address);

    let (mut reader, mut writer) = stream.into_split();
    let (wire_tx, mut wire_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let transport: TcpTransport = BufferedTransport::new(Box::new(move |chunk| {
        if wire_tx.send(chunk).is_err() {
            debug!("socket writer gone, frame dropped");
        }
    }));
    let (link, events) = MoteLink::with_channel(transport, config);
    let link = Arc::new(link);

    tokio::spawn(async move {
        while let Some(chunk) = wire_rx.recv().await {
            if let Err(e) = writer.write_all(&chunk).await {
                warn!("socket write failed: {}", e);
                return;
            }
        }
    });

    // Holds only a weak handle so the task ends with the session
    let weak = Arc::downgrade(&link);
    tokio::spawn(async move {
        let mut read_buf = [0u8; 1024];
        loop {
            let n = match reader.read(&mut read_buf).await {
                Ok(0) => {
                    info!("bridge closed the connection");
                    return;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("socket read failed: {}", e);
                    return;
                }
            };
            let Some(link) = weak.upgrade() else {
                return;
            };
            link.on_bytes(&read_buf[..n]);
        }
    });

    Ok(Session::new(link, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipmt_link::{Command, GetParameter, Notification, ReplyData, EVENT_BOOT};

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connect_to_served_mote() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let sim = SimConfig {
            network_id: 77,
            ..SimConfig::default()
        };
        tokio::spawn(serve_on(listener, sim));

        let mut session = connect(&address, LinkConfig::default()).await.unwrap();
        tokio::task::spawn_blocking(move || {
            let boot = session.next_notification(TIMEOUT).unwrap().unwrap();
            assert!(matches!(
                boot.notification,
                Notification::Events(ev) if ev.events == EVENT_BOOT
            ));

            let reply = session
                .request(&Command::GetParameter(GetParameter::NetworkId), TIMEOUT)
                .unwrap();
            assert_eq!(reply.data, Some(ReplyData::NetworkId(77)));
            assert_eq!(session.link().stats().acks_sent, 1);
        })
        .await
        .unwrap();
    }
}
