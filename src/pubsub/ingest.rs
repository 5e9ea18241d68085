//! TCP ingest: accepts length-prefixed publish frames and forwards them to the feed

use super::Publisher;
use anyhow::Result;
use mdm_shared::codec::FrameDecoder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Listens for producers publishing check-in events over TCP
pub struct IngestListener {
    listener: TcpListener,
}

impl IngestListener {
    /// Bind the listener without accepting yet
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until cancelled
    pub async fn run(self, publisher: Arc<dyn Publisher>, shutdown: CancellationToken) -> Result<()> {
        info!(addr = %self.local_addr()?, "Ingest listening");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Ingest listener stopping");
                    break;
                }
                accepted = self.listener.accept() => {
                    let (socket, addr) = accepted?;
                    debug!(%addr, "Producer connected");

                    let publisher = publisher.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = shutdown.cancelled() => {}
                            _ = handle_connection(socket, addr, publisher) => {}
                        }
                    });
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(mut socket: TcpStream, addr: SocketAddr, publisher: Arc<dyn Publisher>) {
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; 4096];

    loop {
        match socket.read(&mut buf).await {
            Ok(0) => {
                debug!(%addr, "Producer disconnected");
                return;
            }
            Ok(n) => {
                decoder.extend(&buf[..n]);

                // Publish all complete frames
                loop {
                    match decoder.decode_next() {
                        Ok(Some(request)) => {
                            match publisher.publish(&request.topic, request.message).await {
                                Ok(0) => debug!(%addr, topic = %request.topic, "No subscribers for frame"),
                                Ok(_) => {}
                                Err(e) => warn!(%addr, topic = %request.topic, error = %e, "Dropping frame"),
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            error!(%addr, error = %e, "Malformed frame, closing connection");
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                error!(%addr, error = %e, "Read error");
                return;
            }
        }
    }
}
