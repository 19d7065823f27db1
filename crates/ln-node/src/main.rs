//! The listener binary: binds a TCP socket, accepts client connections, and
//! runs each on its own worker, handing off every framed request to the
//! router against a single shared [`Node`].
//!
//! Mirrors `akoin_node_listener.py`'s accept loop and thread-pool-per-client
//! model, with `tokio::spawn` standing in for the thread pool and a short
//! accept timeout (spec §5) so an interrupt is noticed promptly instead of
//! blocking inside `accept()` forever.

use std::io::ErrorKind;
use std::sync::Arc;

use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use ln_node::{config::NodeConfig, node::Node, router};
use ln_transport::{frame, TransportError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = NodeConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(ln_node::config::tracing_level(config.logging_level))
        .init();

    let listener = bind_listener(&config).await?;
    let local_addr = listener.local_addr()?;

    let node = Arc::new(Node::new(config.clone()));
    info!(
        address = node.blockchain_address(),
        %local_addr,
        "node listening"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                return Ok(());
            }
            accepted = tokio::time::timeout(config.accept_timeout(), listener.accept()) => {
                match accepted {
                    Ok(Ok((stream, peer_addr))) => {
                        let node = Arc::clone(&node);
                        let config = config.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_client(stream, &node, &config).await {
                                warn!(%peer_addr, error = %e, "connection ended");
                            }
                        });
                    }
                    Ok(Err(e)) => warn!(error = %e, "accept failed"),
                    Err(_) => {
                        // Accept timed out; loop back around to re-check for
                        // Ctrl-C. Not an error — this is the normal idle path.
                    }
                }
            }
        }
    }
}

/// Bind the listener. Under `DRY_RUN`, a port already in use is retried on
/// the next port instead of failing outright — convenient for running
/// several nodes on one machine during a demo.
async fn bind_listener(config: &NodeConfig) -> std::io::Result<TcpListener> {
    let mut port = config.port;
    loop {
        match TcpListener::bind((config.local_host.as_str(), port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if config.dry_run && e.kind() == ErrorKind::AddrInUse => {
                warn!(port, "port in use, retrying next port under DRY_RUN");
                port += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Serve one client connection: read framed requests and write framed
/// responses until the client closes the connection or a transport error
/// terminates this worker. A malformed request body does not kill the
/// connection — only a transport-level failure (timeout, oversized
/// message, abrupt close) does.
async fn serve_client(mut stream: TcpStream, node: &Node, config: &NodeConfig) -> Result<(), TransportError> {
    loop {
        let Some(payload) = frame::read_message(
            &mut stream,
            config.header_size,
            config.buffer_size,
            config.max_message_size,
            config.request_timeout(),
        )
        .await?
        else {
            return Ok(()); // orderly close
        };

        let response = match serde_json::from_slice::<router::RequestEnvelope>(&payload) {
            Ok(envelope) => router::dispatch(node, envelope).await,
            Err(e) => {
                warn!(error = %e, "malformed request payload");
                continue;
            }
        };

        let bytes = serde_json::to_vec(&response).unwrap_or_default();
        frame::write_message(&mut stream, &bytes, config.header_size, config.request_timeout()).await?;
    }
}
