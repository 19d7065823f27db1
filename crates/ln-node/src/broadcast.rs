//! Outbound side of the peer transport: connect to every known peer and
//! send it a request, the way the reference implementation's
//! `NetworkManager.message_all_nodes` fans a payload out over its held
//! sockets. Unlike the reference, which keeps one long-lived socket per
//! peer, each broadcast here opens a fresh connection and closes it —
//! simpler, and sufficient for the request volume a broadcast-on-mine or
//! broadcast-on-new-transaction generates.
//!
//! Broadcasts never retry. A peer that is unreachable or errors out is
//! logged and skipped; the caller (`mine_new_block`, `transmit_transactions`)
//! has already committed its own state and does not wait on peers to agree.

use serde_json::Value;
use tokio::net::TcpStream;
use tracing::warn;

use ln_chain::Block;
use ln_transaction::TransactionWire;
use ln_transport::frame;

use crate::{error::NodeError, node::Node, router::RequestEnvelope};

/// Broadcast `chain` to every peer as a `replace_chain` request.
pub async fn replace_chain(node: &Node, chain: &[Block]) {
    let Ok(data) = serde_json::to_value(chain) else {
        return;
    };
    fan_out(node, "replace_chain", data).await;
}

/// Broadcast `wires` to every peer as a `register_new_transactions` request.
/// A no-op on an empty mempool snapshot — nothing to tell peers about.
pub async fn new_transactions(node: &Node, wires: &[TransactionWire]) {
    if wires.is_empty() {
        return;
    }
    let Ok(data) = serde_json::to_value(wires) else {
        return;
    };
    fan_out(node, "register_new_transactions", data).await;
}

async fn fan_out(node: &Node, path: &str, data: Value) {
    let peers = node.known_peers().await;
    if peers.is_empty() {
        return;
    }

    let envelope = RequestEnvelope { path: path.to_string(), data };
    let Ok(payload) = serde_json::to_vec(&envelope) else {
        return;
    };

    for web_address in peers.values() {
        if let Err(e) = send(node, web_address, &payload).await {
            warn!(peer = %web_address, path, error = %e, "broadcast to peer failed");
        }
    }
}

async fn send(node: &Node, web_address: &str, payload: &[u8]) -> Result<(), NodeError> {
    let config = node.config();
    let mut stream = TcpStream::connect(web_address).await?;

    frame::write_message(&mut stream, payload, config.header_size, config.request_timeout()).await?;
    // The response is not inspected — broadcasts are fire-and-forget. Still
    // read it so the connection drains cleanly instead of racing the peer's
    // own close.
    let _ = frame::read_message(
        &mut stream,
        config.header_size,
        config.buffer_size,
        config.max_message_size,
        config.request_timeout(),
    )
    .await?;

    Ok(())
}
