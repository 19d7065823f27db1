use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ln_chain::Block;
use ln_transaction::TransactionWire;

use crate::node::Node;

/// Envelope for an incoming request: a named path plus path-specific data.
/// `data`'s shape depends on `path` — see the per-path request types below —
/// exactly like the reference implementation's duck-typed dict, except each
/// handler here deserializes into a concrete type instead of indexing into
/// an untyped mapping.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub path: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub receiver: String,
    pub amount: u64,
    pub fee: u64,
}

#[derive(Debug, Deserialize)]
pub struct PeerPairRequest {
    pub blockchain_address: String,
    pub web_address: String,
}

/// Response envelope. Fields absent from a given response are omitted from
/// the serialized JSON entirely (not sent as `null`) — this includes
/// `success`, which the unknown-path branch deliberately leaves out rather
/// than setting to `false`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<Vec<Block>>,
    #[serde(rename = "chain-length", skip_serializing_if = "Option::is_none")]
    pub chain_length: Option<usize>,
    #[serde(rename = "chain-address", skip_serializing_if = "Option::is_none")]
    pub chain_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<HashMap<String, String>>,
}

impl ResponseEnvelope {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: Some(true),
            ..Default::default()
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: Some(false),
            ..Default::default()
        }
    }

    fn unknown_path(path: &str) -> Self {
        Self {
            message: format!("unknown request path {path}"),
            ..Default::default()
        }
    }
}

/// Dispatch a request to `node`, mirroring the named operations of the
/// reference request handler one for one.
pub async fn dispatch(node: &Node, envelope: RequestEnvelope) -> ResponseEnvelope {
    match envelope.path.as_str() {
        "mine" => mine(node).await,
        "get_chain" => get_chain(node).await,
        "get_chain_length" => get_chain_length(node).await,
        "get_chain_address" => get_chain_address(node),
        "add_transaction" => add_transaction(node, envelope.data).await,
        "replace_chain" => replace_chain(node, envelope.data).await,
        "get_nodes" => get_nodes(node).await,
        "register_node" => register_node(node, envelope.data).await,
        "register_new_transactions" => register_new_transactions(node, envelope.data).await,
        other => ResponseEnvelope::unknown_path(other),
    }
}

async fn mine(node: &Node) -> ResponseEnvelope {
    match node.mine_new_block().await {
        Ok(_) => ResponseEnvelope::ok("block mined!"),
        Err(_) => ResponseEnvelope::failed("Error mining block"),
    }
}

async fn get_chain(node: &Node) -> ResponseEnvelope {
    let mut response = ResponseEnvelope::ok("got chain");
    response.chain = Some(node.chain_snapshot().await);
    response
}

async fn get_chain_length(node: &Node) -> ResponseEnvelope {
    let mut response = ResponseEnvelope::ok("got chain length");
    response.chain_length = Some(node.chain_length().await);
    response
}

fn get_chain_address(node: &Node) -> ResponseEnvelope {
    let mut response = ResponseEnvelope::ok("got address");
    response.chain_address = Some(node.blockchain_address().to_string());
    response
}

async fn add_transaction(node: &Node, data: Value) -> ResponseEnvelope {
    let Ok(request) = serde_json::from_value::<NewTransactionRequest>(data) else {
        return ResponseEnvelope::failed("bad transaction data");
    };

    match node
        .create_signed_transaction(request.receiver, request.amount, request.fee)
        .await
    {
        Ok(wire) => {
            node.transmit_transactions().await;
            let mut response = ResponseEnvelope::ok("new transaction created");
            response.transaction = Some(wire);
            response
        }
        Err(_) => ResponseEnvelope::failed("bad transaction data"),
    }
}

async fn replace_chain(node: &Node, data: Value) -> ResponseEnvelope {
    let Ok(candidate) = serde_json::from_value::<Vec<Block>>(data) else {
        return ResponseEnvelope::failed("bad chain data");
    };

    match node.replace_chain(candidate).await {
        Ok(replaced) => {
            let word = if replaced { "" } else { " not" };
            let mut response = ResponseEnvelope::ok(format!("chain{word} replaced!"));
            response.replaced = Some(replaced);
            response
        }
        Err(_) => ResponseEnvelope::failed("bad chain data"),
    }
}

async fn get_nodes(node: &Node) -> ResponseEnvelope {
    let mut response = ResponseEnvelope::ok("got nodes");
    response.nodes = Some(node.known_peers().await);
    response
}

async fn register_node(node: &Node, data: Value) -> ResponseEnvelope {
    let Ok(request) = serde_json::from_value::<PeerPairRequest>(data) else {
        return ResponseEnvelope::failed("bad node data");
    };

    match node
        .add_node(request.blockchain_address, request.web_address)
        .await
    {
        Ok(own) => {
            let mut response = ResponseEnvelope::ok("node added!");
            response.node = Some(own);
            response
        }
        Err(_) => ResponseEnvelope::failed("bad node data"),
    }
}

async fn register_new_transactions(node: &Node, data: Value) -> ResponseEnvelope {
    let Ok(wires) = serde_json::from_value::<Vec<TransactionWire>>(data) else {
        return ResponseEnvelope::failed("bad transaction data");
    };

    node.receive_transactions(wires).await;
    ResponseEnvelope::ok("transactions accepted to mempool")
}
