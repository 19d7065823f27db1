use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use ln_chain::{Block, Chain};
use ln_crypto::{is_public_key_string_valid, KeyPair};
use ln_transaction::{Transaction, TransactionWire};
use ln_transport::PeerRegistry;

use crate::{config::NodeConfig, error::NodeError, mempool::Mempool};

fn now_unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before 1970")
        .as_secs_f64()
}

/// `host:port` — the only shape of web address this node's peer registry
/// accepts. No scheme, no path; the reference implementation's `http://`
/// prefix is dropped in favor of something a bare `TcpStream::connect`
/// understands directly.
fn is_web_address_valid(address: &str) -> bool {
    let Some((host, port)) = address.rsplit_once(':') else {
        return false;
    };
    !host.is_empty() && port.parse::<u16>().is_ok()
}

/// Everything mutated as a single exclusive section: the chain, the
/// mempool, and the peer table. Readers never observe one updated without
/// the other two (spec §5's ordering guarantees (a) and (b)).
struct NodeState {
    chain: Chain,
    mempool: Mempool,
    peers: PeerRegistry,
}

/// A single ledger participant: a keypair, the chain it has observed, the
/// transactions it is holding for the next block, and the peers it knows
/// about.
///
/// Shared across the listener's worker pool behind an `Arc` (see
/// `main.rs`); every mutating operation goes through `state`, a single
/// `tokio::sync::Mutex` rather than one lock per field, so a chain
/// replacement and a mempool update are never observed half-applied. Mining
/// is the one operation that must not hold this lock while it runs — see
/// [`Node::mine_new_block`].
pub struct Node {
    keypair: KeyPair,
    /// The keypair's public key string, cached at construction — this
    /// node's own blockchain address, looked up constantly and never
    /// changing.
    blockchain_address: String,
    web_address: String,
    config: NodeConfig,
    state: Mutex<NodeState>,
}

impl Node {
    /// Generate a fresh keypair, mint the genesis block to it, and start
    /// with empty mempool and peer table.
    pub fn new(config: NodeConfig) -> Self {
        let keypair = KeyPair::generate();
        let blockchain_address = keypair.public_key_string();
        let web_address = config.resolved_web_address();
        let chain = Chain::new(config.chain_config(), blockchain_address.clone(), now_unix_seconds());

        Self {
            keypair,
            blockchain_address,
            web_address,
            config,
            state: Mutex::new(NodeState {
                chain,
                mempool: Mempool::new(),
                peers: PeerRegistry::new(),
            }),
        }
    }

    pub fn blockchain_address(&self) -> &str {
        &self.blockchain_address
    }

    pub fn web_address(&self) -> &str {
        &self.web_address
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub async fn chain_snapshot(&self) -> Vec<Block> {
        self.state.lock().await.chain.blocks().to_vec()
    }

    pub async fn chain_length(&self) -> usize {
        self.state.lock().await.chain.len()
    }

    pub async fn balance_of(&self, address: &str) -> i64 {
        self.state.lock().await.chain.balance_of(address)
    }

    pub async fn known_peers(&self) -> HashMap<String, String> {
        self.state.lock().await.peers.snapshot()
    }

    /// Sign and admit a new transaction from this node's own key. Refuses
    /// (`BadTransaction`) when the sender cannot afford `amount + fee` on
    /// the current chain.
    pub async fn create_signed_transaction(
        &self,
        receiver: String,
        amount: u64,
        fee: u64,
    ) -> Result<TransactionWire, NodeError> {
        let sender = self.blockchain_address().to_string();
        let mut state = self.state.lock().await;

        let balance = state.chain.balance_of(&sender);
        if (amount as i64).saturating_add(fee as i64) > balance {
            return Err(NodeError::BadTransaction(ln_transaction::TransactionError::BadTransaction));
        }

        let mut tx = Transaction::new(sender, receiver, amount, fee, now_unix_seconds());
        let signature = self.keypair.sign(&tx.canonical());
        tx.add_signature(signature)?;

        let wire = tx.to_wire();
        state.mempool.insert(tx);
        Ok(wire)
    }

    /// Admit a transaction received from a peer. Rejects it if the
    /// signature does not verify or the sender cannot afford it; otherwise
    /// inserts it (idempotent on an already-present wire form).
    pub async fn add_transaction(&self, wire: TransactionWire) -> Result<bool, NodeError> {
        let tx = Transaction::from_wire(&wire)?;

        let mut state = self.state.lock().await;
        let balance = state.chain.balance_of(&tx.sender);
        if (tx.amount as i64).saturating_add(tx.fee as i64) > balance {
            return Err(NodeError::BadTransaction(ln_transaction::TransactionError::BadTransaction));
        }

        Ok(state.mempool.insert(tx))
    }

    /// Admit every transaction in `wires`, ignoring individual failures
    /// (a peer broadcasting a mixed batch should not lose the good ones
    /// because one is bad), then run ordinary (non-chain-triggered) cleanup.
    pub async fn receive_transactions(&self, wires: Vec<TransactionWire>) {
        for wire in wires {
            let _ = self.add_transaction(wire).await;
        }
        self.cleanup_transactions(false).await;
    }

    /// Drop mempool transactions older than `TRANSACTION_MAX_DAYS`, and —
    /// when `new_chain` is set — transactions already present in any
    /// non-genesis block of the current chain.
    pub async fn cleanup_transactions(&self, new_chain: bool) {
        let mut state = self.state.lock().await;
        Self::cleanup_locked(&mut state, self.config.transaction_max_days, new_chain);
    }

    fn cleanup_locked(state: &mut NodeState, max_days: f64, new_chain: bool) {
        let blocks = state.chain.blocks().to_vec();
        state.mempool.cleanup(max_days, new_chain, |tx| {
            blocks[1..].iter().any(|b| b.transactions.iter().any(|t| t == tx))
        });
    }

    /// Mine a block over the current mempool and, if it is non-empty,
    /// append it and broadcast the new chain to every known peer.
    ///
    /// Proof-of-work runs without holding `state`'s lock — it is a tight
    /// hashing loop and must not starve concurrent request handling (spec
    /// §5). The mempool snapshot and chain clone used to build the
    /// candidate are taken under a brief lock; if the chain has grown by
    /// the time mining finishes (a peer's block landed first), the mined
    /// block is discarded rather than appended.
    pub async fn mine_new_block(&self) -> Result<Option<Block>, NodeError> {
        let (chain_snapshot, candidates, starting_len) = {
            let state = self.state.lock().await;
            (state.chain.clone(), state.mempool.transactions(), state.chain.len())
        };

        let (mut block, selected) =
            chain_snapshot.build_block(self.blockchain_address().to_string(), &candidates, now_unix_seconds());
        if selected.is_empty() {
            return Ok(None);
        }
        block.mine(chain_snapshot.config().block_difficulty);

        let broadcast_chain = {
            let mut state = self.state.lock().await;
            if state.chain.len() != starting_len {
                // The chain moved under us; this block no longer extends the
                // tip. Discard it rather than force a rejected append.
                return Ok(None);
            }
            state.chain.add_block(block.clone())?;
            state.mempool.remove_all(&selected);
            state.chain.blocks().to_vec()
        };

        crate::broadcast::replace_chain(self, &broadcast_chain).await;
        Ok(Some(block))
    }

    /// Broadcast the current mempool to every known peer as newly-seen
    /// transactions.
    pub async fn transmit_transactions(&self) {
        let wires: Vec<TransactionWire> = {
            let state = self.state.lock().await;
            state.mempool.transactions().iter().map(Transaction::to_wire).collect()
        };
        crate::broadcast::new_transactions(self, &wires).await;
    }

    /// Adopt `candidate` in place of the current chain if it is strictly
    /// longer and structurally valid. On success, drops mempool
    /// transactions already included in the new chain.
    pub async fn replace_chain(&self, candidate: Vec<Block>) -> Result<bool, NodeError> {
        let mut state = self.state.lock().await;
        let replaced = state.chain.replace_chain(candidate)?;
        if replaced {
            Self::cleanup_locked(&mut state, self.config.transaction_max_days, true);
        }
        Ok(replaced)
    }

    /// Register a peer (if its address pair is well-formed) and return
    /// this node's own `{blockchain_address: web_address}` pair so the
    /// caller can record the return path — peer registration is symmetric.
    pub async fn add_node(
        &self,
        blockchain_address: String,
        web_address: String,
    ) -> Result<HashMap<String, String>, NodeError> {
        if !is_web_address_valid(&web_address) || !is_public_key_string_valid(&blockchain_address) {
            return Err(NodeError::BadPeer);
        }

        let mut state = self.state.lock().await;
        state.peers.register(blockchain_address, web_address);

        let mut own = HashMap::new();
        own.insert(self.blockchain_address().to_string(), self.web_address.clone());
        Ok(own)
    }
}
