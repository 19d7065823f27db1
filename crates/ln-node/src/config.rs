use std::time::Duration;

use clap::Parser;
use ln_chain::ChainConfig;

/// Full configuration for a [`crate::node::Node`] and the listener binary
/// that hosts it.
///
/// Every tunable the reference implementation kept as a module-level
/// constant lives here instead, so a `ChainConfig`/`NodeConfig` pair is
/// immutable once built and passed explicitly — nothing a test or a second
/// node instance can stomp on.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "A minimal educational peer-to-peer ledger node")]
pub struct NodeConfig {
    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Interface to bind to.
    #[arg(long, env = "LOCAL_HOST", default_value = "127.0.0.1")]
    pub local_host: String,

    /// Web address this node announces to peers (`host:port`). Defaults to
    /// `local_host:port` — only worth overriding when the node is reachable
    /// from peers under a different address than the one it binds to (e.g.
    /// behind NAT or in a container).
    #[arg(long, env = "INITIAL_WEB_ADDRESS")]
    pub initial_web_address: Option<String>,

    /// Backlog size passed to `listen`.
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Width, in bytes, of the length-prefix header on every wire message.
    #[arg(long, env = "HEADERSIZE", default_value_t = 10)]
    pub header_size: usize,

    /// Chunk size used when reading a message body off the socket.
    #[arg(long, env = "BUFFERSIZE", default_value_t = 1024)]
    pub buffer_size: usize,

    /// Hard cap on a single message's total size.
    #[arg(long, env = "MAX_MESSAGE_SIZE", default_value_t = 10_000_000)]
    pub max_message_size: usize,

    /// Leading zero characters required in a block's hash.
    #[arg(long, env = "BLOCK_DIFFICULTY", default_value_t = 2)]
    pub block_difficulty: usize,

    /// Maximum transactions per block.
    #[arg(long, env = "MAX_BLOCK_TRANSACTIONS", default_value_t = 10)]
    pub max_block_transactions: usize,

    /// Amount minted to this node in its own genesis block.
    #[arg(long, env = "INITIAL_CURRENCY_SUPPLY", default_value_t = 10_000)]
    pub initial_currency_supply: u64,

    /// Fee recorded on the genesis mint transaction.
    #[arg(long, env = "GENESIS_BLOCK_FEE", default_value_t = 0)]
    pub genesis_block_fee: u64,

    /// A mempool transaction older than this many days is dropped on
    /// cleanup.
    #[arg(long, env = "TRANSACTION_MAX_DAYS", default_value_t = 2.0)]
    pub transaction_max_days: f64,

    /// When set, a bind failure due to the port already being in use tries
    /// the next port instead of giving up — convenient for running several
    /// nodes on one machine during a demo.
    #[arg(long, env = "DRY_RUN", default_value_t = false)]
    pub dry_run: bool,

    /// Python-`logging`-style integer level (10=DEBUG, 20=INFO, 30=WARN,
    /// 40/50=ERROR).
    #[arg(long, env = "LOGGING_LEVEL", default_value_t = 20)]
    pub logging_level: i32,
}

impl NodeConfig {
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            block_difficulty: self.block_difficulty,
            max_block_transactions: self.max_block_transactions,
            initial_currency_supply: self.initial_currency_supply,
            genesis_block_fee: self.genesis_block_fee,
        }
    }

    /// Timeout applied to each individual socket read/write.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    /// Timeout applied while the listener waits to accept a new connection.
    pub fn accept_timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    /// The address this node announces to peers: `initial_web_address` if
    /// set, otherwise `local_host:port`.
    pub fn resolved_web_address(&self) -> String {
        self.initial_web_address
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.local_host, self.port))
    }
}

/// Map a Python-`logging`-style integer level to a `tracing` level.
pub fn tracing_level(logging_level: i32) -> tracing::Level {
    match logging_level {
        ..=10 => tracing::Level::DEBUG,
        11..=20 => tracing::Level::INFO,
        21..=30 => tracing::Level::WARN,
        _ => tracing::Level::ERROR,
    }
}
