/// Tunables that govern block validity and the genesis mint.
///
/// Passed once to [`crate::chain::Chain::new`] and never mutated — this is
/// the replacement for the reference implementation's class-level
/// `difficulty`/`max_size` attributes, which made difficulty a piece of
/// global mutable state shared (and stomped on) across every chain
/// instance and test.
#[derive(Debug, Clone, Copy)]
pub struct ChainConfig {
    /// Number of leading ASCII `'0'` characters a block's hash must have.
    pub block_difficulty: usize,
    /// Maximum number of transactions a single block may carry.
    pub max_block_transactions: usize,
    /// Amount minted to the chain's creator in the genesis block.
    pub initial_currency_supply: u64,
    /// Fee recorded on the genesis mint transaction (always zero in
    /// practice, but kept configurable for symmetry with other blocks).
    pub genesis_block_fee: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            block_difficulty: 2,
            max_block_transactions: 10,
            initial_currency_supply: 10_000,
            genesis_block_fee: 0,
        }
    }
}
