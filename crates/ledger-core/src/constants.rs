pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

pub const GENESIS_PREVIOUS_HASH: &str = "1";
pub const GENESIS_PROOF: u64 = 1;

pub const DEFAULT_DIFFICULTY: usize = 1;
pub const MAX_DIFFICULTY: usize = HASH_HEX_SIZE;

/// Candidates handed to rayon per round of the parallel proof search.
pub const PROOF_BATCH_SIZE: u64 = 1 << 16;

/// Coinbase-style reward credited to the miner of each block.
pub const MINING_REWARD_SENDER: &str = "0";
pub const MINING_REWARD_AMOUNT: f64 = 1.0;
