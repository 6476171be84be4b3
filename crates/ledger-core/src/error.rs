use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid node address: {0:?}")]
    InvalidAddress(String),

    #[error("chain is empty")]
    EmptyChain,

    #[error("difficulty must be between 1 and {max}, got {got}")]
    InvalidDifficulty { got: usize, max: usize },

    #[error("chain tip moved from height {expected} to {found} during the proof search")]
    StaleTip { expected: usize, found: usize },

    #[error("difficulty changed from {from} to {to} during the proof search")]
    DifficultyChanged { from: usize, to: usize },

    #[error("failed to fetch chain from peer {peer}: {source}")]
    PeerFetchFailure {
        peer: String,
        #[source]
        source: FetchFailure,
    },
}

impl LedgerError {
    /// Errors a miner recovers from by searching again against the new tip.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::StaleTip { .. } | LedgerError::DifficultyChanged { .. }
        )
    }
}

/// Why a single peer's chain could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out")]
    Timeout,
}

/// First defect found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidChain {
    #[error("chain has no blocks")]
    Empty,

    #[error("block at position {position} does not link to the hash of its predecessor")]
    BrokenLink { position: usize },

    #[error("block at position {position} carries an invalid proof of work")]
    InvalidProof { position: usize },
}
