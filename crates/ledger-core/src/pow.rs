use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::{Block, LedgerError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of trailing `'0'` hex characters a proof digest must end with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Difficulty(usize);

impl Difficulty {
    pub fn new(zeros: usize) -> Result<Self, LedgerError> {
        if (1..=MAX_DIFFICULTY).contains(&zeros) {
            Ok(Self(zeros))
        } else {
            Err(LedgerError::InvalidDifficulty {
                got: zeros,
                max: MAX_DIFFICULTY,
            })
        }
    }

    pub fn zeros(self) -> usize {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(DEFAULT_DIFFICULTY)
    }
}

impl TryFrom<usize> for Difficulty {
    type Error = LedgerError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for usize {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof-of-work rules under a fixed difficulty.
///
/// The difficulty is plain configuration: it changes only when an operator sets
/// it, there is no growth schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: Difficulty,
}

impl ProofOfWork {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// SHA-256 hex of `"{last_proof}{candidate}{last_hash}"` ends in `difficulty` zeros.
    pub fn valid_proof(&self, last_proof: u64, candidate: u64, last_hash: &str) -> bool {
        let guess = format!("{last_proof}{candidate}{last_hash}");
        let digest = hex::encode(Sha256::digest(guess.as_bytes()));
        has_trailing_zeros(&digest, self.difficulty.zeros())
    }

    /// Smallest non-negative proof that validates against `last_block`.
    ///
    /// Runs until it finds one; there is no upper bound on the number of attempts.
    pub fn find_proof(&self, last_block: &Block) -> u64 {
        let last_hash = last_block.hash();
        let mut candidate = 0u64;
        while !self.valid_proof(last_block.proof, candidate, &last_hash) {
            candidate = candidate.wrapping_add(1);
        }
        candidate
    }
}

pub fn has_trailing_zeros(hex_digest: &str, zeros: usize) -> bool {
    hex_digest.len() >= zeros && hex_digest.bytes().rev().take(zeros).all(|b| b == b'0')
}
