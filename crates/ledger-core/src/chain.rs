//! Genesis construction and whole-chain validation.
use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::{now_secs, Block, InvalidChain, ProofOfWork};
use tracing::debug;

/// The conventional first block. Its proof is not checked by proof-of-work.
pub fn genesis_block() -> Block {
    Block {
        index: 1,
        timestamp: now_secs(),
        transactions: vec![],
        proof: GENESIS_PROOF,
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
    }
}

/// Walk consecutive pairs and report the first broken link or bad proof.
///
/// Proofs are checked against `pow` as configured on this node right now, not
/// against whatever difficulty the chain was mined under.
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> Result<(), InvalidChain> {
    if chain.is_empty() {
        return Err(InvalidChain::Empty);
    }
    for (position, pair) in chain.windows(2).enumerate().map(|(i, w)| (i + 1, w)) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let prev_hash = prev.hash();
        if cur.previous_hash != prev_hash {
            return Err(InvalidChain::BrokenLink { position });
        }
        if !pow.valid_proof(prev.proof, cur.proof, &prev_hash) {
            return Err(InvalidChain::InvalidProof { position });
        }
    }
    debug!(len = chain.len(), "chain validated");
    Ok(())
}

pub fn is_valid(chain: &[Block], pow: &ProofOfWork) -> bool {
    validate_chain(chain, pow).is_ok()
}
