use crate::constants::PROOF_BATCH_SIZE;
use crate::{Block, LedgerError, ProofOfWork, SharedLedger, TipSnapshot};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Searches nonces in parallel, one batch of `PROOF_BATCH_SIZE` candidates at a time.
///
/// `find_first` keeps the lowest hit inside a batch and batches are scanned in
/// ascending order, so the result is the same proof the sequential search returns.
pub fn find_proof_parallel(pow: &ProofOfWork, last_block: &Block) -> u64 {
    let last_hash = last_block.hash();
    let mut start = 0u64;
    loop {
        let end = start.saturating_add(PROOF_BATCH_SIZE);
        let found = (start..end)
            .into_par_iter()
            .find_first(|candidate| pow.valid_proof(last_block.proof, *candidate, &last_hash));
        if let Some(proof) = found {
            return proof;
        }
        // The u64 space is never exhausted in practice, wrap rather than stop.
        start = if end == u64::MAX { 0 } else { end };
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchStrategy {
    #[default]
    Sequential,
    Parallel,
}

/// Drives one mining round: snapshot the tip, search unlocked, commit.
#[derive(Clone, Copy, Debug)]
pub struct Miner {
    strategy: SearchStrategy,
    max_attempts: usize,
}

impl Miner {
    pub fn new(strategy: SearchStrategy, max_attempts: usize) -> Self {
        Self {
            strategy,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn search(&self, tip: &TipSnapshot) -> u64 {
        match self.strategy {
            SearchStrategy::Sequential => tip.pow.find_proof(&tip.last_block),
            SearchStrategy::Parallel => find_proof_parallel(&tip.pow, &tip.last_block),
        }
    }

    /// Blocks the calling thread until a block is forged or every attempt went stale.
    pub fn mine(&self, ledger: &SharedLedger, reward_recipient: &str) -> Result<Block, LedgerError> {
        self.mine_with(ledger, reward_recipient, |tip| self.search(tip))
    }

    fn mine_with(
        &self,
        ledger: &SharedLedger,
        reward_recipient: &str,
        mut search: impl FnMut(&TipSnapshot) -> u64,
    ) -> Result<Block, LedgerError> {
        let mut attempt = 1;
        loop {
            let tip = ledger.tip_snapshot()?;
            let started = Instant::now();
            let proof = search(&tip);
            debug!(
                height = tip.height,
                proof,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "proof found"
            );
            match ledger.commit_proof(&tip, proof, reward_recipient) {
                Ok(block) => {
                    info!(index = block.index, attempt, "mined block");
                    return Ok(block);
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    warn!(%err, attempt, "tip moved while mining, searching again");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(SearchStrategy::Sequential, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{genesis_block, is_valid};
    use crate::Difficulty;
    use std::sync::Barrier;
    use std::thread;

    /// Search closure that lets a rival block land on the tip before answering.
    fn racing_search<'a>(miner: &'a Miner, ledger: &'a SharedLedger) -> impl FnMut(&TipSnapshot) -> u64 + 'a {
        let mut raced = false;
        move |tip| {
            if !raced {
                raced = true;
                let rival = ledger.tip_snapshot().unwrap();
                let proof = miner.search(&rival);
                ledger.commit_proof(&rival, proof, "rival").unwrap();
            }
            miner.search(tip)
        }
    }

    fn race(miners: usize, attempts: usize) -> (SharedLedger, Vec<Result<Block, LedgerError>>) {
        let ledger = SharedLedger::new(crate::Ledger::new(ProofOfWork::new(Difficulty::new(4).unwrap())));
        let miner = Miner::new(SearchStrategy::Sequential, attempts);
        let start = Barrier::new(miners);
        let results = thread::scope(|scope| {
            let handles: Vec<_> = (0..miners)
                .map(|i| {
                    let (ledger, start) = (&ledger, &start);
                    scope.spawn(move || {
                        start.wait();
                        miner.mine(ledger, &format!("miner-{i}"))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        (ledger, results)
    }

    #[test]
    fn parallel_search_matches_sequential() {
        let genesis = genesis_block();
        for zeros in 1..=3 {
            let pow = ProofOfWork::new(Difficulty::new(zeros).unwrap());
            assert_eq!(find_proof_parallel(&pow, &genesis), pow.find_proof(&genesis));
        }
    }

    #[test]
    fn mined_block_validates_with_full_chain() {
        let ledger = SharedLedger::default();
        let miner = Miner::default();
        for _ in 0..3 {
            miner.mine(&ledger, "node-a").unwrap();
        }
        let chain = ledger.chain();
        assert_eq!(chain.len(), 4);
        assert!(is_valid(&chain, &ledger.pow()));
    }

    #[test]
    fn parallel_miner_forges_valid_blocks() {
        let ledger = SharedLedger::default();
        ledger.add_transaction("alice", "bob", 2.5);
        let block = Miner::new(SearchStrategy::Parallel, 1)
            .mine(&ledger, "node-a")
            .unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(block.transactions.len(), 2);
        assert!(is_valid(&ledger.chain(), &ledger.pow()));
    }

    #[test]
    fn zero_attempts_still_mines_once() {
        let ledger = SharedLedger::default();
        assert!(Miner::new(SearchStrategy::Sequential, 0).mine(&ledger, "n").is_ok());
    }

    #[test]
    fn single_attempt_gives_up_on_stale_tip() {
        let ledger = SharedLedger::default();
        let miner = Miner::new(SearchStrategy::Sequential, 1);
        let err = miner
            .mine_with(&ledger, "me", racing_search(&miner, &ledger))
            .unwrap_err();
        assert!(matches!(err, LedgerError::StaleTip { expected: 1, found: 2 }));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn stale_tip_is_retried_against_the_new_tip() {
        let ledger = SharedLedger::default();
        let miner = Miner::default();
        let block = miner
            .mine_with(&ledger, "me", racing_search(&miner, &ledger))
            .unwrap();
        assert_eq!(block.index, 3);
        assert_eq!(block.transactions.last().unwrap().recipient, "me");

        let chain = ledger.chain();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[1].transactions[0].recipient, "rival");
        assert!(is_valid(&chain, &ledger.pow()));
    }

    #[test]
    fn racing_miners_without_retries_lose_with_stale_tip() {
        let (ledger, results) = race(4, 1);
        let forged = results.iter().filter(|r| r.is_ok()).count();
        assert!(forged >= 1);
        for result in &results {
            if let Err(err) = result {
                assert!(matches!(err, LedgerError::StaleTip { .. }), "unexpected error {err}");
            }
        }
        assert_eq!(ledger.len(), 1 + forged);
        assert!(is_valid(&ledger.chain(), &ledger.pow()));
    }

    #[test]
    fn racing_miners_with_retries_all_forge() {
        let (ledger, results) = race(3, 3);
        assert!(results.iter().all(Result::is_ok));
        let mut indices: Vec<_> = results.into_iter().map(|r| r.unwrap().index).collect();
        indices.sort_unstable();
        assert_eq!(indices, [2, 3, 4]);
        assert!(is_valid(&ledger.chain(), &ledger.pow()));
    }
}
