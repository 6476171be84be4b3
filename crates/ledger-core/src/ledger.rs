use crate::constants::{MINING_REWARD_AMOUNT, MINING_REWARD_SENDER};
use crate::{chain::genesis_block, now_secs, Block, Difficulty, LedgerError, ProofOfWork, Transaction};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// The canonical chain plus the transactions waiting for the next block.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    pow: ProofOfWork,
}

impl Ledger {
    /// A ledger holding only the genesis block.
    pub fn new(pow: ProofOfWork) -> Self {
        Self {
            chain: vec![genesis_block()],
            pending: Vec::new(),
            pow,
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pow(&self) -> ProofOfWork {
        self.pow
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.pow = ProofOfWork::new(difficulty);
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Queue a transaction and return the index of the block it will land in.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, recipient, amount));
        self.last_block().map_or(0, |b| b.index) + 1
    }

    /// Seal every pending transaction into a new block on top of the chain.
    pub fn append_block(&mut self, previous_hash: String, proof: u64) -> Block {
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: now_secs(),
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        self.chain.push(block.clone());
        block
    }

    /// Swap the whole chain. Pending transactions stay queued.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }
}

/// What a miner needs from the tip, taken under the lock and searched without it.
#[derive(Clone, Debug)]
pub struct TipSnapshot {
    pub last_block: Block,
    pub last_hash: String,
    pub height: usize,
    pub pow: ProofOfWork,
}

/// A [`Ledger`] shared by every request handler of a node.
///
/// Chain, pending pool and difficulty sit behind one mutex. Nothing holds it
/// across a proof search or a network call.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn add_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.inner.lock().add_transaction(sender, recipient, amount)
    }

    pub fn chain(&self) -> Vec<Block> {
        self.inner.lock().chain().to_vec()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.inner.lock().pending().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn pow(&self) -> ProofOfWork {
        self.inner.lock().pow()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.pow().difficulty()
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        self.inner.lock().set_difficulty(difficulty);
        info!(%difficulty, "difficulty updated");
    }

    pub fn tip_snapshot(&self) -> Result<TipSnapshot, LedgerError> {
        let ledger = self.inner.lock();
        let last_block = ledger.last_block().cloned().ok_or(LedgerError::EmptyChain)?;
        Ok(TipSnapshot {
            last_hash: last_block.hash(),
            last_block,
            height: ledger.len(),
            pow: ledger.pow(),
        })
    }

    /// Append a block carrying `proof` if the tip is still the one searched against.
    ///
    /// The mining reward is queued right before sealing so it lands in this block.
    pub fn commit_proof(
        &self,
        tip: &TipSnapshot,
        proof: u64,
        reward_recipient: &str,
    ) -> Result<Block, LedgerError> {
        let mut ledger = self.inner.lock();
        let current = ledger.last_block().ok_or(LedgerError::EmptyChain)?;
        if ledger.len() != tip.height || current.hash() != tip.last_hash {
            return Err(LedgerError::StaleTip {
                expected: tip.height,
                found: ledger.len(),
            });
        }
        if ledger.pow() != tip.pow {
            return Err(LedgerError::DifficultyChanged {
                from: tip.pow.difficulty().zeros(),
                to: ledger.pow().difficulty().zeros(),
            });
        }
        ledger.add_transaction(MINING_REWARD_SENDER, reward_recipient, MINING_REWARD_AMOUNT);
        let block = ledger.append_block(tip.last_hash.clone(), proof);
        info!(
            index = block.index,
            proof = block.proof,
            txs = block.transactions.len(),
            "new block forged"
        );
        Ok(block)
    }

    /// Adopt `chain` only if it is still strictly longer than ours.
    pub fn replace_if_longer(&self, chain: Vec<Block>) -> bool {
        let mut ledger = self.inner.lock();
        if chain.len() <= ledger.len() {
            debug!(
                candidate = chain.len(),
                local = ledger.len(),
                "local chain caught up, keeping it"
            );
            return false;
        }
        info!(from = ledger.len(), to = chain.len(), "replacing local chain");
        ledger.replace_chain(chain);
        true
    }
}

impl Default for SharedLedger {
    fn default() -> Self {
        Self::new(Ledger::new(ProofOfWork::default()))
    }
}
