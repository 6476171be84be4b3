use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod chain;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod pow;
pub mod registry;

pub use error::{FetchFailure, InvalidChain, LedgerError};
pub use ledger::{Ledger, SharedLedger, TipSnapshot};
pub use pow::{Difficulty, ProofOfWork};
pub use registry::NodeRegistry;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Unix seconds with sub-second precision.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Hex SHA-256 of the canonical JSON encoding of this block.
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_bytes()))
    }

    /// Compact JSON with every object's keys in lexicographic order.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let view = CanonicalBlock {
            index: self.index,
            previous_hash: &self.previous_hash,
            proof: self.proof,
            timestamp: self.timestamp,
            transactions: self
                .transactions
                .iter()
                .map(|t| CanonicalTransaction {
                    amount: t.amount,
                    recipient: &t.recipient,
                    sender: &t.sender,
                })
                .collect(),
        };
        // Plain structs of strings and numbers cannot fail to serialize.
        serde_json::to_vec(&view).expect("canonical block encoding")
    }
}

// Field declaration order is the serialized key order: keep these sorted.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    index: u64,
    previous_hash: &'a str,
    proof: u64,
    timestamp: f64,
    transactions: Vec<CanonicalTransaction<'a>>,
}

#[derive(Serialize)]
struct CanonicalTransaction<'a> {
    amount: f64,
    recipient: &'a str,
    sender: &'a str,
}

/// Wire shape of `GET /chain`, shared by the node and the peer protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerChain {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl PeerChain {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block {
            index: 2,
            timestamp: 1_600_000_200.5,
            transactions: vec![
                Transaction::new("Alice", "Bob", 10.0),
                Transaction::new("Bob", "Charlie", 5.25),
            ],
            proof: 35_293,
            previous_hash: "1".to_string(),
        }
    }

    #[test]
    fn canonical_encoding_sorts_keys() {
        let block = sample_block();
        let json = String::from_utf8(block.canonical_bytes()).unwrap();
        let expected = concat!(
            r#"{"index":2,"previous_hash":"1","proof":35293,"timestamp":1600000200.5,"#,
            r#""transactions":[{"amount":10.0,"recipient":"Bob","sender":"Alice"},"#,
            r#"{"amount":5.25,"recipient":"Charlie","sender":"Bob"}]}"#
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn block_hash_is_hex_sha256_of_canonical_bytes() {
        let block = sample_block();
        let hash = block.hash();
        assert_eq!(hash.len(), constants::HASH_HEX_SIZE);
        assert_eq!(hash, hex::encode(Sha256::digest(block.canonical_bytes())));
    }

    #[test]
    fn block_hash_consistency() {
        let block = sample_block();
        assert_eq!(block.hash(), block.hash());
        assert_eq!(block.hash(), block.clone().hash());
    }

    #[test]
    fn block_hash_changes_with_proof() {
        let block = sample_block();
        let mut other = block.clone();
        other.proof += 1;
        assert_ne!(block.hash(), other.hash());
    }

    #[test]
    fn block_hash_depends_on_transaction_order() {
        let block = sample_block();
        let mut other = block.clone();
        other.transactions.reverse();
        assert_ne!(block.hash(), other.hash());
    }

    #[test]
    fn block_hash_survives_json_round_trip() {
        // A peer recomputes the hash from decoded fields, awkward floats included.
        let mut block = sample_block();
        block.timestamp = 1_728_901_234.123_456_7;
        block.transactions[1].amount = 0.1 + 0.2;
        let wire = serde_json::to_string(&block).unwrap();
        let decoded: Block = serde_json::from_str(&wire).unwrap();
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn transaction_serialization_example() {
        let tx = Transaction::new("Alice", "Bob", 10.0);
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, r#"{"sender":"Alice","recipient":"Bob","amount":10.0}"#);
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, deserialized);
    }

    #[test]
    fn transaction_inequality() {
        let tx = Transaction::new("Alice", "Bob", 10.0);
        assert_ne!(tx, Transaction::new("Eve", "Bob", 10.0));
        assert_ne!(tx, Transaction::new("Alice", "Charlie", 10.0));
        assert_ne!(tx, Transaction::new("Alice", "Bob", 20.0));
    }

    #[test]
    fn peer_chain_accepts_integer_amounts() {
        let wire = r#"{"chain":[{"index":1,"timestamp":1600000000,"transactions":[
            {"sender":"0","recipient":"abc","amount":1}],"proof":1,"previous_hash":"1"}],"length":1}"#;
        let peer: PeerChain = serde_json::from_str(wire).unwrap();
        assert_eq!(peer.length, 1);
        assert_eq!(peer.chain[0].transactions[0].amount, 1.0);
        assert_eq!(peer.chain[0].timestamp, 1_600_000_000.0);
    }
}
