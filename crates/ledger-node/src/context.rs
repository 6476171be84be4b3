use crate::{config::Config, constants::NODE_ID_BYTES, fetcher::HttpChainFetcher};
use ledger_core::{
    consensus::ConsensusResolver,
    mine::{Miner, SearchStrategy},
    Difficulty, Ledger, NodeRegistry, ProofOfWork, SharedLedger,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Everything a request handler may touch, handed to axum as router state.
#[derive(Debug)]
pub struct NodeContext {
    pub node_id: String,
    pub ledger: SharedLedger,
    pub registry: RwLock<NodeRegistry>,
    pub miner: Miner,
    pub resolver: ConsensusResolver<HttpChainFetcher>,
}

pub type AppState = Arc<NodeContext>;

impl NodeContext {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let difficulty = Difficulty::new(config.difficulty)?;
        let mut registry = NodeRegistry::new();
        registry.register_all(&config.peers)?;

        let strategy = if config.parallel_mining {
            SearchStrategy::Parallel
        } else {
            SearchStrategy::Sequential
        };
        let node_id = config.node_id.clone().unwrap_or_else(generate_node_id);
        info!(%node_id, %difficulty, peers = registry.len(), ?strategy, "node context ready");

        Ok(Self {
            node_id,
            ledger: SharedLedger::new(Ledger::new(ProofOfWork::new(difficulty))),
            registry: RwLock::new(registry),
            miner: Miner::new(strategy, config.mine_attempts),
            resolver: ConsensusResolver::new(HttpChainFetcher::new(), config.peer_timeout()),
        })
    }

    /// Run consensus against a snapshot of the registry.
    pub async fn resolve_conflicts(&self) -> bool {
        let registry = self.registry.read().clone();
        self.resolver.resolve_conflicts(&self.ledger, &registry).await
    }
}

/// 32 lowercase hex characters.
pub fn generate_node_id() -> String {
    hex::encode(rand::random::<[u8; NODE_ID_BYTES]>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn node_id_is_random_hex() {
        let a = generate_node_id();
        let b = generate_node_id();
        assert_eq!(a.len(), 32);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn context_from_config() {
        let config = Config::parse_from([
            "ledger-node",
            "--difficulty",
            "2",
            "--peer",
            "http://peer:5000/",
            "--node-id",
            "miner-7",
        ]);
        let ctx = NodeContext::from_config(&config).unwrap();
        assert_eq!(ctx.node_id, "miner-7");
        assert_eq!(ctx.ledger.difficulty().zeros(), 2);
        assert_eq!(ctx.ledger.len(), 1);
        assert!(ctx.registry.read().contains("peer:5000"));
    }

    #[test]
    fn bad_config_is_rejected() {
        let zero = Config::parse_from(["ledger-node", "--difficulty", "0"]);
        assert!(NodeContext::from_config(&zero).is_err());
        let bad_peer = Config::parse_from(["ledger-node", "--peer", "nope"]);
        assert!(NodeContext::from_config(&bad_peer).is_err());
    }
}
