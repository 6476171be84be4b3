//! Longest-valid-chain fork choice against the registered peers.
//!
//! Peers are polled concurrently and any peer that fails is skipped. The
//! longest chain that validates under the local difficulty replaces ours
//! wholesale; a tie keeps the local chain. There is no total-work comparison.
use crate::chain::validate_chain;
use crate::{Block, FetchFailure, LedgerError, NodeRegistry, PeerChain, SharedLedger};
use futures_util::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Transport used to ask a peer for its chain.
pub trait ChainFetcher: Send + Sync {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<PeerChain, FetchFailure>> + Send;
}

#[derive(Clone, Debug)]
pub struct ConsensusResolver<F> {
    fetcher: F,
    timeout: Duration,
}

impl<F: ChainFetcher> ConsensusResolver<F> {
    pub fn new(fetcher: F, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Fetch one peer's chain, bounded by the resolver timeout.
    pub async fn fetch(&self, peer: &str) -> Result<PeerChain, LedgerError> {
        let outcome = match tokio::time::timeout(self.timeout, self.fetcher.fetch_chain(peer)).await {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::Timeout),
        };
        outcome
            .and_then(|peer_chain| {
                if peer_chain.length == peer_chain.chain.len() {
                    Ok(peer_chain)
                } else {
                    Err(FetchFailure::Malformed(format!(
                        "reported length {} but sent {} blocks",
                        peer_chain.length,
                        peer_chain.chain.len()
                    )))
                }
            })
            .map_err(|source| LedgerError::PeerFetchFailure {
                peer: peer.to_string(),
                source,
            })
    }

    /// Replace the local chain with the longest valid peer chain, if any is
    /// longer than ours. Returns whether the chain was replaced.
    pub async fn resolve_conflicts(&self, ledger: &SharedLedger, registry: &NodeRegistry) -> bool {
        let local_len = ledger.len();
        let pow = ledger.pow();
        let peers = registry.nodes();
        debug!(peers = peers.len(), local_len, "resolving conflicts");

        let responses = join_all(peers.iter().map(|peer| self.fetch(peer))).await;

        let mut max_length = local_len;
        let mut winner: Option<(&str, Vec<Block>)> = None;
        for (peer, response) in peers.iter().zip(responses) {
            let peer_chain = match response {
                Ok(peer_chain) => peer_chain,
                Err(err) => {
                    warn!(%err, "skipping peer");
                    continue;
                }
            };
            if peer_chain.length <= max_length {
                debug!(%peer, length = peer_chain.length, max_length, "peer chain not longer");
                continue;
            }
            match validate_chain(&peer_chain.chain, &pow) {
                Ok(()) => {
                    max_length = peer_chain.length;
                    winner = Some((peer.as_str(), peer_chain.chain));
                }
                Err(reason) => {
                    warn!(%peer, length = peer_chain.length, %reason, "rejecting peer chain");
                }
            }
        }

        match winner {
            Some((peer, chain)) => {
                let replaced = ledger.replace_if_longer(chain);
                if replaced {
                    info!(%peer, length = max_length, "adopted longer peer chain");
                }
                replaced
            }
            None => false,
        }
    }
}
