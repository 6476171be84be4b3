use ledger_core::{consensus::ChainFetcher, FetchFailure, PeerChain};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Fetches `GET http://{peer}/chain` over HTTP.
///
/// The client carries no timeout of its own; `ConsensusResolver` bounds each fetch.
#[derive(Clone, Debug, Default)]
pub struct HttpChainFetcher {
    client: Client,
}

impl HttpChainFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, FetchFailure> {
        let url = format!("http://{peer}/chain");
        debug!(%url, "fetching peer chain");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;
        if resp.status() != StatusCode::OK {
            return Err(FetchFailure::Status(resp.status().as_u16()));
        }
        resp.json::<PeerChain>()
            .await
            .map_err(|e| FetchFailure::Malformed(e.to_string()))
    }
}
