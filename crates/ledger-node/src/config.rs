use crate::constants::{DEFAULT_HOST, DEFAULT_MINE_ATTEMPTS, DEFAULT_PEER_TIMEOUT_MS, DEFAULT_PORT};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node with longest-chain consensus")]
pub struct Config {
    /// Interface to listen on
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Trailing zero hex characters a proof digest must end with (1-64)
    #[arg(long, default_value_t = ledger_core::constants::DEFAULT_DIFFICULTY)]
    pub difficulty: usize,

    /// Peer to register at startup; repeatable
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Per-peer budget for fetching a chain during consensus
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT_MS)]
    pub peer_timeout_ms: u64,

    /// Spread the proof search over all cores
    #[arg(long)]
    pub parallel_mining: bool,

    /// Proof searches per /mine request before giving up on a moving tip
    #[arg(long, default_value_t = DEFAULT_MINE_ATTEMPTS)]
    pub mine_attempts: usize,

    /// Run consensus against all peers on this interval
    #[arg(long)]
    pub resolve_interval_secs: Option<u64>,

    /// Identity credited with mining rewards; random when omitted
    #[arg(long)]
    pub node_id: Option<String>,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }

    pub fn resolve_interval(&self) -> Option<Duration> {
        self.resolve_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_from(["ledger-node"])
    }
}
