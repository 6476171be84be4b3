pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_PEER_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MINE_ATTEMPTS: usize = 3;
pub const NODE_ID_BYTES: usize = 16;
