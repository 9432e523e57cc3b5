const MAINNET_PUBLIC_RPCS: &[&str] = &[
    "https://ethereum-rpc.publicnode.com",
    "https://eth.llamarpc.com",
    "https://rpc.ankr.com/eth",
    "https://eth.drpc.org",
    "https://cloudflare-eth.com",
];

const SEPOLIA_PUBLIC_RPCS: &[&str] = &[
    "https://ethereum-sepolia-rpc.publicnode.com",
    "https://rpc.sepolia.org",
    "https://sepolia.drpc.org",
];

/// Stake that, reached by a single dispute bond, forks the universe (whole REP).
pub const MAINNET_FORK_THRESHOLD_REP: u64 = 200_000;

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub block_time_ms: u64,
    pub fork_threshold_rep: u64,
    pub public_rpc_urls: Vec<String>,
}

impl ChainConfig {
    /// Preset for a recognised chain id.
    pub fn known(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Self::mainnet()),
            11155111 => Some(Self::sepolia()),
            _ => None,
        }
    }

    pub fn get(chain_id: u64) -> Self {
        Self::known(chain_id).unwrap_or_else(|| {
            tracing::warn!(
                "[CONFIG] CHAIN_ID={} has no preset; using mainnet fork threshold and public RPCs",
                chain_id
            );
            Self::mainnet()
        })
    }

    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            name: "Ethereum Mainnet".to_string(),
            block_time_ms: 12_000,
            fork_threshold_rep: MAINNET_FORK_THRESHOLD_REP,
            public_rpc_urls: MAINNET_PUBLIC_RPCS.iter().map(|u| (*u).to_string()).collect(),
        }
    }

    pub fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            name: "Sepolia".to_string(),
            block_time_ms: 12_000,
            fork_threshold_rep: MAINNET_FORK_THRESHOLD_REP,
            public_rpc_urls: SEPOLIA_PUBLIC_RPCS.iter().map(|u| (*u).to_string()).collect(),
        }
    }

    /// Approximate block count per day; window math only, never used for timestamps.
    pub fn blocks_per_day(&self) -> u64 {
        (86_400_000 / self.block_time_ms.max(1)).max(1)
    }
}
