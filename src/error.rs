use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForkRiskError>;

#[derive(Debug, Error)]
pub enum ForkRiskError {
    #[error("all {attempted} RPC endpoint(s) failed liveness probe: {last_error}")]
    Connectivity { attempted: usize, last_error: String },
    #[error("network error: {0}")]
    Rpc(#[from] RpcError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("event decode failed: {0}")]
    Decode(String),
    #[error("artifact write failed: {0}")]
    Artifact(String),
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("{method} timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },
    #[error("{method} returned undecodable data: {reason}")]
    BadResponse { method: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("contract manifest `{path}` could not be read: {reason}")]
    ManifestUnreadable { path: String, reason: String },
    #[error("contract manifest `{path}` is malformed: {reason}")]
    ManifestMalformed { path: String, reason: String },
    #[error("contract manifest is missing required entry `{0}`")]
    MissingContract(String),
    #[error("contract `{name}` has invalid address `{raw}`")]
    InvalidAddress { name: String, raw: String },
    #[error("contract `{name}` ABI does not declare `{signature}`")]
    AbiMismatch { name: String, signature: String },
    #[error("contract `{name}` has no deployed code at {address}")]
    NoCode { name: String, address: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ForkRiskError {
    /// Number of endpoints that were tried and abandoned before this error surfaced.
    pub fn endpoints_attempted(&self) -> Option<usize> {
        match self {
            Self::Connectivity { attempted, .. } => Some(*attempted),
            _ => None,
        }
    }
}
