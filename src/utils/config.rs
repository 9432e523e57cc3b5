use crate::config::chains::ChainConfig;
use crate::error::Result;
use crate::utils::env_guard::is_placeholder_value;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub const DEFAULT_MANIFEST_PATH: &str = "data/contracts.json";
pub const DEFAULT_OUTPUT_PATH: &str = "public/data/fork-risk.json";
const DEFAULT_LOOKBACK_DAYS: u64 = 7;
pub const LOOKBACK_DAYS_RANGE: RangeInclusive<u64> = 1..=60;
const DEFAULT_LOG_CHUNK_BLOCKS: u64 = 2_000;
const DEFAULT_LOG_CHUNK_DELAY_MS: u64 = 0;
const DEFAULT_RPC_CALL_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_UPDATE_INTERVAL_MINUTES: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Operator endpoint tried before any public fallback.
    pub rpc_override: Option<String>,
    pub fallback_rpc_urls: Vec<String>,
    pub chain: ChainConfig,
    pub manifest_path: PathBuf,
    pub output_path: PathBuf,
    pub lookback_days: u64,
    pub log_chunk_blocks: u64,
    pub log_chunk_delay_ms: u64,
    pub rpc_call_timeout_ms: u64,
    pub update_interval_minutes: u64,
}

fn validate_http_url(name: &str, raw: &str) -> std::result::Result<(), String> {
    let parsed = raw
        .parse::<reqwest::Url>()
        .map_err(|e| format!("{name} must be a valid URL, got `{raw}`: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{name} must use http(s) scheme, got `{other}`")),
    }
}

fn bounded_u64<F>(lookup: &F, key: &str, range: RangeInclusive<u64>, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(v) if range.contains(&v) => v,
        _ => {
            tracing::warn!(
                "[CONFIG] {}=`{}` outside {}..={}; using default {}",
                key,
                raw.trim(),
                range.start(),
                range.end(),
                default
            );
            default
        }
    }
}

fn resolve_rpc_override(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if is_placeholder_value(trimmed) {
        tracing::warn!("[CONFIG] ETH_RPC_URL contains a placeholder value; ignoring override");
        return None;
    }
    if let Err(reason) = validate_http_url("ETH_RPC_URL", trimmed) {
        tracing::warn!("[CONFIG] Ignoring ETH_RPC_URL override: {}", reason);
        return None;
    }
    Some(trimmed.to_string())
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key source; `load` binds it to the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let chain_id = match lookup("CHAIN_ID") {
            Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<u64>() {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(
                        "[CONFIG] CHAIN_ID=`{}` is not a valid u64; using mainnet (1)",
                        raw.trim()
                    );
                    1
                }
            },
            _ => 1,
        };
        let chain = ChainConfig::get(chain_id);

        let rpc_override = resolve_rpc_override(lookup("ETH_RPC_URL"));

        let fallback_rpc_urls = match lookup("FALLBACK_RPC_URLS") {
            Some(raw) if !raw.trim().is_empty() => {
                let mut urls = Vec::new();
                for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    match validate_http_url("FALLBACK_RPC_URLS entry", item) {
                        Ok(()) => urls.push(item.to_string()),
                        Err(reason) => tracing::warn!("[CONFIG] {}", reason),
                    }
                }
                urls
            }
            _ => chain.public_rpc_urls.clone(),
        };

        let manifest_path = lookup("CONTRACT_MANIFEST_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MANIFEST_PATH.to_string());
        let output_path = lookup("RISK_OUTPUT_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());

        Ok(Self {
            rpc_override,
            fallback_rpc_urls,
            manifest_path: PathBuf::from(manifest_path),
            output_path: PathBuf::from(output_path),
            lookback_days: bounded_u64(
                &lookup,
                "LOOKBACK_DAYS",
                LOOKBACK_DAYS_RANGE,
                DEFAULT_LOOKBACK_DAYS,
            ),
            log_chunk_blocks: bounded_u64(
                &lookup,
                "LOG_CHUNK_BLOCKS",
                100..=100_000,
                DEFAULT_LOG_CHUNK_BLOCKS,
            ),
            log_chunk_delay_ms: bounded_u64(
                &lookup,
                "LOG_CHUNK_DELAY_MS",
                0..=10_000,
                DEFAULT_LOG_CHUNK_DELAY_MS,
            ),
            rpc_call_timeout_ms: bounded_u64(
                &lookup,
                "RPC_CALL_TIMEOUT_MS",
                250..=60_000,
                DEFAULT_RPC_CALL_TIMEOUT_MS,
            ),
            update_interval_minutes: bounded_u64(
                &lookup,
                "UPDATE_INTERVAL_MINUTES",
                1..=1_440,
                DEFAULT_UPDATE_INTERVAL_MINUTES,
            ),
            chain,
        })
    }

    /// Ordered, de-duplicated endpoint candidates: override first, then fallbacks.
    pub fn candidate_urls(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rpc_override
            .iter()
            .chain(self.fallback_rpc_urls.iter())
            .filter(|url| seen.insert(url.trim_end_matches('/').to_ascii_lowercase()))
            .cloned()
            .collect()
    }
}
