use crate::error::{ForkRiskError, RpcError};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::transports::http::Http;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use tokio::time::{timeout, Duration};

const RPC_ERR_MAX_LEN: usize = 260;

pub type HttpProvider = RootProvider<Http<Client>>;

/// The endpoint a run settled on. Produced once by [`connect`] and passed by value afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcConnection {
    pub endpoint: String,
    pub latency_ms: u64,
    pub fallbacks_attempted: usize,
}

impl RpcConnection {
    /// Placeholder used in error artifacts when no endpoint answered.
    pub fn unavailable(fallbacks_attempted: usize) -> Self {
        Self {
            endpoint: "none".to_string(),
            latency_ms: 0,
            fallbacks_attempted,
        }
    }
}

/// Read-only chain access used by every pipeline stage.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn head_block(&self) -> Result<u64, RpcError>;
    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, RpcError>;
    async fn eth_call(&self, to: Address, input: Bytes) -> Result<Bytes, RpcError>;
    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError>;
}

/// Opens a client for one candidate URL. Opening must not touch the network.
pub trait ClientFactory {
    type Client: ChainReader;

    fn open(&self, url: &str) -> Result<Self::Client, RpcError>;
}

pub fn is_rate_limited_rpc_error(message: &str) -> bool {
    let msg = message.to_ascii_lowercase();
    msg.contains("429")
        || msg.contains("rate limit")
        || msg.contains("too many requests")
        || msg.contains("compute units per second")
        || msg.contains("-32005")
}

fn compact_rpc_error_message(message: &str) -> String {
    crate::utils::error::compact_error_message(message, RPC_ERR_MAX_LEN)
}

/// Reduces a URL to `scheme://host[:port]` so provider API keys never reach logs or artifacts.
pub fn redact_endpoint(url: &str) -> String {
    match url.parse::<reqwest::Url>() {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("unknown");
            match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            }
        }
        Err(_) => "invalid-url".to_string(),
    }
}

async fn with_deadline<T, E, Fut>(method: &str, timeout_ms: u64, fut: Fut) -> Result<T, RpcError>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    match timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(RpcError::Transport(compact_rpc_error_message(&format!(
            "{method}: {err}"
        )))),
        Err(_) => Err(RpcError::Timeout {
            method: method.to_string(),
            timeout_ms,
        }),
    }
}

/// Alloy HTTP provider with a per-call deadline.
pub struct TimedHttpClient {
    provider: HttpProvider,
    timeout_ms: u64,
}

#[async_trait]
impl ChainReader for TimedHttpClient {
    async fn head_block(&self) -> Result<u64, RpcError> {
        with_deadline("eth_blockNumber", self.timeout_ms, async {
            self.provider.get_block_number().await
        })
        .await
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, RpcError> {
        with_deadline("eth_getLogs", self.timeout_ms, async {
            self.provider.get_logs(filter).await
        })
        .await
    }

    async fn eth_call(&self, to: Address, input: Bytes) -> Result<Bytes, RpcError> {
        let request = TransactionRequest::default().with_to(to).with_input(input);
        with_deadline("eth_call", self.timeout_ms, async {
            self.provider.call(&request).await
        })
        .await
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError> {
        with_deadline("eth_getCode", self.timeout_ms, async {
            self.provider.get_code_at(address).await
        })
        .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HttpClientFactory {
    pub timeout_ms: u64,
}

impl ClientFactory for HttpClientFactory {
    type Client = TimedHttpClient;

    fn open(&self, url: &str) -> Result<Self::Client, RpcError> {
        let parsed = url.trim().parse::<reqwest::Url>().map_err(|e| RpcError::InvalidUrl {
            url: redact_endpoint(url),
            reason: e.to_string(),
        })?;
        Ok(TimedHttpClient {
            provider: ProviderBuilder::new().on_http(parsed),
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Walks `candidates` in order and returns the first endpoint that answers `eth_blockNumber`.
///
/// A failed endpoint is abandoned for the rest of the run. When nothing answers the run
/// fails with [`ForkRiskError::Connectivity`]; no synthetic chain data is ever substituted.
pub async fn connect<F>(
    factory: &F,
    candidates: &[String],
) -> Result<(F::Client, RpcConnection), ForkRiskError>
where
    F: ClientFactory,
{
    let mut failures = 0usize;
    let mut last_error = "no RPC candidates configured".to_string();

    for url in candidates {
        let endpoint = redact_endpoint(url);
        let started = Instant::now();
        let client = match factory.open(url) {
            Ok(client) => client,
            Err(err) => {
                failures += 1;
                tracing::warn!("[RPC] Skipping {}: {}", endpoint, err);
                last_error = err.to_string();
                continue;
            }
        };

        match client.head_block().await {
            Ok(head) => {
                let latency_ms = started.elapsed().as_millis().min(u64::MAX as u128) as u64;
                tracing::info!(
                    "[RPC] Connected to {} (head=#{} latency={}ms fallbacks={})",
                    endpoint,
                    head,
                    latency_ms,
                    failures
                );
                return Ok((
                    client,
                    RpcConnection {
                        endpoint,
                        latency_ms,
                        fallbacks_attempted: failures,
                    },
                ));
            }
            Err(err) => {
                failures += 1;
                tracing::warn!("[RPC] Liveness probe failed for {}: {}", endpoint, err);
                last_error = err.to_string();
            }
        }
    }

    Err(ForkRiskError::Connectivity {
        attempted: failures,
        last_error,
    })
}
