use crate::error::RpcError;
use crate::utils::rpc::{is_rate_limited_rpc_error, ChainReader};
use alloy::primitives::{Address, B256};
use alloy::rpc::types::{Filter, Log};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

/// Inclusive block range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub from: u64,
    pub to: u64,
}

impl BlockWindow {
    /// Window ending at `head` that spans roughly `days` worth of blocks.
    pub fn lookback(head: u64, days: u64, blocks_per_day: u64) -> Self {
        Self {
            from: head.saturating_sub(days.saturating_mul(blocks_per_day)),
            to: head,
        }
    }

    /// Splits the window into ascending inclusive chunks of at most `max_blocks` blocks.
    pub fn chunks(&self, max_blocks: u64) -> Vec<BlockWindow> {
        let step = max_blocks.max(1);
        let mut out = Vec::new();
        let mut start = self.from;
        while start <= self.to {
            let end = start.saturating_add(step - 1).min(self.to);
            out.push(BlockWindow {
                from: start,
                to: end,
            });
            if end == u64::MAX {
                break;
            }
            start = end + 1;
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScanParams {
    pub lookback_days: u64,
    pub blocks_per_day: u64,
    pub chunk_blocks: u64,
    pub chunk_delay_ms: u64,
}

/// How much of the requested window actually made it back from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub from_block: u64,
    pub to_block: u64,
    pub chunks_total: usize,
    pub chunks_failed: usize,
}

#[derive(Debug, Clone)]
pub struct LogBatch {
    pub head: u64,
    pub logs: Vec<Log>,
    pub coverage: Coverage,
}

/// Which logs to pull: emitter, event signature and optionally the first indexed topic.
#[derive(Debug, Clone, Copy)]
pub struct EventQuery {
    pub address: Address,
    pub topic0: B256,
    pub topic1: Option<B256>,
}

fn event_filter(query: &EventQuery, chunk: BlockWindow) -> Filter {
    let filter = Filter::new()
        .address(query.address)
        .event_signature(query.topic0)
        .from_block(chunk.from)
        .to_block(chunk.to);
    match query.topic1 {
        Some(topic) => filter.topic1(topic),
        None => filter,
    }
}

/// Fetches every log matching `query` over the lookback window, best-effort.
///
/// Only the head lookup is fatal. Chunk queries run sequentially in ascending order and
/// a failing chunk is logged and skipped.
pub async fn fetch_event_logs<C>(
    client: &C,
    query: EventQuery,
    params: ScanParams,
) -> Result<LogBatch, RpcError>
where
    C: ChainReader + ?Sized,
{
    let head = client.head_block().await?;
    let window = BlockWindow::lookback(head, params.lookback_days, params.blocks_per_day);
    let chunks = window.chunks(params.chunk_blocks);
    tracing::info!(
        "[SCAN] Querying {:#x} over blocks [{}..={}] in {} chunk(s) of <= {} blocks",
        query.address,
        window.from,
        window.to,
        chunks.len(),
        params.chunk_blocks
    );

    let mut logs = Vec::new();
    let mut failed = 0usize;
    for (idx, chunk) in chunks.iter().enumerate() {
        if idx > 0 && params.chunk_delay_ms > 0 {
            sleep(Duration::from_millis(params.chunk_delay_ms)).await;
        }
        match client.logs(&event_filter(&query, *chunk)).await {
            Ok(found) => {
                if !found.is_empty() {
                    tracing::debug!(
                        "[SCAN] Chunk [{}..={}] returned {} log(s)",
                        chunk.from,
                        chunk.to,
                        found.len()
                    );
                }
                logs.extend(found);
            }
            Err(err) => {
                failed += 1;
                let message = err.to_string();
                let class = if is_rate_limited_rpc_error(&message) {
                    "rate-limited"
                } else {
                    "error"
                };
                tracing::warn!(
                    "[SCAN] Chunk [{}..={}] skipped ({}): {}",
                    chunk.from,
                    chunk.to,
                    class,
                    message
                );
            }
        }
    }

    if failed > 0 {
        tracing::warn!(
            "[SCAN] {} of {} chunk(s) failed; continuing with partial results",
            failed,
            chunks.len()
        );
    }

    Ok(LogBatch {
        head,
        logs,
        coverage: Coverage {
            from_block: window.from,
            to_block: window.to,
            chunks_total: chunks.len(),
            chunks_failed: failed,
        },
    })
}
