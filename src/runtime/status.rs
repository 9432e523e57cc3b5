use crate::utils::config::Config;
use crate::utils::rpc::redact_endpoint;

/// Logs the fully resolved configuration. Endpoints are redacted to scheme and host.
pub fn emit_config_status(config: &Config) {
    tracing::info!(
        "[OPS] Chain resolved: {}({}) blocks_per_day={} fork_threshold={} REP",
        config.chain.name,
        config.chain.chain_id,
        config.chain.blocks_per_day(),
        config.chain.fork_threshold_rep
    );
    tracing::info!(
        "[OPS] Paths: manifest={} output={}",
        config.manifest_path.display(),
        config.output_path.display()
    );
    tracing::info!(
        "[OPS] Scan: lookback_days={} chunk_blocks={} chunk_delay_ms={} call_timeout_ms={} update_interval_min={}",
        config.lookback_days,
        config.log_chunk_blocks,
        config.log_chunk_delay_ms,
        config.rpc_call_timeout_ms,
        config.update_interval_minutes
    );

    let candidates = config
        .candidate_urls()
        .iter()
        .map(|url| redact_endpoint(url))
        .collect::<Vec<_>>();
    if candidates.is_empty() {
        tracing::warn!("[OPS] No RPC candidates configured; every run will fail connectivity.");
        return;
    }
    tracing::info!(
        "[OPS] RPC candidates ({}, override={}): {}",
        candidates.len(),
        config.rpc_override.is_some(),
        candidates.join(", ")
    );
}
