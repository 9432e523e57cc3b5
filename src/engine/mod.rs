//! One scoring run: connect, bind, read oracle state, aggregate disputes, score, persist.
//!
//! [`calculate`] never writes anything; [`execute`] owns the artifact and the exit code.

use crate::contracts::{
    self, BoundContract, BoundContracts, ContractManifest, DisputeCrowdsourcerCreated,
};
use crate::disputes::{self, AggregateParams};
use crate::error::{ForkRiskError, Result};
use crate::report::{ChainSnapshot, RiskResult, RunStamp};
use crate::risk::{assess, ForkState};
use crate::scanner::{fetch_event_logs, EventQuery, ScanParams};
use crate::storage::artifact::write_artifact;
use crate::utils::config::Config;
use crate::utils::error::compact_error_message;
use crate::utils::rpc::{connect, ChainReader, ClientFactory, RpcConnection};
use alloy::sol_types::SolEvent;
use chrono::Utc;

/// Upper bound on error text persisted into the artifact.
pub const ARTIFACT_ERROR_MAX_LEN: usize = 512;
const FALLBACK_TOKEN_DECIMALS: u8 = 18;

/// A failed calculation, with the connection it had reached (if any).
#[derive(Debug)]
pub struct RunFailure {
    pub error: ForkRiskError,
    pub rpc: Option<RpcConnection>,
}

impl RunFailure {
    fn rpc_info(&self) -> RpcConnection {
        self.rpc.clone().unwrap_or_else(|| {
            RpcConnection::unavailable(self.error.endpoints_attempted().unwrap_or(0))
        })
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub result: RiskResult,
    pub exit_code: i32,
}

async fn decimals_or_default<C>(client: &C, token: &BoundContract) -> u8
where
    C: ChainReader + ?Sized,
{
    match contracts::token_decimals(client, token).await {
        Ok(decimals) => decimals,
        Err(err) => {
            tracing::warn!(
                "[BIND] {}.decimals() unavailable ({}); assuming {}",
                token.name,
                err,
                FALLBACK_TOKEN_DECIMALS
            );
            FALLBACK_TOKEN_DECIMALS
        }
    }
}

async fn read_open_interest<C>(client: &C, bound: &BoundContracts) -> Option<f64>
where
    C: ChainReader + ?Sized,
{
    if !bound.exposes_open_interest {
        return None;
    }
    match contracts::open_interest_atto_cash(client, bound).await {
        Ok(raw) => {
            let decimals = decimals_or_default(client, &bound.cash).await;
            Some(disputes::atto_to_decimal(raw, decimals))
        }
        Err(err) => {
            tracing::warn!("[RISK] Open interest unavailable: {}", err);
            None
        }
    }
}

async fn score_connected<C>(
    client: &C,
    rpc: RpcConnection,
    config: &Config,
    stamp: &RunStamp,
) -> Result<RiskResult>
where
    C: ChainReader + ?Sized,
{
    let manifest = ContractManifest::load(&config.manifest_path)?;
    let bound = contracts::bind(&manifest, client).await?;
    let threshold = config.chain.fork_threshold_rep as f64;
    let blocks_per_day = config.chain.blocks_per_day();

    let state = ForkState::from(contracts::is_forking(client, &bound).await?);
    let (assessment, mut snapshot) = match state {
        ForkState::Forking => {
            tracing::warn!("[RISK] Universe is FORKING; dispute scan skipped");
            let snapshot = ChainSnapshot {
                block_number: client.head_block().await.ok(),
                active_disputes: 1,
                ..ChainSnapshot::default()
            };
            (assess(state, &[], threshold), snapshot)
        }
        ForkState::Normal => {
            let stake_decimals = decimals_or_default(client, &bound.reputation_token).await;
            let batch = fetch_event_logs(
                client,
                EventQuery {
                    address: bound.augur.address,
                    topic0: DisputeCrowdsourcerCreated::SIGNATURE_HASH,
                    topic1: Some(bound.universe.address.into_word()),
                },
                ScanParams {
                    lookback_days: config.lookback_days,
                    blocks_per_day,
                    chunk_blocks: config.log_chunk_blocks,
                    chunk_delay_ms: config.log_chunk_delay_ms,
                },
            )
            .await?;
            let events = disputes::decode_dispute_logs(&batch.logs, bound.universe.address)?;
            let summary = disputes::aggregate(
                client,
                events,
                AggregateParams {
                    head: batch.head,
                    blocks_per_day,
                    stake_decimals,
                },
            )
            .await;
            let snapshot = ChainSnapshot {
                block_number: Some(batch.head),
                active_disputes: summary.total_active,
                open_interest_cash: None,
                coverage: Some(batch.coverage),
            };
            (assess(state, &summary.records, threshold), snapshot)
        }
    };
    snapshot.open_interest_cash = read_open_interest(client, &bound).await;

    tracing::info!(
        "[RISK] level={} percentage={:.4} largest_bond={} REP active_disputes={}",
        assessment.risk_level.as_str(),
        assessment.risk_percentage,
        assessment.largest_dispute_bond,
        snapshot.active_disputes
    );
    Ok(RiskResult::success(stamp, rpc, assessment, snapshot))
}

/// Produces a scored result or the failure that prevented one. Touches the network only.
pub async fn calculate<F>(
    config: &Config,
    factory: &F,
    stamp: &RunStamp,
) -> std::result::Result<RiskResult, RunFailure>
where
    F: ClientFactory,
{
    let (client, rpc) = connect(factory, &config.candidate_urls())
        .await
        .map_err(|error| RunFailure { error, rpc: None })?;

    score_connected(&client, rpc.clone(), config, stamp)
        .await
        .map_err(|error| RunFailure {
            error,
            rpc: Some(rpc),
        })
}

fn persist_failure(
    config: &Config,
    stamp: &RunStamp,
    rpc: RpcConnection,
    error: &ForkRiskError,
) -> RiskResult {
    let message = compact_error_message(&error.to_string(), ARTIFACT_ERROR_MAX_LEN);
    tracing::error!("[RUN] Calculation failed: {}", message);
    let result = RiskResult::failure(stamp, rpc, message);
    if let Err(write_err) = write_artifact(&config.output_path, &result) {
        tracing::error!("[RUN] Error artifact could not be written either: {}", write_err);
    }
    result
}

/// Runs once at `stamp` and always attempts to leave an artifact behind.
pub async fn execute_at<F>(config: &Config, factory: &F, stamp: &RunStamp) -> RunOutcome
where
    F: ClientFactory,
{
    match calculate(config, factory, stamp).await {
        Ok(result) => match write_artifact(&config.output_path, &result) {
            Ok(()) => RunOutcome {
                result,
                exit_code: 0,
            },
            Err(err) => RunOutcome {
                result: persist_failure(config, stamp, result.rpc_info.clone(), &err),
                exit_code: 1,
            },
        },
        Err(failure) => RunOutcome {
            result: persist_failure(config, stamp, failure.rpc_info(), &failure.error),
            exit_code: 1,
        },
    }
}

pub async fn execute<F>(config: &Config, factory: &F) -> RunOutcome
where
    F: ClientFactory,
{
    let stamp = RunStamp::for_config(config, Utc::now());
    execute_at(config, factory, &stamp).await
}
