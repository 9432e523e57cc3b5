use crate::contracts::{market_is_finalized, DisputeCrowdsourcerCreated};
use crate::error::ForkRiskError;
use crate::utils::rpc::ChainReader;
use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records kept after ranking; the artifact persists fewer.
pub const RETRIEVAL_CAP: usize = 10;
/// Rough opening bond (REP) used to back out an escalation round from a bond size.
pub const INITIAL_BOND_ESTIMATE_REP: f64 = 0.35;
/// Length of one dispute round.
pub const DISPUTE_ROUND_DAYS: u64 = 7;
const DEFAULT_ROUND: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeEvent {
    pub market: Address,
    pub crowdsourcer: Address,
    pub size: U256,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundSource {
    /// Backed out of the bond size with the log2 heuristic.
    Estimated,
    /// Market lookup failed; placeholder round.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeRecord {
    pub market_id: String,
    pub title: String,
    pub bond_size_rep: f64,
    pub dispute_round: u32,
    pub days_remaining: u32,
    pub round_source: RoundSource,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisputeSummary {
    /// Active disputes found before the retrieval cap was applied.
    pub total_active: usize,
    /// Ranked descending by bond, at most [`RETRIEVAL_CAP`] entries.
    pub records: Vec<DisputeRecord>,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateParams {
    pub head: u64,
    pub blocks_per_day: u64,
    pub stake_decimals: u8,
}

/// Decodes crowdsourcer logs by field name and keeps those raised for `universe`.
///
/// Any log that does not match the event schema aborts decoding: a mismatch means the ABI
/// drifted and every record would be wrong.
pub fn decode_dispute_logs(
    logs: &[Log],
    universe: Address,
) -> Result<Vec<DisputeEvent>, ForkRiskError> {
    let mut foreign = 0usize;
    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        let decoded =
            DisputeCrowdsourcerCreated::decode_log_data(log.data(), true).map_err(|err| {
                ForkRiskError::Decode(format!(
                    "{} at block {:?} tx {:?}: {}",
                    DisputeCrowdsourcerCreated::SIGNATURE,
                    log.block_number,
                    log.transaction_hash,
                    err
                ))
            })?;
        if decoded.universe != universe {
            foreign += 1;
            continue;
        }
        events.push(DisputeEvent {
            market: decoded.market,
            crowdsourcer: decoded.disputeCrowdsourcer,
            size: decoded.size,
            block_number: log.block_number,
        });
    }
    if foreign > 0 {
        tracing::warn!(
            "[DISPUTES] Ignored {} log(s) raised for a universe other than {:#x}",
            foreign,
            universe
        );
    }
    Ok(events)
}

pub fn atto_to_decimal(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or_else(|| {
            value.to_string().parse::<f64>().unwrap_or(0.0) / 10f64.powi(i32::from(decimals))
        })
}

/// `max(1, ceil(log2(bond / INITIAL_BOND_ESTIMATE_REP)))`; best-effort metadata only.
pub fn estimate_round(bond_rep: f64) -> u32 {
    if !bond_rep.is_finite() || bond_rep <= INITIAL_BOND_ESTIMATE_REP {
        return 1;
    }
    let round = (bond_rep / INITIAL_BOND_ESTIMATE_REP).log2().ceil();
    (round as u32).max(1)
}

pub fn days_remaining(head: u64, event_block: Option<u64>, blocks_per_day: u64) -> u32 {
    let age_blocks = event_block.map_or(0, |b| head.saturating_sub(b));
    let age_days = age_blocks / blocks_per_day.max(1);
    DISPUTE_ROUND_DAYS.saturating_sub(age_days) as u32
}

pub fn market_title(market: Address) -> String {
    let hex = format!("{market:#x}");
    format!("Market {}...{}", &hex[..6], &hex[hex.len() - 4..])
}

/// Keeps the largest bond per market; later blocks win ties.
fn collapse_by_market(events: Vec<DisputeEvent>) -> BTreeMap<Address, DisputeEvent> {
    let mut by_market: BTreeMap<Address, DisputeEvent> = BTreeMap::new();
    for event in events {
        match by_market.get(&event.market) {
            Some(existing)
                if (existing.size, existing.block_number) >= (event.size, event.block_number) => {}
            _ => {
                by_market.insert(event.market, event);
            }
        }
    }
    by_market
}

pub fn rank(records: &mut [DisputeRecord]) {
    records.sort_by(|a, b| {
        b.bond_size_rep
            .total_cmp(&a.bond_size_rep)
            .then_with(|| a.market_id.cmp(&b.market_id))
    });
}

/// Turns decoded events into ranked records, dropping markets that already resolved.
///
/// A failing market lookup keeps the record with a default round.
pub async fn aggregate<C>(
    client: &C,
    events: Vec<DisputeEvent>,
    params: AggregateParams,
) -> DisputeSummary
where
    C: ChainReader + ?Sized,
{
    let raw_count = events.len();
    let by_market = collapse_by_market(events);
    let mut records = Vec::with_capacity(by_market.len());
    let mut resolved = 0usize;
    let mut lookup_failures = 0usize;

    for (market, event) in by_market {
        let bond_size_rep = atto_to_decimal(event.size, params.stake_decimals);
        let (dispute_round, round_source) = match market_is_finalized(client, market).await {
            Ok(true) => {
                resolved += 1;
                continue;
            }
            Ok(false) => (estimate_round(bond_size_rep), RoundSource::Estimated),
            Err(err) => {
                lookup_failures += 1;
                tracing::warn!(
                    "[DISPUTES] Market lookup failed for {:#x}; keeping with default round: {}",
                    market,
                    err
                );
                (DEFAULT_ROUND, RoundSource::Default)
            }
        };
        records.push(DisputeRecord {
            market_id: format!("{market:#x}"),
            title: market_title(market),
            bond_size_rep,
            dispute_round,
            days_remaining: days_remaining(params.head, event.block_number, params.blocks_per_day),
            round_source,
        });
    }

    rank(&mut records);
    let total_active = records.len();
    records.truncate(RETRIEVAL_CAP);
    tracing::info!(
        "[DISPUTES] {} event(s) -> {} active market(s) (resolved={} lookup_failures={})",
        raw_count,
        total_active,
        resolved,
        lookup_failures
    );

    DisputeSummary {
        total_active,
        records,
    }
}
