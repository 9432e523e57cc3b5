//! The JSON document handed to the presentation layer.
//!
//! Exactly one [`RiskResult`] is produced per run. `error` is populated if and only if
//! `riskLevel` is `unknown`; both constructors below uphold that.

use crate::disputes::{rank, DisputeRecord};
use crate::risk::{Assessment, RiskLevel, METHOD_BOND_VS_THRESHOLD};
use crate::scanner::Coverage;
use crate::utils::config::Config;
use crate::utils::rpc::RpcConnection;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Dispute records written to the artifact.
pub const PERSISTED_CAP: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub largest_dispute_bond: f64,
    pub fork_threshold_percent: f64,
    pub active_disputes: usize,
    pub dispute_details: Vec<DisputeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_interest_cash: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub method: String,
    pub fork_threshold: u64,
    pub lookback_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub risk_level: RiskLevel,
    pub risk_percentage: f64,
    pub metrics: Metrics,
    pub next_update: DateTime<Utc>,
    pub rpc_info: RpcConnection,
    pub calculation: Calculation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run-level facts shared by the success and error artifacts.
#[derive(Debug, Clone)]
pub struct RunStamp {
    pub timestamp: DateTime<Utc>,
    pub update_interval_minutes: u64,
    pub fork_threshold: u64,
    pub lookback_days: u64,
}

impl RunStamp {
    pub fn for_config(config: &Config, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            update_interval_minutes: config.update_interval_minutes,
            fork_threshold: config.chain.fork_threshold_rep,
            lookback_days: config.lookback_days,
        }
    }

    fn next_update(&self) -> DateTime<Utc> {
        let minutes = i64::try_from(self.update_interval_minutes).unwrap_or(60);
        self.timestamp + Duration::minutes(minutes)
    }

    fn calculation(&self) -> Calculation {
        Calculation {
            method: METHOD_BOND_VS_THRESHOLD.to_string(),
            fork_threshold: self.fork_threshold,
            lookback_days: self.lookback_days,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChainSnapshot {
    pub block_number: Option<u64>,
    pub active_disputes: usize,
    pub open_interest_cash: Option<f64>,
    pub coverage: Option<Coverage>,
}

impl RiskResult {
    pub fn success(
        stamp: &RunStamp,
        rpc_info: RpcConnection,
        assessment: Assessment,
        snapshot: ChainSnapshot,
    ) -> Self {
        let mut details = assessment.disputes;
        rank(&mut details);
        details.truncate(PERSISTED_CAP);

        Self {
            timestamp: stamp.timestamp,
            block_number: snapshot.block_number,
            risk_level: assessment.risk_level,
            risk_percentage: assessment.risk_percentage,
            metrics: Metrics {
                largest_dispute_bond: assessment.largest_dispute_bond,
                fork_threshold_percent: assessment.risk_percentage,
                active_disputes: snapshot.active_disputes,
                dispute_details: details,
                open_interest_cash: snapshot.open_interest_cash,
            },
            next_update: stamp.next_update(),
            rpc_info,
            calculation: stamp.calculation(),
            coverage: snapshot.coverage,
            error: None,
        }
    }

    /// Explicit "unknown" artifact written when the run could not produce a score.
    pub fn failure(stamp: &RunStamp, rpc_info: RpcConnection, error: String) -> Self {
        let error = if error.trim().is_empty() {
            "unspecified failure".to_string()
        } else {
            error
        };
        Self {
            timestamp: stamp.timestamp,
            block_number: None,
            risk_level: RiskLevel::Unknown,
            risk_percentage: 0.0,
            metrics: Metrics {
                largest_dispute_bond: 0.0,
                fork_threshold_percent: 0.0,
                active_disputes: 0,
                dispute_details: Vec::new(),
                open_interest_cash: None,
            },
            next_update: stamp.next_update(),
            rpc_info,
            calculation: stamp.calculation(),
            coverage: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
