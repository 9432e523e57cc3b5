use crate::disputes::{estimate_round, DisputeRecord, RoundSource};
use serde::{Deserialize, Serialize};

pub const CRITICAL_FLOOR_PERCENT: f64 = 75.0;
pub const HIGH_FLOOR_PERCENT: f64 = 25.0;
pub const MODERATE_FLOOR_PERCENT: f64 = 10.0;
/// Name recorded in the artifact for the single-factor formula.
pub const METHOD_BOND_VS_THRESHOLD: &str = "bond_vs_fork_threshold";
/// Augur forking period.
const FORK_PERIOD_DAYS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
    Unknown,
}

impl RiskLevel {
    /// Tier for a percentage; every tier is closed on its lower bound.
    pub fn from_percent(percent: f64) -> Self {
        if percent >= CRITICAL_FLOOR_PERCENT {
            Self::Critical
        } else if percent >= HIGH_FLOOR_PERCENT {
            Self::High
        } else if percent >= MODERATE_FLOOR_PERCENT {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkState {
    Normal,
    Forking,
}

impl From<bool> for ForkState {
    fn from(is_forking: bool) -> Self {
        if is_forking {
            Self::Forking
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub risk_percentage: f64,
    pub risk_level: RiskLevel,
    pub largest_dispute_bond: f64,
    pub disputes: Vec<DisputeRecord>,
}

/// `clamp(bond / threshold * 100, 0, 100)`. Degenerate inputs score zero.
pub fn risk_percentage(largest_bond: f64, fork_threshold: f64) -> f64 {
    if !largest_bond.is_finite() || !fork_threshold.is_finite() || fork_threshold <= 0.0 {
        return 0.0;
    }
    (largest_bond / fork_threshold * 100.0).clamp(0.0, 100.0)
}

pub fn score(largest_bond: f64, fork_threshold: f64) -> (f64, RiskLevel) {
    let percent = risk_percentage(largest_bond, fork_threshold);
    (percent, RiskLevel::from_percent(percent))
}

/// Synthetic record reported while the universe is forking.
pub fn forking_marker(fork_threshold: f64) -> DisputeRecord {
    DisputeRecord {
        market_id: "fork".to_string(),
        title: "Universe fork in progress".to_string(),
        bond_size_rep: fork_threshold,
        dispute_round: estimate_round(fork_threshold),
        days_remaining: FORK_PERIOD_DAYS,
        round_source: RoundSource::Estimated,
    }
}

/// Scores the ranked disputes, or returns the terminal result when the universe is forking.
///
/// `disputes` must already be sorted descending by bond.
pub fn assess(state: ForkState, disputes: &[DisputeRecord], fork_threshold: f64) -> Assessment {
    match state {
        ForkState::Forking => Assessment {
            risk_percentage: 100.0,
            risk_level: RiskLevel::Critical,
            largest_dispute_bond: fork_threshold,
            disputes: vec![forking_marker(fork_threshold)],
        },
        ForkState::Normal => {
            let largest = disputes
                .iter()
                .map(|d| d.bond_size_rep)
                .fold(0.0_f64, f64::max);
            let (risk_percentage, risk_level) = score(largest, fork_threshold);
            Assessment {
                risk_percentage,
                risk_level,
                largest_dispute_bond: largest,
                disputes: disputes.to_vec(),
            }
        }
    }
}
