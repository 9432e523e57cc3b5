use crate::anchor_utils::{
    dispute_log, market, rep, stamp, universe_dispute_log, FakeChain, FakeFactory, Workspace,
    HEAD,
};
use alloy::primitives::Address;
use fork_risk::engine::execute_at;
use fork_risk::report::PERSISTED_CAP;

#[tokio::test(flavor = "current_thread")]
async fn no_disputes_scores_low_zero() {
    let ws = Workspace::new();
    let factory = FakeFactory::new(FakeChain::default());

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 0);

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "low");
    assert_eq!(json["riskPercentage"], 0.0);
    assert_eq!(json["blockNumber"], HEAD);
    assert_eq!(json["metrics"]["largestDisputeBond"], 0.0);
    assert_eq!(json["metrics"]["activeDisputes"], 0);
    assert!(json["metrics"]["disputeDetails"]
        .as_array()
        .is_some_and(|d| d.is_empty()));
    assert!(json["metrics"].get("openInterestCash").is_none());
    assert_eq!(json["nextUpdate"], "2026-10-19T10:30:00Z");
    assert!(json.get("error").is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn largest_bond_three_quarters_of_threshold_is_critical() {
    let ws = Workspace::new();
    let chain = FakeChain {
        logs: vec![dispute_log(1, 150_000, 7_200), dispute_log(2, 20_000, 100)],
        open_interest: Some(rep(1_000_000)),
        ..FakeChain::default()
    };
    let factory = FakeFactory::new(chain);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 0);

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "critical");
    assert_eq!(json["riskPercentage"], 75.0);
    assert_eq!(json["metrics"]["forkThresholdPercent"], 75.0);
    assert_eq!(json["metrics"]["largestDisputeBond"], 150_000.0);
    assert_eq!(json["metrics"]["activeDisputes"], 2);
    assert_eq!(json["metrics"]["openInterestCash"], 1_000_000.0);

    let top = &json["metrics"]["disputeDetails"][0];
    assert_eq!(top["marketId"], format!("{:#x}", market(1)));
    assert_eq!(top["bondSizeRep"], 150_000.0);
    assert_eq!(top["daysRemaining"], 6);
    assert_eq!(top["disputeRound"], 19);
    assert_eq!(top["roundSource"], "estimated");

    assert_eq!(json["calculation"]["method"], "bond_vs_fork_threshold");
    assert_eq!(json["calculation"]["forkThreshold"], 200_000);
    assert_eq!(json["calculation"]["lookbackDays"], 7);
    assert_eq!(json["coverage"]["fromBlock"], HEAD - 7 * 7_200);
    assert_eq!(json["coverage"]["toBlock"], HEAD);
    assert_eq!(json["coverage"]["chunksTotal"], 26);
    assert_eq!(json["coverage"]["chunksFailed"], 0);
}

#[tokio::test(flavor = "current_thread")]
async fn details_are_capped_sorted_and_skip_finalized_markets() {
    let ws = Workspace::new();
    let mut logs: Vec<_> = (1..=8u8)
        .map(|n| dispute_log(n, u128::from(n) * 1_000, u64::from(n) * 10))
        .collect();
    logs.push(dispute_log(9, 9_000, 5));
    // Lower bond for an already-seen market collapses into the larger one.
    logs.push(dispute_log(8, 10, 1));
    let chain = FakeChain {
        logs,
        finalized_markets: [market(9)].into_iter().collect(),
        ..FakeChain::default()
    };
    let factory = FakeFactory::new(chain);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 0);

    let details = &outcome.result.metrics.dispute_details;
    assert_eq!(outcome.result.metrics.active_disputes, 8);
    assert_eq!(details.len(), PERSISTED_CAP);
    assert_eq!(details[0].bond_size_rep, 8_000.0);
    assert!(details
        .windows(2)
        .all(|w| w[0].bond_size_rep >= w[1].bond_size_rep));
    assert!(details
        .iter()
        .all(|d| d.market_id != format!("{:#x}", market(9))));
}

#[tokio::test(flavor = "current_thread")]
async fn failed_chunk_still_yields_remaining_records() {
    let ws = Workspace::new();
    let window_start = HEAD - 7 * 7_200;
    let chain = FakeChain {
        logs: vec![dispute_log(1, 100_000, 50_000), dispute_log(2, 50_000, 100)],
        failing_chunk_starts: [window_start].into_iter().collect(),
        ..FakeChain::default()
    };
    let factory = FakeFactory::new(chain);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 0);

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "high");
    assert_eq!(json["riskPercentage"], 25.0);
    assert_eq!(json["metrics"]["activeDisputes"], 1);
    assert_eq!(
        json["metrics"]["disputeDetails"][0]["marketId"],
        format!("{:#x}", market(2))
    );
    assert_eq!(json["coverage"]["chunksFailed"], 1);
    assert_eq!(json["coverage"]["chunksTotal"], 26);
}

#[tokio::test(flavor = "current_thread")]
async fn repeated_runs_over_unchanged_chain_agree() {
    let ws = Workspace::new();
    let chain = FakeChain {
        logs: (1..=7u8)
            .map(|n| dispute_log(n, 500, u64::from(n) * 1_000))
            .collect(),
        ..FakeChain::default()
    };
    let factory = FakeFactory::new(chain);
    let run_stamp = stamp(&ws.config);

    let mut first = execute_at(&ws.config, &factory, &run_stamp).await.result;
    let mut second = execute_at(&ws.config, &factory, &run_stamp).await.result;
    first.rpc_info.latency_ms = 0;
    second.rpc_info.latency_ms = 0;

    assert_eq!(first, second);
    let ids: Vec<_> = first
        .metrics
        .dispute_details
        .iter()
        .map(|d| d.market_id.clone())
        .collect();
    let expected: Vec<_> = (1..=5u8).map(|n| format!("{:#x}", market(n))).collect();
    assert_eq!(ids, expected, "equal bonds break ties by market id");
}

fn foreign_universe() -> Address {
    Address::repeat_byte(0x77)
}

#[tokio::test(flavor = "current_thread")]
async fn disputes_from_other_universes_are_not_scored() {
    let ws = Workspace::new();
    let chain = FakeChain {
        logs: vec![universe_dispute_log(foreign_universe(), 1, 180_000, 100)],
        ..FakeChain::default()
    };
    let factory = FakeFactory::new(chain);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 0);

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "low");
    assert_eq!(json["riskPercentage"], 0.0);
    assert_eq!(json["metrics"]["activeDisputes"], 0);
    assert!(json["metrics"]["disputeDetails"]
        .as_array()
        .is_some_and(|d| d.is_empty()));
}

#[tokio::test(flavor = "current_thread")]
async fn foreign_universe_logs_are_dropped_when_provider_ignores_topics() {
    let ws = Workspace::new();
    let chain = FakeChain {
        logs: vec![
            universe_dispute_log(foreign_universe(), 1, 180_000, 100),
            dispute_log(2, 20_000, 200),
        ],
        ignore_topic_filters: true,
        ..FakeChain::default()
    };
    let factory = FakeFactory::new(chain);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 0);

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "moderate");
    assert_eq!(json["riskPercentage"], 10.0);
    assert_eq!(json["metrics"]["largestDisputeBond"], 20_000.0);
    assert_eq!(json["metrics"]["activeDisputes"], 1);
    assert_eq!(
        json["metrics"]["disputeDetails"][0]["marketId"],
        format!("{:#x}", market(2))
    );
}
