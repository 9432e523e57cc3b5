use crate::anchor_utils::{dispute_log, stamp, FakeChain, FakeFactory, Workspace, HEAD};
use fork_risk::engine::execute_at;
use fork_risk::risk::RiskLevel;

#[tokio::test(flavor = "current_thread")]
async fn forking_universe_is_terminal_regardless_of_disputes() {
    for logs in [Vec::new(), vec![dispute_log(1, 10, 100), dispute_log(2, 5, 200)]] {
        let ws = Workspace::new();
        let chain = FakeChain {
            forking: true,
            logs,
            ..FakeChain::default()
        };
        let factory = FakeFactory::new(chain);

        let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(*factory.chain.log_queries.lock().expect("counter"), 0);

        let json = ws.read_artifact();
        assert_eq!(json["riskLevel"], "critical");
        assert_eq!(json["riskPercentage"], 100.0);
        assert_eq!(json["blockNumber"], HEAD);
        assert_eq!(json["metrics"]["activeDisputes"], 1);
        assert_eq!(json["metrics"]["largestDisputeBond"], 200_000.0);
        let details = json["metrics"]["disputeDetails"]
            .as_array()
            .expect("details array");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["marketId"], "fork");
        assert!(json.get("error").is_none());
        assert_eq!(outcome.result.risk_level, RiskLevel::Critical);
    }
}
