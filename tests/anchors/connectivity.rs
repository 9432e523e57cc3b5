use crate::anchor_utils::{stamp, FakeChain, FakeFactory, Workspace, RPC_A, RPC_B, RPC_C};
use fork_risk::engine::execute_at;
use fork_risk::risk::RiskLevel;

#[tokio::test(flavor = "current_thread")]
async fn all_endpoints_down_writes_unknown_artifact_and_fails() {
    let ws = Workspace::new();
    let factory = FakeFactory::new(FakeChain::default()).with_dead(&[RPC_A, RPC_B, RPC_C]);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;

    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.result.risk_level, RiskLevel::Unknown);
    assert_eq!(outcome.result.rpc_info.fallbacks_attempted, 3);
    assert_eq!(outcome.result.rpc_info.endpoint, "none");

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "unknown");
    assert_eq!(json["riskPercentage"], 0.0);
    assert_eq!(json["rpcInfo"]["fallbacksAttempted"], 3);
    assert!(json["error"]
        .as_str()
        .is_some_and(|e| e.contains("connection refused")));
    assert!(json["metrics"]["disputeDetails"]
        .as_array()
        .is_some_and(|d| d.is_empty()));
}

#[tokio::test(flavor = "current_thread")]
async fn falls_back_in_order_and_redacts_endpoint() {
    let ws = Workspace::new();
    let factory = FakeFactory::new(FakeChain::default()).with_dead(&[RPC_A]);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.result.rpc_info.endpoint, "https://rpc-b.example");
    assert_eq!(outcome.result.rpc_info.fallbacks_attempted, 1);
    assert_eq!(
        *factory.opened.lock().expect("opened list"),
        vec![RPC_A.to_string(), RPC_B.to_string()]
    );

    let raw = std::fs::read_to_string(ws.output_path()).expect("artifact written");
    assert!(!raw.contains("secret-key"));
}
