use crate::anchor_utils::{
    dispute_log, malformed_log, stamp, FakeChain, FakeFactory, Workspace, MANIFEST, RPC_A, RPC_B,
    RPC_C,
};
use fork_risk::engine::{calculate, execute_at};
use fork_risk::risk::RiskLevel;

#[tokio::test(flavor = "current_thread")]
async fn missing_manifest_fails_with_connection_info() {
    let ws = Workspace::with_manifest(None);
    let factory = FakeFactory::new(FakeChain::default());

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 1);

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "unknown");
    assert_eq!(json["rpcInfo"]["endpoint"], "https://rpc-a.example");
    assert_eq!(json["rpcInfo"]["fallbacksAttempted"], 0);
    assert!(json["error"]
        .as_str()
        .is_some_and(|e| e.contains("could not be read")));
}

#[tokio::test(flavor = "current_thread")]
async fn manifest_missing_required_contract_is_rejected() {
    let mut doc: serde_json::Value = serde_json::from_str(MANIFEST).expect("json");
    doc.as_object_mut().expect("object").remove("Augur");
    let ws = Workspace::with_manifest(Some(&doc.to_string()));
    let factory = FakeFactory::new(FakeChain::default());

    let failure = calculate(&ws.config, &factory, &stamp(&ws.config))
        .await
        .expect_err("binding must fail");
    assert!(failure.error.to_string().contains("Augur"));
    assert!(failure.rpc.is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn schema_mismatch_in_any_log_aborts_the_run() {
    let ws = Workspace::new();
    let chain = FakeChain {
        logs: vec![dispute_log(1, 1_000, 10), malformed_log(20)],
        ..FakeChain::default()
    };
    let factory = FakeFactory::new(chain);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.result.risk_level, RiskLevel::Unknown);
    assert!(outcome
        .result
        .error
        .as_deref()
        .is_some_and(|e| e.contains("event decode failed")));
    assert!(outcome.result.metrics.dispute_details.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn unwritable_output_turns_success_into_failure() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.output_path()).expect("squat on output path");
    let factory = FakeFactory::new(FakeChain::default());

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.result.risk_level, RiskLevel::Unknown);
    assert!(outcome
        .result
        .error
        .as_deref()
        .is_some_and(|e| e.contains("artifact write failed")));
    assert!(ws.output_path().is_dir());
}

#[tokio::test(flavor = "current_thread")]
async fn non_numeric_chain_id_still_writes_failure_artifact() {
    let ws = Workspace::with_env(&[("CHAIN_ID", "mainnet")]);
    assert_eq!(ws.config.chain.chain_id, 1);
    let factory = FakeFactory::new(FakeChain::default()).with_dead(&[RPC_A, RPC_B, RPC_C]);

    let outcome = execute_at(&ws.config, &factory, &stamp(&ws.config)).await;
    assert_eq!(outcome.exit_code, 1);

    let json = ws.read_artifact();
    assert_eq!(json["riskLevel"], "unknown");
    assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
}
