use fork_risk::engine;
use fork_risk::runtime::{emit_config_status, parse_runtime_args};
use fork_risk::utils::config::Config;
use fork_risk::utils::rpc::HttpClientFactory;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let runtime_args = parse_runtime_args()?;

    // Load .env before any key is read.
    fork_risk::utils::env_guard::harden_env_setup();

    match std::env::var("RUST_LOG") {
        Ok(val) => println!("[STARTUP] RUST_LOG is set to: '{}'", val),
        Err(_) => println!("[STARTUP] RUST_LOG is unset."),
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        println!("[STARTUP] RUST_LOG invalid or unset; defaulting to 'info'");
        tracing_subscriber::EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    println!("[STARTUP] Tracing initialized.");

    let mut config = Config::load()?;
    runtime_args.apply(&mut config);
    emit_config_status(&config);
    if runtime_args.explain_config {
        tracing::info!("[OPS] --explain-config requested; configuration resolved, exiting.");
        return Ok(());
    }

    let factory = HttpClientFactory {
        timeout_ms: config.rpc_call_timeout_ms,
    };
    let outcome = engine::execute(&config, &factory).await;
    tracing::info!(
        "[RUN] Finished: riskLevel={} riskPercentage={:.4} endpoint={} exit={}",
        outcome.result.risk_level.as_str(),
        outcome.result.risk_percentage,
        outcome.result.rpc_info.endpoint,
        outcome.exit_code
    );
    if outcome.exit_code != 0 {
        std::process::exit(outcome.exit_code);
    }
    Ok(())
}
