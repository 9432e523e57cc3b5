use fork_risk::utils::config::Config;
use fork_risk::utils::rpc::{redact_endpoint, ChainReader, ClientFactory, HttpClientFactory};
use std::time::Instant;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fork_risk::utils::env_guard::harden_env_setup();

    let config = Config::load()?;
    let urls = config.candidate_urls();
    let factory = HttpClientFactory {
        timeout_ms: config.rpc_call_timeout_ms,
    };

    println!(
        "Probing {} RPC endpoint(s) on {} (timeout {}ms)...",
        urls.len(),
        config.chain.name,
        config.rpc_call_timeout_ms
    );
    println!("{:<48} | {:<10} | {:<10}", "ENDPOINT", "LATENCY", "BLOCK");
    println!("{}", "-".repeat(74));

    let mut results = vec![];
    for url in &urls {
        let endpoint = redact_endpoint(url);
        let client = match factory.open(url) {
            Ok(client) => client,
            Err(e) => {
                println!("{:<48} | {:<10} | ERROR: {}", endpoint, "FAIL", e);
                continue;
            }
        };
        let start = Instant::now();
        match client.head_block().await {
            Ok(block) => {
                let ms = start.elapsed().as_millis();
                println!("{:<48} | {:<8}ms | #{}", endpoint, ms, block);
                results.push((endpoint, ms, block));
            }
            Err(e) => println!("{:<48} | {:<10} | ERROR: {}", endpoint, "FAIL", e),
        }
    }

    results.sort_by_key(|r| r.1);
    match results.first() {
        Some((best, ms, _)) => {
            println!("\nFastest endpoint: {} ({}ms)", best, ms);
            println!("Set ETH_RPC_URL to the full URL for that host to prefer it.");
        }
        None => {
            println!("\nAll endpoints failed or timed out.");
            std::process::exit(1);
        }
    }
    Ok(())
}
