//! # Foodtrace Node
//!
//! Reads one JSON request per line from stdin and writes one JSON response
//! per line to stdout. Logs go to stderr.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `FT_*` environment overrides)
//! 2. Validate it
//! 3. Initialize logging (`RUST_LOG` wins over `FT_LOG_FILTER`)
//! 4. Build the ledger, contract and event bus
//! 5. Start event tasks
//! 6. Serve requests until stdin closes or Ctrl+C

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &NodeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    init_logging(&config);

    info!("===========================================");
    info!("  Foodtrace Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    config.log_summary();

    let runtime = NodeRuntime::new(&config);
    runtime.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = runtime.handle_line(&line).await;
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                stdout.write_all(&out).await?;
                stdout.flush().await?;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl+C");
                }
                break;
            }
        }
    }

    runtime.shutdown().await;
    Ok(())
}
