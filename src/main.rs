/*!
 * ABAC - Scenario Runner
 *
 * Usage: abac <scenario.json>
 *
 * Loads subjects, conditions, effects and policies from a scenario file,
 * evaluates its requests and prints one JSON report per line.
 */

use abac_kernel::{init_tracing, EngineConfig, Scenario};
use anyhow::Context;
use std::io::Write;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("invalid engine configuration")?;
    init_tracing(config.trace_json);

    let path = std::env::args()
        .nth(1)
        .context("usage: abac <scenario.json>")?;

    info!(path = %path, "Loading scenario");
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let scenario = Scenario::from_json(&text).with_context(|| format!("failed to parse {path}"))?;

    let reports = scenario.run(&config).context("failed to install scenario")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for report in &reports {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
    }

    info!(requests = reports.len(), "Scenario complete");
    Ok(())
}
