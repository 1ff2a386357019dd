// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::Parser;
use rethrow_cli::{Scenario, run_scenario};
use rethrow_config::{ReportFormat, discover_config, load_config, validate_config};
use rethrow_harness::parse_iterations;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "rethrow-bench",
    version,
    about = "Compare declarative rethrow chains with manual type switches"
)]
struct Cli {
    /// Iterations per scenario; anything but a positive integer means 200000.
    #[arg(allow_hyphen_values = true)]
    iterations: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let iterations = parse_iterations(cli.iterations.as_deref());

    let cwd = std::env::current_dir().context("resolve working directory")?;
    let config_path = discover_config(&cwd);
    let config = load_config(config_path.as_deref()).context("load config")?;
    let warnings = validate_config(&config).context("validate config")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("rethrow={}", config.log_level())))
        .with_writer(std::io::stderr)
        .init();

    for w in &warnings {
        warn!(target: "rethrow.cli", "{w}");
    }
    if let Some(path) = &config_path {
        info!(target: "rethrow.cli", path = %path.display(), "loaded config");
    }

    let scenarios = config
        .scenarios()
        .iter()
        .map(|name| name.parse::<Scenario>())
        .collect::<Result<Vec<_>>>()?;

    for scenario in scenarios {
        let report = run_scenario(scenario, iterations).await;
        match config.format() {
            ReportFormat::Text => println!("{}", report.render_text()),
            ReportFormat::Json => println!(
                "{}",
                report.render_json().context("serialize report")?
            ),
        }
    }
    Ok(())
}
