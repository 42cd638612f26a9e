//! pfsense-watch main entry point
//!
//! One-shot poll of a pfSense firewall's status pages, printed as JSON.

use anyhow::Context;
use clap::Parser;
use pfsense_watch::api::supported_endpoints;
use pfsense_watch::config::load_config;
use pfsense_watch::{PfSenseClient, SystemStats};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// pfsense-watch: read-only monitoring for pfSense
///
/// Logs into the web interface, scrapes the requested status pages and
/// prints one JSON object keyed by endpoint. Without endpoint arguments the
/// health endpoints (general, software_system, thermal, disks) are polled.
#[derive(Parser, Debug)]
#[command(name = "pfsense-watch")]
#[command(version)]
#[command(about = "Read-only monitoring client for pfSense", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "list")]
    config: Option<PathBuf>,

    /// Endpoints to fetch (see --list)
    #[arg(value_name = "ENDPOINT", conflicts_with = "all")]
    endpoints: Vec<String>,

    /// Fetch every supported endpoint
    #[arg(long)]
    all: bool,

    /// Print the supported endpoint ids and exit
    #[arg(long)]
    list: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list {
        for id in supported_endpoints() {
            println!("{}", id);
        }
        return Ok(());
    }

    // Logs go to stderr so stdout stays valid JSON
    setup_logging(cli.verbose, cli.quiet);

    let config_path = cli
        .config
        .context("a configuration file is required")?;
    tracing::info!("Loading configuration from: {}", config_path.display());
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let client = PfSenseClient::new(&config).context("failed to set up the HTTP client")?;
    tracing::info!("Polling {}", client.session().base_url());

    let stats = if cli.all {
        client.all_system_stats().await
    } else if cli.endpoints.is_empty() {
        client.system_stats().await
    } else {
        let mut stats = SystemStats::new();
        for id in &cli.endpoints {
            stats.insert(id.clone(), client.call_api(id).await);
        }
        stats
    };

    if let Err(e) = client.logout().await {
        tracing::warn!("Logout failed: {}", e);
    }

    let output = render(&stats);
    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", text);

    let failures = stats.values().filter(|r| r.is_err()).count();
    if failures > 0 {
        tracing::warn!("{} of {} endpoint(s) failed", failures, stats.len());
    }

    Ok(())
}

/// Maps each outcome to `{"ok": record}` or `{"error": message}`
fn render(stats: &SystemStats) -> Value {
    let mut output = Map::new();
    for (id, outcome) in stats {
        let entry = match outcome {
            Ok(record) => match serde_json::to_value(record) {
                Ok(value) => json!({ "ok": value["data"] }),
                Err(e) => json!({ "error": e.to_string() }),
            },
            Err(e) => json!({ "error": e.to_string() }),
        };
        output.insert(id.clone(), entry);
    }
    Value::Object(output)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pfsense_watch=info,warn"),
            1 => EnvFilter::new("pfsense_watch=debug,info"),
            2 => EnvFilter::new("pfsense_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
