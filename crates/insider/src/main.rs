use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use insider::agent::{Aggregation, GroupBy};
use insider::models::{Dataset, InsiderConfig, ScrapeRequest};
use insider::SnapshotGateway;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "insider", about = "Query insider-trading filings with a reusable result cache")]
struct Cli {
    /// Path to configuration file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Screener table snapshot (JSON with `header` and `rows`)
    #[arg(short, long)]
    input: String,

    /// Trade type codes to keep, e.g. `P,S`
    #[arg(long, value_delimiter = ',')]
    trade_types: Vec<String>,

    /// Insider job title codes, e.g. `CEO,CFO`
    #[arg(long, value_delimiter = ',')]
    job_titles: Vec<String>,

    /// Minimum trade size in dollars
    #[arg(long, allow_negative_numbers = true)]
    min_value: Option<i64>,

    /// Maximum trade size in dollars
    #[arg(long, allow_negative_numbers = true)]
    max_value: Option<i64>,

    /// Result cap, clamped to 100..=5000
    #[arg(long, allow_negative_numbers = true)]
    num_results: Option<i64>,

    /// JSON file holding an array of requests, run in order through one agent
    #[arg(long, conflicts_with_all = ["trade_types", "job_titles", "min_value", "max_value", "num_results"])]
    batch: Option<String>,

    /// Keep only these companies
    #[arg(long, value_delimiter = ',')]
    company: Vec<String>,

    /// Keep only these insiders
    #[arg(long, value_delimiter = ',')]
    insider: Vec<String>,

    /// Group rows by company, day, month or year
    #[arg(long)]
    group_by: Option<GroupBy>,

    /// Aggregation applied per group: total, average or count
    #[arg(long, default_value = "total")]
    aggregate: Aggregation,

    /// Keep only the N largest groups
    #[arg(long, requires = "group_by")]
    top: Option<usize>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let requests = match &cli.batch {
        Some(path) => read_batch(path)?,
        None => vec![request_from_flags(&cli)],
    };

    let gateway = Arc::new(SnapshotGateway::new(&cli.input));
    info!(input = %gateway.path().display(), requests = requests.len(), "Serving snapshot");
    let mut agent = insider::build_agent(&config, gateway);
    let results = insider::scrape_batch(&mut agent, &requests)
        .await
        .context("Scrape failed")?;
    info!(requests = requests.len(), cached = agent.cache().len(), "Done");

    let mut rendered = results
        .iter()
        .map(|dataset| render(&cli, dataset))
        .collect::<Result<Vec<_>>>()?;
    let value = if cli.batch.is_some() {
        serde_json::Value::Array(rendered)
    } else {
        rendered.pop().unwrap_or(serde_json::Value::Null)
    };

    // Output as JSON to stdout
    let output = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{output}");

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<InsiderConfig> {
    let Some(path) = path else {
        return Ok(InsiderConfig::default());
    };
    let config_str =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&config_str).with_context(|| "Failed to parse config")
}

fn read_batch(path: &str) -> Result<Vec<ScrapeRequest>> {
    let batch_json =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read batch: {path}"))?;
    let value: serde_json::Value =
        serde_json::from_str(&batch_json).context("Failed to parse batch JSON")?;
    let items = value
        .as_array()
        .context("Batch file must hold a JSON array of requests")?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            ScrapeRequest::from_json(item).with_context(|| format!("Invalid request #{i} in batch"))
        })
        .collect()
}

fn request_from_flags(cli: &Cli) -> ScrapeRequest {
    let mut request = ScrapeRequest::new();
    if !cli.trade_types.is_empty() {
        request = request.trade_types(cli.trade_types.clone());
    }
    if !cli.job_titles.is_empty() {
        request = request.job_titles(cli.job_titles.clone());
    }
    if let Some(min) = cli.min_value {
        request = request.trade_val_min(min);
    }
    if let Some(max) = cli.max_value {
        request = request.trade_val_max(max);
    }
    if let Some(n) = cli.num_results {
        request = request.num_results(n);
    }
    request
}

fn render(cli: &Cli, dataset: &Dataset) -> Result<serde_json::Value> {
    let selected = dataset
        .retain_companies(&cli.company)
        .retain_insiders(&cli.insider);
    let value = match cli.group_by {
        Some(group_by) => serde_json::to_value(insider::summarize(
            &selected,
            group_by,
            cli.aggregate,
            cli.top,
        ))?,
        None => serde_json::to_value(&selected)?,
    };
    Ok(value)
}
