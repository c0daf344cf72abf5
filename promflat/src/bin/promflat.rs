use std::{fs::File, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use reqwest::blocking::Response;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use promflat::NormalizedMetric;

/// Fetch a Prometheus metrics endpoint and print its samples as a flat JSON array
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    /// Metrics endpoint to fetch, e.g. http://localhost:9100/metrics
    #[clap(env = "PROMFLAT_ENDPOINT", required_unless_present = "input", conflicts_with = "input")]
    endpoint: Option<String>,

    /// Read the exposition from a file instead of fetching it
    #[clap(short, long)]
    input: Option<String>,

    /// HTTP timeout in seconds
    #[clap(short, long, env = "PROMFLAT_TIMEOUT", default_value = "10")]
    timeout: u64,

    /// Print the JSON array on a single line
    #[clap(short, long)]
    compact: bool,
}

fn fetch(endpoint: &str, timeout: Duration) -> Result<Response> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;

    let response = client.get(endpoint).send()?;
    let status = response.status();
    debug!(%status, "fetched {}", endpoint);
    if !status.is_success() {
        bail!("{} returned {}", endpoint, status);
    }

    Ok(response)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    debug!(?args);

    let metrics: Vec<NormalizedMetric> = match (&args.input, &args.endpoint) {
        (Some(path), _) => {
            let file = File::open(path).with_context(|| format!("couldn't open {}", path))?;
            promflat::parse(file)
        }
        (None, Some(endpoint)) => {
            let response = fetch(endpoint, Duration::from_secs(args.timeout))
                .context("failed to call prometheus endpoint")?;
            promflat::parse(response)
        }
        (None, None) => bail!("missing arguments"),
    }
    .context("failed to decode prometheus endpoint output")?;
    info!(count = metrics.len(), "normalized");

    let output = match args.compact {
        true => serde_json::to_string(&metrics),
        false => serde_json::to_string_pretty(&metrics),
    }
    .context("failed to serialize output")?;

    println!("{}", output);

    Ok(())
}
