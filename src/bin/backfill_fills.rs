//! Fill backfill binary - downloads all order fills of a market from the
//! orderbook subgraph into a fills CSV.

use std::{path::PathBuf, process::exit, time::Duration};

use clap::Parser;
use ctf_fills::{
    csv_io,
    source::{
        clob::ClobClient,
        subgraph::{self, BackfillConfig, SubgraphClient},
    },
    types::{AssetId, Market},
};
use tracing::{error, info};
use url::Url;

const DEFAULT_CLOB_URL: &str = "https://clob.polymarket.com/";
const DEFAULT_SUBGRAPH_URL: &str = "https://api.goldsky.com/api/public/project_cl6mb8i9h0003e201j6li0diw/subgraphs/orderbook-subgraph/0.0.1/gn";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Environment configuration (API endpoints).
#[derive(Debug, serde::Deserialize)]
struct EnvConfig {
    /// CLOB API base URL
    clob_url: Option<String>,

    /// Orderbook subgraph GraphQL endpoint
    subgraph_url: Option<String>,

    /// Request timeout (default: 60s)
    timeout_seconds: Option<u64>,

    /// Subgraph page size (default: 1000)
    page_size: Option<usize>,
}

impl EnvConfig {
    fn clob_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.clob_url.as_deref().unwrap_or(DEFAULT_CLOB_URL))
    }

    fn subgraph_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.subgraph_url.as_deref().unwrap_or(DEFAULT_SUBGRAPH_URL))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig {
            page_size: self.page_size.unwrap_or(subgraph::DEFAULT_PAGE_SIZE),
            ..Default::default()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "backfill_fills")]
#[command(about = "Download all order fills of a market from the orderbook subgraph")]
struct Args {
    /// Condition ID of the market, looked up via the CLOB API
    #[arg(long, required_unless_present = "yes_token")]
    condition: Option<String>,

    /// Explicit `Yes` token ID, skips the CLOB lookup
    #[arg(long, requires = "no_token", conflicts_with = "condition")]
    yes_token: Option<String>,

    /// Explicit `No` token ID
    #[arg(long, requires = "yes_token")]
    no_token: Option<String>,

    /// Output fills CSV
    #[arg(long = "out", value_name = "PATH")]
    output: PathBuf,
}

async fn run(args: &Args, env: &EnvConfig) -> Result<usize, Box<dyn std::error::Error>> {
    let market = match (&args.yes_token, &args.no_token, &args.condition) {
        (Some(yes), Some(no), _) => Market::new(AssetId::from(yes.as_str()), AssetId::from(no.as_str()))?,
        (_, _, Some(condition)) => {
            info!(%condition, "resolving market tokens");
            ClobClient::new(env.clob_url()?, env.timeout())?
                .market_tokens(&condition.to_lowercase())
                .await?
        }
        _ => return Err("either --condition or both token IDs are required".into()),
    };
    info!(yes = %market.yes_token(), no = %market.no_token(), "market tokens");

    let ids: Vec<String> = market.tokens().iter().map(|(_, t)| t.to_string()).collect();
    let subgraph = SubgraphClient::new(env.subgraph_url()?, env.timeout())?;
    let fills =
        subgraph::backfill_market(&subgraph, &ids, &env.backfill_config(), tokio::time::sleep).await?;

    csv_io::write_raw_fills(std::fs::File::create(&args.output)?, &fills)?;
    Ok(fills.len())
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config: EnvConfig = match envy::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let args = Args::parse();

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run(&args, &env_config).await {
        Ok(total) => info!(total, path = %args.output.display(), "wrote unique fills"),
        Err(e) => {
            error!(%e, "Backfill failed");
            exit(1);
        }
    }
}
