//! Kalshi trade history binary - downloads all trades of a market ticker
//! into a JSON file, for comparison with the canonical trades.

use std::{fs::File, io::BufWriter, path::PathBuf, process::exit, time::Duration};

use clap::Parser;
use ctf_fills::source::kalshi::{self, KalshiClient, TradeQuery};
use tracing::{error, info};
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Environment configuration.
#[derive(Debug, serde::Deserialize)]
struct EnvConfig {
    /// Trades listing endpoint
    kalshi_url: Option<String>,

    /// Request timeout (default: 60s)
    timeout_seconds: Option<u64>,
}

impl EnvConfig {
    fn kalshi_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.kalshi_url.as_deref().unwrap_or(kalshi::DEFAULT_TRADES_URL))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

#[derive(Parser, Debug)]
#[command(name = "kalshi_trades")]
#[command(about = "Download the trade history of a Kalshi market")]
struct Args {
    /// Market ticker
    #[arg(long)]
    ticker: String,

    /// Earliest trade time, unix seconds
    #[arg(long)]
    min_ts: Option<i64>,

    /// Latest trade time, unix seconds
    #[arg(long)]
    max_ts: Option<i64>,

    /// Trades per page
    #[arg(long, default_value_t = kalshi::MAX_PAGE_SIZE)]
    limit: u32,

    /// Output JSON file
    #[arg(long = "out", value_name = "PATH")]
    output: PathBuf,
}

impl Args {
    fn query(&self) -> TradeQuery {
        TradeQuery {
            ticker: self.ticker.clone(),
            min_ts: self.min_ts,
            max_ts: self.max_ts,
            limit: self.limit,
        }
    }
}

async fn run(args: &Args, env: &EnvConfig) -> Result<usize, Box<dyn std::error::Error>> {
    if let (Some(min_ts), Some(max_ts)) = (args.min_ts, args.max_ts) {
        if min_ts > max_ts {
            return Err(format!("--min-ts {min_ts} is after --max-ts {max_ts}").into());
        }
    }

    let client = KalshiClient::new(env.kalshi_url()?, env.timeout())?;
    let trades = client.trades(&args.query()).await?;

    kalshi::write_trades_json(BufWriter::new(File::create(&args.output)?), &trades)?;
    Ok(trades.len())
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
        Ok(total) => info!(total, ticker = %args.ticker, path = %args.output.display(), "wrote trades"),
        Err(e) => {
            error!(%e, "Trade download failed");
            exit(1);
        }
    }
}
