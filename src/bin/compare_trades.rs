//! Trade comparison binary - reconciles canonical trades against a
//! reference trade dataset and prints agreement statistics.

use std::{path::PathBuf, process::exit};

use clap::Parser;
use ctf_fills::{csv_io, reconcile};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "compare_trades")]
#[command(about = "Compare canonical trades against a reference trade dataset")]
struct Args {
    /// Reference trades CSV
    #[arg(long, value_name = "PATH")]
    reference: PathBuf,

    /// Canonical trades CSV to check
    #[arg(long, value_name = "PATH")]
    cleaned: PathBuf,

    /// Number of mismatching transactions to list
    #[arg(long, default_value_t = reconcile::DEFAULT_MAX_MISMATCHES)]
    max_mismatches: usize,
}

fn main() {
    let args = Args::parse();

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let load = |path: &PathBuf| match csv_io::read_trade_records_file(path) {
        Ok(records) => {
            info!(path = %path.display(), rows = records.len(), "loaded trades");
            records
        }
        Err(e) => {
            error!(%e, path = %path.display(), "Failed to load trades");
            exit(1);
        }
    };
    let reference = load(&args.reference);
    let cleaned = load(&args.cleaned);

    print!(
        "{}",
        reconcile::reconcile(&reference, &cleaned, args.max_mismatches)
    );
}
