use anyhow::Result;
use clap::Parser;
use sqlsift::repair::{RepairRun, DEFAULT_SAMPLE_ROWS};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Repair wrong-length rows and append them to their CSV"
)]
struct Args {
    /// Path to the `_wrong_length.txt` file to process
    wrong_length_file: PathBuf,
    /// Number of CSV data rows to sample when inferring the schema
    #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
    sample_rows: usize,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let run = RepairRun::new(&args.wrong_length_file)?;
    let stats = run.run(args.sample_rows)?;
    info!(
        recovered = stats.recovered,
        failed = stats.failed,
        "recovery complete"
    );
    Ok(())
}
