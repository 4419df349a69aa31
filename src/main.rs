use anyhow::{anyhow, bail, Result};
use clap::Parser;
use encoding_rs::Encoding;
use rayon::prelude::*;
use sqlsift::export::TableExporter;
use sqlsift::index::build_index;
use sqlsift::report::LogReporter;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert a SQL dump into per-table CSV files"
)]
struct Args {
    /// Path to the SQL dump file
    dump: PathBuf,
    /// Text encoding label for the dump; undecodable bytes are substituted
    #[arg(long, default_value = "utf-8")]
    encoding: String,
    /// Only export these tables (comma separated); default is every table
    #[arg(long, value_delimiter = ',')]
    tables: Vec<String>,
    /// List discovered tables and exit without exporting
    #[arg(long)]
    list: bool,
    /// Base directory for SqlConversions/ output (default: the dump's directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let encoding = Encoding::for_label(args.encoding.as_bytes())
        .ok_or_else(|| anyhow!("unknown encoding label `{}`", args.encoding))?;

    info!(dump = %args.dump.display(), "building index");
    let index = build_index(&args.dump, encoding)?;

    if args.list {
        for name in index.table_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let selected: Vec<String> = if args.tables.is_empty() {
        index.table_names().to_vec()
    } else {
        if let Some(missing) = args.tables.iter().find(|t| index.get(t).is_none()) {
            bail!("table `{missing}` not found in dump");
        }
        args.tables.clone()
    };

    let reporter = LogReporter;
    let exporter = TableExporter::new(&index, &args.dump, args.out_dir.as_deref(), &reporter);

    // Each export touches only its own index entry and output files, so fan
    // the selected tables out across the pool.
    let failures: usize = selected
        .par_iter()
        .map(|table| match exporter.export_table(table) {
            Ok(_) => 0,
            Err(err) => {
                error!(table = %table, "export failed: {err:#}");
                1
            }
        })
        .sum();

    if failures > 0 {
        bail!("{failures} table export(s) failed");
    }
    info!(tables = selected.len(), "all done");
    Ok(())
}
