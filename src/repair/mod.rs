//! Recovery pass for wrong-length rows.
//!
//! Reads a `_wrong_length.txt` file produced by the exporter, infers the
//! companion CSV's column types from its own data, realigns each malformed
//! row, appends what fits back onto the CSV, and banks the rest in a
//! failed-recovery file.

pub mod align;
pub mod schema;

pub use align::repair_row;
pub use schema::{infer_schema, ColumnSchema, ColumnType, DEFAULT_SAMPLE_ROWS};

use anyhow::{anyhow, bail, Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::parse::{format_row_tuple, split_value_rows, values_fragment};

/// Outcome counts of one recovery run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoveryStats {
    pub recovered: usize,
    pub failed: usize,
}

/// One recovery pass over a wrong-length file and its companion CSV.
///
/// The repair appends to the CSV in a single open/append/close, so it must
/// not run concurrently with an export of the same table.
pub struct RepairRun {
    wrong_length_path: PathBuf,
    csv_path: PathBuf,
    failed_recovery_path: PathBuf,
    table: String,
}

impl RepairRun {
    /// Both the wrong-length file and its companion CSV (same name with the
    /// `_wrong_length.txt` suffix replaced by `.csv`) must already exist.
    pub fn new(wrong_length_path: &Path) -> Result<Self> {
        if !wrong_length_path.is_file() {
            bail!("input file not found: {}", wrong_length_path.display());
        }
        let file_name = wrong_length_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("unusable file name: {}", wrong_length_path.display()))?;
        let base = file_name.strip_suffix("_wrong_length.txt").ok_or_else(|| {
            anyhow!("expected a `_wrong_length.txt` file, got {file_name}")
        })?;

        let dir = wrong_length_path.parent().unwrap_or_else(|| Path::new("."));
        let csv_path = dir.join(format!("{base}.csv"));
        if !csv_path.is_file() {
            bail!("corresponding CSV not found: {}", csv_path.display());
        }
        let failed_recovery_path = dir.join(format!("{base}_failed_recovery.txt"));

        // Exported CSVs are named `<dump-stem> - <table>.csv`; fall back to
        // the whole stem when the separator is absent.
        let table = base.split(" - ").nth(1).unwrap_or(base).to_string();

        Ok(Self {
            wrong_length_path: wrong_length_path.to_path_buf(),
            csv_path,
            failed_recovery_path,
            table,
        })
    }

    /// Attempt to repair every row in the wrong-length file. Recovered rows
    /// are appended to the CSV with the table name suffixed; irrecoverable
    /// rows land in the failed-recovery file, never silently dropped.
    pub fn run(&self, sample_rows: usize) -> Result<RecoveryStats> {
        let schema = infer_schema(&self.csv_path, sample_rows)?;
        info!(
            table = %self.table,
            columns = schema.len(),
            "schema inferred, attempting repair"
        );

        let bytes = fs::read(&self.wrong_length_path)
            .with_context(|| format!("reading {}", self.wrong_length_path.display()))?;
        let text = String::from_utf8_lossy(&bytes);

        let mut recovered: Vec<Vec<String>> = Vec::new();
        let mut still_failed: Vec<String> = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fragment = values_fragment(line).unwrap_or(line);
            for raw in split_value_rows(fragment) {
                match repair_row(&raw, &schema) {
                    Some(mut row) => {
                        row.push(self.table.clone());
                        recovered.push(row);
                    }
                    None => still_failed.push(format_row_tuple(&raw)),
                }
            }
        }

        if !recovered.is_empty() {
            self.append_to_csv(&recovered)?;
            info!(
                rows = recovered.len(),
                csv = %self.csv_path.display(),
                "recovered rows appended"
            );
        }
        if !still_failed.is_empty() {
            fs::write(&self.failed_recovery_path, still_failed.join("\n"))
                .with_context(|| format!("writing {}", self.failed_recovery_path.display()))?;
            warn!(
                rows = still_failed.len(),
                file = %self.failed_recovery_path.display(),
                "rows could not be recovered"
            );
        }
        if recovered.is_empty() && still_failed.is_empty() {
            info!("no rows found to process");
        }

        Ok(RecoveryStats {
            recovered: recovered.len(),
            failed: still_failed.len(),
        })
    }

    fn append_to_csv(&self, rows: &[Vec<String>]) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("opening {} for append", self.csv_path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        for row in rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("appending to {}", self.csv_path.display()))?;
        Ok(())
    }
}
