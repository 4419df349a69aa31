//! Per-table CSV export.
//!
//! For each selected table this realizes every indexed INSERT statement into
//! rows, partitions them by header width, deduplicates the well-formed rows,
//! and writes the CSV plus the auxiliary wrong-length and error files under
//! `SqlConversions/<dump-stem>/`.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::index::DumpIndex;
use crate::parse::{
    format_row_tuple, headers_from_create, inline_headers, split_value_rows, synthesized_headers,
    values_fragment,
};
use crate::report::Reporter;

/// Header keywords marking a table as carrying account-identifying data.
/// Matching tables are routed into the `Good Ones/` triage subdirectory.
const SENSITIVE_KEYWORDS: [&str; 7] = [
    "email",
    "username",
    "alias",
    "ipaddress",
    "ip_address",
    "address",
    "ip",
];

/// Exports tables out of a built [`DumpIndex`].
///
/// Each invocation of [`export_table`](Self::export_table) reads only its own
/// index entry and writes only its own output files, so distinct tables may
/// be exported in parallel. Exporting the same table twice concurrently is
/// not supported.
pub struct TableExporter<'a> {
    index: &'a DumpIndex,
    dump_stem: String,
    out_root: PathBuf,
    reporter: &'a dyn Reporter,
}

impl<'a> TableExporter<'a> {
    /// `out_base` defaults to the dump's own directory; output lands in
    /// `<out_base>/SqlConversions/<dump-stem>/`.
    pub fn new(
        index: &'a DumpIndex,
        dump_path: &Path,
        out_base: Option<&Path>,
        reporter: &'a dyn Reporter,
    ) -> Self {
        let dump_stem = dump_path
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .unwrap_or_else(|| "dump".to_string());
        let base = out_base
            .map(Path::to_path_buf)
            .or_else(|| dump_path.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let out_root = base.join("SqlConversions").join(&dump_stem);
        Self {
            index,
            dump_stem,
            out_root,
            reporter,
        }
    }

    /// Export one table. Returns the conversions directory, or `None` when
    /// the table is not in the index.
    ///
    /// A single bad statement never aborts the table: parse failures are
    /// logged to the shared error file and processing continues.
    pub fn export_table(&self, table: &str) -> Result<Option<PathBuf>> {
        let Some(entry) = self.index.get(table) else {
            return Ok(None);
        };
        self.reporter.table_started(table, entry.inserts.len());

        let mut headers: Vec<String> = entry
            .create
            .as_deref()
            .map(headers_from_create)
            .unwrap_or_default();
        let mut kept: Vec<Vec<String>> = Vec::new();
        let mut malformed: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for stmt in &entry.inserts {
            if let Err(err) =
                self.realize_statement(table, stmt, &mut headers, &mut kept, &mut malformed)
            {
                errors.push(format!("{err} in statement: {}...", snippet(stmt)));
            }
        }

        // Dedup by exact field-sequence equality; surviving order is
        // unspecified.
        let unique: HashSet<Vec<String>> = kept.into_iter().collect();
        debug!(table, rows = unique.len(), malformed = malformed.len(), "statements realized");

        let routed_dir = self.route_dir(&headers)?;

        if unique.is_empty() {
            self.reporter.warning(&format!("found no values in `{table}`"));
        } else {
            let csv_path = routed_dir.join(format!("{} - {}.csv", self.dump_stem, table));
            self.write_csv(&csv_path, table, &headers, &unique)?;
        }

        if !malformed.is_empty() {
            let path = routed_dir.join(format!("{} - {}_wrong_length.txt", self.dump_stem, table));
            fs::write(&path, malformed.join("\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            self.reporter.warning(&format!(
                "{} rows for `{table}` had incorrect column counts, see {}",
                malformed.len(),
                path.display()
            ));
        }

        if !errors.is_empty() {
            self.append_errors(&errors)?;
        }

        self.reporter.table_finished(table, unique.len(), malformed.len());
        Ok(Some(self.out_root.clone()))
    }

    fn realize_statement(
        &self,
        table: &str,
        stmt: &str,
        headers: &mut Vec<String>,
        kept: &mut Vec<Vec<String>>,
        malformed: &mut Vec<String>,
    ) -> Result<()> {
        let inline = inline_headers(stmt);
        let Some(fragment) = values_fragment(stmt) else {
            return Ok(());
        };
        let rows = split_value_rows(fragment);
        if rows.is_empty() {
            bail!("no value rows recovered from VALUES fragment");
        }

        if headers.is_empty() {
            match &inline {
                // No CREATE statement: the first inline column list becomes
                // the table's export header.
                Some(list) => *headers = list.clone(),
                // No header source at all: synthesize placeholders from the
                // first parsed row and keep them for the rest of the table.
                None => {
                    *headers = synthesized_headers(rows[0].len());
                    self.reporter.warning(&format!(
                        "no headers found for `{table}`, generated {} placeholder columns",
                        headers.len()
                    ));
                }
            }
        }
        let active: &[String] = inline.as_deref().unwrap_or(headers);

        for row in rows {
            if row.len() == active.len() {
                kept.push(row);
            } else {
                malformed.push(format_row_tuple(&row));
            }
        }
        Ok(())
    }

    /// Creates the output directory, diverting to `Good Ones/` when any
    /// header carries a sensitive-data keyword.
    fn route_dir(&self, headers: &[String]) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_root)
            .with_context(|| format!("creating {}", self.out_root.display()))?;
        let sensitive = headers.iter().any(|h| {
            let h = h.to_lowercase();
            SENSITIVE_KEYWORDS.iter().any(|k| h.contains(k))
        });
        if !sensitive {
            return Ok(self.out_root.clone());
        }
        let dir = self.out_root.join("Good Ones");
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(dir)
    }

    fn write_csv(
        &self,
        path: &Path,
        table: &str,
        headers: &[String],
        rows: &HashSet<Vec<String>>,
    ) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;

        let mut header_row: Vec<String> = headers.to_vec();
        if !headers.iter().any(|h| h == "table") {
            header_row.push("table".to_string());
        }
        writer.write_record(&header_row)?;

        for row in rows {
            // Rows kept under an inline header list of a different width
            // than the written header are not emitted.
            if row.len() != headers.len() {
                continue;
            }
            let mut record = row.clone();
            record.push(table.to_string());
            writer.write_record(&record)?;
        }
        writer
            .flush()
            .with_context(|| format!("flushing {}", path.display()))?;
        Ok(())
    }

    /// Appends to the dump-wide error log; multiple tables contribute to the
    /// same file, so it is never truncated.
    fn append_errors(&self, errors: &[String]) -> Result<()> {
        let path = self.out_root.join(format!("{}_ErroredLines.txt", self.dump_stem));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut buf = errors.join("\n");
        buf.push('\n');
        file.write_all(buf.as_bytes())
            .with_context(|| format!("appending to {}", path.display()))?;
        Ok(())
    }
}

fn snippet(stmt: &str) -> String {
    stmt.chars().take(100).collect()
}
