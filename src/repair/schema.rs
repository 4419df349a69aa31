//! Column type inference from exported CSV samples.
//!
//! For each column, look at up to `sample_rows` data rows, skip empty and
//! `null` cells, classify the rest, and take the majority vote. Ties keep
//! the type seen first; a column with no classifiable samples is `Text`.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Default number of data rows sampled per column.
pub const DEFAULT_SAMPLE_ROWS: usize = 50;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Email,
    Text,
}

/// One inferred column of an exported CSV.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub ty: ColumnType,
    pub index: usize,
}

pub fn is_integer(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

pub fn is_null(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("null")
}

fn classify(value: &str) -> Option<ColumnType> {
    if is_null(value) {
        None
    } else if is_integer(value) {
        Some(ColumnType::Integer)
    } else if is_email(value) {
        Some(ColumnType::Email)
    } else {
        Some(ColumnType::Text)
    }
}

/// Read the header row plus up to `sample_rows` data rows of `csv_path` and
/// infer one type per column.
pub fn infer_schema(csv_path: &Path, sample_rows: usize) -> Result<Vec<ColumnSchema>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("opening {}", csv_path.display()))?;
    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading header row of {}", csv_path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); header.len()];
    for (i, record) in reader.records().enumerate() {
        if i >= sample_rows {
            break;
        }
        let record = record
            .with_context(|| format!("reading sample row {} of {}", i + 1, csv_path.display()))?;
        for (j, cell) in record.iter().enumerate() {
            if j < columns.len() {
                columns[j].push(cell.to_string());
            }
        }
    }

    Ok(header
        .into_iter()
        .enumerate()
        .map(|(index, name)| ColumnSchema {
            name,
            ty: infer_column_type(&columns[index]),
            index,
        })
        .collect())
}

fn infer_column_type(samples: &[String]) -> ColumnType {
    // Vote counts in first-seen order; only a strictly higher count
    // displaces the leader, so ties keep the earlier type.
    let mut votes: Vec<(ColumnType, usize)> = Vec::new();
    for value in samples {
        let Some(ty) = classify(value) else { continue };
        match votes.iter_mut().find(|(seen, _)| *seen == ty) {
            Some((_, count)) => *count += 1,
            None => votes.push((ty, 1)),
        }
    }

    let mut best = ColumnType::Text;
    let mut best_count = 0;
    for (ty, count) in votes {
        if count > best_count {
            best = ty;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn write_csv(rows: &[&[&str]]) -> Result<(TempDir, std::path::PathBuf)> {
        let dir = TempDir::new()?;
        let path = dir.path().join("sample.csv");
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.write_record(*row)?;
        }
        writer.flush()?;
        Ok((dir, path))
    }

    #[test]
    fn infers_types_per_column() -> Result<()> {
        let (_dir, path) = write_csv(&[
            &["id", "email", "name", "table"],
            &["1", "a@b.com", "alice", "users"],
            &["2", "c@d.net", "bob", "users"],
            &["3", "e@f.org", "carol", "users"],
        ])?;
        let schema = infer_schema(&path, DEFAULT_SAMPLE_ROWS)?;
        let types: Vec<ColumnType> = schema.iter().map(|c| c.ty).collect();
        assert_eq!(
            types,
            vec![ColumnType::Integer, ColumnType::Email, ColumnType::Text, ColumnType::Text]
        );
        assert_eq!(schema[1].name, "email");
        assert_eq!(schema[1].index, 1);
        Ok(())
    }

    #[test]
    fn majority_wins_and_ties_keep_first_seen() -> Result<()> {
        let (_dir, path) = write_csv(&[
            &["mostly_int", "tied"],
            &["1", "7"],
            &["2", "x"],
            &["oops", ""],
        ])?;
        let schema = infer_schema(&path, DEFAULT_SAMPLE_ROWS)?;
        assert_eq!(schema[0].ty, ColumnType::Integer);
        // One integer vote, one text vote: the first-seen type wins.
        assert_eq!(schema[1].ty, ColumnType::Integer);
        Ok(())
    }

    #[test]
    fn unclassifiable_column_defaults_to_text() -> Result<()> {
        let (_dir, path) = write_csv(&[
            &["all_null"],
            &["NULL"],
            &["null"],
            &[""],
        ])?;
        let schema = infer_schema(&path, DEFAULT_SAMPLE_ROWS)?;
        assert_eq!(schema[0].ty, ColumnType::Text);
        Ok(())
    }

    #[test]
    fn sampling_stops_at_the_requested_row_count() -> Result<()> {
        let (_dir, path) = write_csv(&[
            &["col"],
            &["1"],
            &["2"],
            &["not a number"],
            &["also not"],
            &["still not"],
        ])?;
        // Only the first two data rows are sampled, so the column reads as
        // integer despite the text tail.
        let schema = infer_schema(&path, 2)?;
        assert_eq!(schema[0].ty, ColumnType::Integer);
        Ok(())
    }

    #[test]
    fn missing_csv_is_fatal() {
        assert!(infer_schema(Path::new("no/such/file.csv"), 50).is_err());
    }
}
