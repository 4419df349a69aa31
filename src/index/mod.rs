//! Streaming SQL dump indexer.
//!
//! Reads the dump line by line (never the whole file), joins non-empty lines
//! into statements at trailing-`;` boundaries, and buckets CREATE/INSERT
//! statements by table name.

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::info;

static CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)CREATE TABLE [`'"]?(\w+)[`'"]?"#).unwrap());
static INSERT_INTO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)INSERT INTO [`'"]?(\w+)[`'"]?"#).unwrap());

/// One table's share of the dump: at most one CREATE statement and every
/// INSERT statement seen for it, in file order.
#[derive(Debug, Default)]
pub struct TableEntry {
    pub create: Option<String>,
    pub inserts: Vec<String>,
}

/// In-memory index of a dump, keyed by table name exactly as written in the
/// statement. Built once by [`build_index`]; read-only afterwards.
#[derive(Debug, Default)]
pub struct DumpIndex {
    entries: HashMap<String, TableEntry>,
    order: Vec<String>,
}

impl DumpIndex {
    pub fn get(&self, table: &str) -> Option<&TableEntry> {
        self.entries.get(table)
    }

    /// Table names in first-discovery order.
    pub fn table_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, table: &str) -> &mut TableEntry {
        if !self.entries.contains_key(table) {
            self.order.push(table.to_string());
        }
        self.entries.entry(table.to_string()).or_default()
    }

    fn classify(&mut self, statement: String) {
        if let Some(caps) = CREATE_TABLE.captures(&statement) {
            let table = caps[1].to_string();
            self.entry_mut(&table).create = Some(statement);
        } else if let Some(caps) = INSERT_INTO.captures(&statement) {
            let table = caps[1].to_string();
            self.entry_mut(&table).inserts.push(statement);
        }
        // Everything else (comments, DROP/ALTER, transaction control) is not
        // indexed.
    }
}

/// Stream `source` and build the table index.
///
/// Statement boundaries are purely textual: a statement ends at the first
/// line whose stripped text ends with `;`. A semicolon at line end inside a
/// string literal therefore terminates the statement early; dumps seen in
/// practice rely on this heuristic holding, so it is kept as-is.
///
/// Undecodable bytes are substituted, never fatal.
pub fn build_index(source: &Path, encoding: &'static Encoding) -> Result<DumpIndex> {
    let start = Instant::now();
    let file =
        File::open(source).with_context(|| format!("opening dump file {}", source.display()))?;
    let mut reader = BufReader::new(file);

    let mut index = DumpIndex::default();
    let mut statement_buffer: Vec<String> = Vec::new();
    let mut raw_line: Vec<u8> = Vec::new();

    loop {
        raw_line.clear();
        let n = reader
            .read_until(b'\n', &mut raw_line)
            .with_context(|| format!("reading {}", source.display()))?;
        if n == 0 {
            break;
        }
        let (decoded, _, _) = encoding.decode(&raw_line);
        let line = decoded.trim();
        if line.is_empty() {
            continue;
        }
        statement_buffer.push(line.to_string());
        if line.ends_with(';') {
            index.classify(statement_buffer.join("\n"));
            statement_buffer.clear();
        }
    }

    info!(
        tables = index.len(),
        elapsed = ?start.elapsed(),
        "index complete"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use encoding_rs::UTF_8;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_DUMP: &str = "\
-- dump header comment;
DROP TABLE IF EXISTS `users`;
CREATE TABLE `users` (
  `id` int(11) NOT NULL,
  `email` varchar(120)
);

INSERT INTO `users` VALUES (1, 'a@b.com');
INSERT INTO `users` VALUES
(2, 'c@d.com'),
(3, 'e@f.com');
INSERT INTO `logs` VALUES (1, 'boot');
SET FOREIGN_KEY_CHECKS=1;
";

    fn write_dump(contents: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn indexes_tables_in_first_discovery_order() -> Result<()> {
        let dump = write_dump(SAMPLE_DUMP)?;
        let index = build_index(dump.path(), UTF_8)?;

        assert_eq!(index.table_names(), ["users", "logs"]);

        let users = index.get("users").expect("users entry");
        assert!(users.create.as_deref().unwrap().starts_with("CREATE TABLE `users`"));
        assert_eq!(users.inserts.len(), 2);
        // Multi-line statements are joined on newlines.
        assert!(users.inserts[1].contains("(2, 'c@d.com'),\n(3, 'e@f.com');"));

        let logs = index.get("logs").expect("logs entry");
        assert!(logs.create.is_none());
        assert_eq!(logs.inserts.len(), 1);
        Ok(())
    }

    #[test]
    fn non_create_non_insert_statements_are_discarded() -> Result<()> {
        let dump = write_dump("DROP TABLE x;\nSET NAMES utf8;\n-- comment;\n")?;
        let index = build_index(dump.path(), UTF_8)?;
        assert!(index.is_empty());
        Ok(())
    }

    #[test]
    fn later_create_statement_overwrites_earlier() -> Result<()> {
        let dump = write_dump(
            "CREATE TABLE t (a INT);\nCREATE TABLE t (b INT);\nINSERT INTO t VALUES (1);\n",
        )?;
        let index = build_index(dump.path(), UTF_8)?;
        let entry = index.get("t").expect("t entry");
        assert!(entry.create.as_deref().unwrap().contains("(b INT)"));
        assert_eq!(entry.inserts.len(), 1);
        Ok(())
    }

    #[test]
    fn undecodable_bytes_are_substituted_not_fatal() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"INSERT INTO t VALUES (1, '\xff\xfe');\n")?;
        let index = build_index(file.path(), UTF_8)?;
        assert_eq!(index.get("t").expect("t entry").inserts.len(), 1);
        Ok(())
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(build_index(Path::new("no/such/dump.sql"), UTF_8).is_err());
    }
}
