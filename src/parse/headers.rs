//! Header extraction from `CREATE TABLE` statements and inline `INSERT`
//! column lists.

use once_cell::sync::Lazy;
use regex::Regex;

static OUTER_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\((.*)\)").unwrap());
static NESTED_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static LEADING_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[`'"]?(\w+)"#).unwrap());
static INLINE_HEADERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)INSERT INTO[^(]*\(\s*(.*?)\s*\)\s*VALUES").unwrap());
static VALUES_FRAGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)VALUES\s*(.*)").unwrap());

/// Definition lines starting with one of these are constraints, not columns.
const CONSTRAINT_PREFIXES: [&str; 5] = ["primary", "unique", "key", "constraint", ")"];

/// Column names from a `CREATE TABLE` statement, in definition order.
///
/// Takes the outermost parenthesized block, strips nested parenthesized
/// fragments (type precision, inline constraint column lists), then walks the
/// remaining definition segments, skipping constraint lines and unwrapping
/// the leading identifier from backtick/quote/double-quote.
pub fn headers_from_create(create_stmt: &str) -> Vec<String> {
    let block = match OUTER_PARENS.captures(create_stmt) {
        Some(caps) => caps.get(1).unwrap().as_str(),
        None => return Vec::new(),
    };
    let stripped = NESTED_PARENS.replace_all(block, "");

    let mut headers = Vec::new();
    for segment in stripped.split(['\n', ',']) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let lower = segment.to_lowercase();
        if CONSTRAINT_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            continue;
        }
        if let Some(caps) = LEADING_IDENT.captures(segment) {
            headers.push(caps[1].to_string());
        }
    }
    headers
}

/// The inline column list of an `INSERT INTO t (col1, col2, ...) VALUES`
/// statement, if present. Overrides the CREATE-derived header list for that
/// statement only.
pub fn inline_headers(insert_stmt: &str) -> Option<Vec<String>> {
    let caps = INLINE_HEADERS.captures(insert_stmt)?;
    let cleaned = caps.get(1).unwrap().as_str().replace(['`', '"', '\''], "");
    let headers: Vec<String> = cleaned
        .split(',')
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect();
    if headers.is_empty() {
        None
    } else {
        Some(headers)
    }
}

/// Everything following the `VALUES` keyword of a statement.
pub fn values_fragment(stmt: &str) -> Option<&str> {
    VALUES_FRAGMENT
        .captures(stmt)
        .map(|caps| caps.get(1).unwrap().as_str())
}

/// Placeholder headers `column_1..column_N` for tables with no CREATE
/// statement and no inline column list.
pub fn synthesized_headers(width: usize) -> Vec<String> {
    (1..=width).map(|i| format!("column_{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_excludes_constraints_and_nested_parens() {
        let stmt = "CREATE TABLE t (id INT, name VARCHAR(255) NOT NULL, PRIMARY KEY (id));";
        assert_eq!(headers_from_create(stmt), vec!["id", "name"]);
    }

    #[test]
    fn create_multiline_with_backticks() {
        let stmt = "CREATE TABLE `users` (\n\
                    `id` int(11) NOT NULL,\n\
                    `email` varchar(120) DEFAULT NULL,\n\
                    `score` decimal(10,2),\n\
                    UNIQUE KEY `uq_email` (`email`),\n\
                    CONSTRAINT fk FOREIGN KEY (`id`) REFERENCES other (`id`)\n\
                    ) ENGINE=InnoDB;";
        assert_eq!(headers_from_create(stmt), vec!["id", "email", "score"]);
    }

    #[test]
    fn create_without_paren_block_yields_nothing() {
        assert_eq!(headers_from_create("CREATE TABLE broken;"), Vec::<String>::new());
    }

    #[test]
    fn inline_column_list_detected_and_cleaned() {
        let stmt = "INSERT INTO users (`id`, `email`) VALUES (1, 'a@b.com');";
        assert_eq!(inline_headers(stmt), Some(vec!["id".to_string(), "email".to_string()]));
    }

    #[test]
    fn insert_without_inline_list_has_no_headers() {
        assert_eq!(inline_headers("INSERT INTO users VALUES (1, 'a@b.com');"), None);
    }

    #[test]
    fn values_fragment_spans_rest_of_statement() {
        let stmt = "INSERT INTO t VALUES (1, 'a'),\n(2, 'b');";
        assert_eq!(values_fragment(stmt), Some("(1, 'a'),\n(2, 'b');"));
    }

    #[test]
    fn synthesized_headers_are_one_based() {
        assert_eq!(synthesized_headers(3), vec!["column_1", "column_2", "column_3"]);
    }
}
