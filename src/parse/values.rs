//! Tokenizer for SQL `VALUES` lists.
//!
//! The input is the text immediately following a `VALUES` keyword, e.g.
//! `(1, 'a'), (2, 'b');`. A single left-to-right scan tracks quoted-literal
//! state and parenthesis depth; each top-level parenthesized group becomes
//! one row of string fields.

/// Scanner state for the group-level pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Bare,
    Quoted,
}

/// Split a `VALUES (...), (...), ...` fragment into rows, one per top-level
/// parenthesized group.
///
/// A `'` toggles quoted-literal state unless the immediately preceding
/// buffered character is a backslash. Parentheses are structural only while
/// not inside a literal: depth 0 to 1 starts a fresh group buffer, depth 1
/// back to 0 closes the group and splits it into fields. Characters at depth
/// 0 (separators, whitespace, a trailing `;`) are discarded, as is any
/// unbalanced trailing buffer left at end of input.
pub fn split_value_rows(fragment: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut state = Scan::Bare;
    let mut depth: i32 = 0;
    let mut buf = String::new();

    for ch in fragment.chars() {
        if ch == '\'' && !buf.ends_with('\\') {
            state = match state {
                Scan::Bare => Scan::Quoted,
                Scan::Quoted => Scan::Bare,
            };
        }
        if state == Scan::Bare {
            if ch == '(' {
                depth += 1;
                if depth == 1 {
                    buf.clear();
                    continue;
                }
            } else if ch == ')' {
                depth -= 1;
                if depth == 0 {
                    rows.push(split_group(buf.trim()));
                    buf.clear();
                    continue;
                }
            }
        }
        if depth > 0 {
            buf.push(ch);
        }
    }
    rows
}

/// Serialize a row as a single-quoted parenthesized tuple that
/// [`split_value_rows`] accepts again. Used for the wrong-length and
/// failed-recovery files so the repair pass can re-split them with the same
/// rule that produced them.
pub fn format_row_tuple(fields: &[String]) -> String {
    let quoted: Vec<String> = fields
        .iter()
        .map(|f| format!("'{}'", f.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("({})", quoted.join(", "))
}

/// Strict splitter failed; the raw group text is still usable via the naive
/// fallback.
#[derive(Debug)]
struct SplitError;

fn split_group(group: &str) -> Vec<String> {
    split_fields_strict(group).unwrap_or_else(|_| split_fields_naive(group))
}

/// Comma-aware, quote-aware field splitter with backslash as the escape
/// character: the escape is removed, the following character kept verbatim.
/// Fields are trimmed and one pair of matching outer single quotes stripped.
/// Fails on an unterminated literal or a dangling escape at end of group.
fn split_fields_strict(group: &str) -> Result<Vec<String>, SplitError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = group.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped) => field.push(escaped),
                None => return Err(SplitError),
            },
            '\'' => {
                quoted = !quoted;
                field.push('\'');
            }
            ',' if !quoted => {
                fields.push(clean_field(&field));
                field.clear();
            }
            _ => field.push(ch),
        }
    }
    if quoted {
        return Err(SplitError);
    }
    fields.push(clean_field(&field));
    Ok(fields)
}

/// Fallback so no data is silently dropped: a plain comma split of the raw
/// group text, quotes and spacing left as-is.
fn split_fields_naive(group: &str) -> Vec<String> {
    group.split(',').map(str::to_string).collect()
}

fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}
