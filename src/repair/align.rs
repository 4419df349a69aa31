//! Sliding-window realignment of a malformed row against an inferred schema.

use super::schema::{is_email, is_integer, is_null, ColumnSchema, ColumnType};

const EMAIL_SCORE: i64 = 10;
const INTEGER_SCORE: i64 = 5;
const TEXT_SCORE: i64 = 1;

/// Confidence that `value` belongs in a column of the expected type. Emails
/// and integers are strong anchors; any non-empty value weakly fits a text
/// column.
fn match_score(value: &str, expected: ColumnType) -> i64 {
    if is_null(value) {
        return 0;
    }
    match expected {
        ColumnType::Email if is_email(value) => EMAIL_SCORE,
        ColumnType::Integer if is_integer(value) => INTEGER_SCORE,
        ColumnType::Text => TEXT_SCORE,
        _ => 0,
    }
}

/// Try every alignment offset for `raw` against `schema` and reconstruct a
/// full-width row from the best-scoring one.
///
/// Offsets are scanned ascending and only a strictly higher score displaces
/// the leader, so the lowest offset wins ties. Returns `None` when nothing
/// scores positively — the row is unrecoverable. A returned row always has
/// exactly `schema.len()` fields, with unfilled positions set to the literal
/// string `NULL`.
pub fn repair_row(raw: &[String], schema: &[ColumnSchema]) -> Option<Vec<String>> {
    let mut best_offset = 0isize;
    let mut best_score = -1i64;

    for offset in -(raw.len() as isize)..schema.len() as isize {
        let mut score = 0i64;
        for (i, value) in raw.iter().enumerate() {
            let target = i as isize + offset;
            if target >= 0 && (target as usize) < schema.len() {
                score += match_score(value, schema[target as usize].ty);
            }
        }
        if score > best_score {
            best_score = score;
            best_offset = offset;
        }
    }

    if best_score <= 0 {
        return None;
    }

    let mut repaired = vec!["NULL".to_string(); schema.len()];
    for (i, value) in raw.iter().enumerate() {
        let target = i as isize + best_offset;
        if target >= 0 && (target as usize) < schema.len() {
            repaired[target as usize] = value.clone();
        }
    }
    Some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(types: &[ColumnType]) -> Vec<ColumnSchema> {
        types
            .iter()
            .enumerate()
            .map(|(index, &ty)| ColumnSchema {
                name: format!("col_{index}"),
                ty,
                index,
            })
            .collect()
    }

    fn raw(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn aligned_row_repairs_at_offset_zero() {
        let schema = schema(&[ColumnType::Email, ColumnType::Integer]);
        let repaired = repair_row(&raw(&["x@y.com", "42"]), &schema);
        assert_eq!(repaired, Some(raw(&["x@y.com", "42"])));
    }

    #[test]
    fn shifting_improves_alignment() {
        let schema = schema(&[ColumnType::Integer, ColumnType::Email]);
        let repaired = repair_row(&raw(&["x@y.com"]), &schema);
        assert_eq!(repaired, Some(raw(&["NULL", "x@y.com"])));
    }

    #[test]
    fn tie_break_favors_the_lowest_offset() {
        let schema = schema(&[ColumnType::Text, ColumnType::Text]);
        // Both offsets 0 and 1 score 1; the first scanned wins.
        let repaired = repair_row(&raw(&["a"]), &schema);
        assert_eq!(repaired, Some(raw(&["a", "NULL"])));
    }

    #[test]
    fn all_null_input_is_unrecoverable() {
        let schema = schema(&[ColumnType::Email, ColumnType::Integer]);
        assert_eq!(repair_row(&raw(&["NULL", "NULL"]), &schema), None);
        assert_eq!(repair_row(&raw(&["", ""]), &schema), None);
    }

    #[test]
    fn repaired_rows_always_match_schema_width() {
        let schema = schema(&[ColumnType::Text, ColumnType::Integer]);
        let overlong = repair_row(&raw(&["a", "1", "b", "c"]), &schema).unwrap();
        assert_eq!(overlong.len(), 2);
        let short = repair_row(&raw(&["a"]), &schema).unwrap();
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn anchors_outscore_weak_text_matches() {
        // An email anchor two positions over beats the in-place text match.
        let schema = schema(&[ColumnType::Text, ColumnType::Text, ColumnType::Email]);
        let repaired = repair_row(&raw(&["x@y.com"]), &schema).unwrap();
        assert_eq!(repaired, raw(&["NULL", "NULL", "x@y.com"]));
    }

    #[test]
    fn empty_schema_is_unrecoverable() {
        assert_eq!(repair_row(&raw(&["a"]), &[]), None);
    }
}
