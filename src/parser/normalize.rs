use std::sync::LazyLock;

use regex::Regex;
use tracing::error;

use super::ExtractError;
use crate::config::{NumericPolicy, TranslationTable, NUMERIC_FIELDS, QUALIFYING_STATS, TRANSLATIONS};
use crate::record::{StatValue, Stats};

static LEADING_FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap());
static LEADING_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[+-]?\d+").unwrap());

/// Lower-case `value` and map it through the first matching row of `table`.
pub fn translate(value: &str, table: &TranslationTable) -> String {
    let value = value.to_lowercase();
    table
        .entries
        .iter()
        .find(|t| t.from.iter().any(|from| from.eq_ignore_ascii_case(&value)))
        .map(|t| t.to.to_string())
        .unwrap_or(value)
}

/// Return `stats` with `table` applied to its field, if that field is set.
pub fn apply_table(stats: Stats, table: &TranslationTable) -> Stats {
    let translated = match stats.get(table.field).and_then(StatValue::as_text) {
        Some(raw) => translate(raw, table),
        None => return stats,
    };
    stats.with(table.field, StatValue::Text(translated))
}

/// All canonical vocabulary tables, in order.
pub fn normalize(stats: Stats) -> Stats {
    TRANSLATIONS.iter().fold(stats, apply_table)
}

/// Equipment has at least one strictly positive qualifying stat.
pub fn qualifies(stats: &Stats) -> bool {
    QUALIFYING_STATS.iter().any(|name| {
        let value = match stats.get_by_name(name) {
            Some(StatValue::Text(s)) => leading_float(s),
            Some(StatValue::Number(n)) => Some(*n),
            None => None,
        };
        value.is_some_and(|v| v > 0.0)
    })
}

/// Rewrite every declared-numeric field from text to a number.
pub fn coerce_numeric(stats: Stats, policy: NumericPolicy) -> Result<Stats, ExtractError> {
    stats
        .into_iter()
        .map(|(field, value)| match value {
            StatValue::Text(raw) if NUMERIC_FIELDS.contains(&field) => match parse_number(&raw) {
                Some(n) => Ok((field, StatValue::Number(n))),
                None if policy == NumericPolicy::Lenient => Ok((field, StatValue::Text(raw))),
                None => {
                    error!(field = field.as_str(), value = %raw, "non-numeric value in numeric field");
                    Err(ExtractError::MalformedNumber {
                        field: field.as_str(),
                        value: raw,
                    })
                }
            },
            other => Ok((field, other)),
        })
        .collect()
}

/// Whole-string number, surrounding whitespace allowed.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Longest numeric prefix, e.g. `"12 (+3)"` → 12.
pub fn leading_float(s: &str) -> Option<f64> {
    LEADING_FLOAT_RE
        .find(s)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
}

/// Longest integer prefix, e.g. `"4151, 4152"` → 4151.
pub fn leading_int(s: &str) -> Option<i64> {
    LEADING_INT_RE
        .find(s)
        .and_then(|m| m.as_str().trim().parse::<i64>().ok())
}

// ── Tests ──
