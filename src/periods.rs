// src/periods.rs

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use tracing::{debug, instrument, trace};

use crate::error::TransformError;
use crate::fetch::SidraTable;

/// A released period, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRow {
    /// `Período`, e.g. "março 2024".
    pub period: String,
    /// `Código`, e.g. "202403". Kept even when the source omitted it.
    pub code: Option<String>,
    /// `Data de Liberação`, local wall-clock time.
    pub released_at: NaiveDateTime,
}

pub type PeriodTable = Vec<PeriodRow>;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Comma decimal separator becomes a dot; an hour-only time gets `:00`.
fn normalize(s: &str) -> String {
    let mut out = s.replacen(',', ".", 1);
    if out.len() == 13 && matches!(out.as_bytes()[10], b'T' | b' ') {
        out.push_str(":00");
    }
    out
}

/// Parse an ISO-8601 release timestamp.
///
/// Accepts a bare date (midnight), a date-time with `T` or a space down to
/// hour precision, and RFC 3339 strings with an offset, which are shifted
/// into local time. The compact basic format (`20240410`) is not accepted.
pub fn parse_release_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = normalize(s);
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Keep the periods released strictly before `now`, in source order.
///
/// Entries without a label or release date are skipped; an unparseable
/// release date fails the whole batch.
#[instrument(level = "debug", skip(response), fields(periods = response.periods().len()))]
pub fn build_period_table(
    response: &SidraTable,
    now: NaiveDateTime,
) -> Result<PeriodTable, TransformError> {
    let mut rows = Vec::new();

    for entry in response.periods() {
        let (Some(name), Some(raw)) = (non_empty(&entry.name), non_empty(&entry.released_at))
        else {
            trace!(code = ?entry.code, "skipping incomplete period");
            continue;
        };

        let released_at =
            parse_release_timestamp(raw).ok_or_else(|| TransformError::MalformedTimestamp {
                period: name.to_string(),
                value: raw.to_string(),
            })?;

        if released_at < now {
            rows.push(PeriodRow {
                period: name.to_string(),
                code: entry.code.clone(),
                released_at,
            });
        } else {
            trace!(period = name, %released_at, "not released yet");
        }
    }

    debug!(rows = rows.len(), "built period table");
    Ok(rows)
}
