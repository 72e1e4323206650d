//! AnyRow column helpers.
//!
//! The models implement `sqlx::FromRow` against `sqlx::any::AnyRow` so the
//! same queries run on PostgreSQL and SQLite. The Any driver only natively
//! decodes primitives (integers, floats, bool, String, bytes), so UUIDs,
//! timestamps, and JSON string-lists travel as TEXT and are converted here.

use chrono::{DateTime, Utc};
use sqlx::{any::AnyRow, Row};
use uuid::Uuid;

pub fn get_uuid(row: &AnyRow, col: &str) -> Result<Uuid, sqlx::Error> {
    let s: String = row.try_get(col)?;
    Uuid::parse_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e) as _))
}

pub fn get_opt_uuid(row: &AnyRow, col: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|v| Uuid::parse_str(&v).map_err(|e| sqlx::Error::Decode(Box::new(e) as _)))
        .transpose()
}

pub fn get_datetime(row: &AnyRow, col: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let s: String = row.try_get(col)?;
    parse_datetime(&s).map_err(sqlx::Error::Decode)
}

pub fn get_opt_datetime(row: &AnyRow, col: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|v| parse_datetime(&v).map_err(sqlx::Error::Decode)).transpose()
}

fn parse_datetime(
    s: &str,
) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    // RFC 3339 is what we write; SQLite's CURRENT_TIMESTAMP format is
    // accepted as a fallback for hand-seeded rows.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(dt.and_utc());
    }
    Err(format!("cannot parse timestamp: {s}").into())
}

/// Decode a JSON-array-of-strings column (e.g. `["rust","figma"]`).
pub fn get_string_vec(row: &AnyRow, col: &str) -> Result<Vec<String>, sqlx::Error> {
    let s: String = row.try_get(col)?;
    if s.is_empty() || s == "[]" {
        return Ok(vec![]);
    }
    serde_json::from_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e) as _))
}

/// Encode a timestamp for storage. Fixed-width RFC 3339 (UTC, microsecond
/// precision) so lexicographic TEXT comparison agrees with time order —
/// the unread-count query compares cursors with `>` directly in SQL.
pub fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Encode a string list for storage as a JSON array.
pub fn encode_string_vec(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_timestamps_sort_lexicographically() {
        let t1 = Utc::now();
        let t2 = t1 + chrono::Duration::microseconds(1);
        let t3 = t1 + chrono::Duration::seconds(90);
        assert!(encode_ts(t1) < encode_ts(t2));
        assert!(encode_ts(t2) < encode_ts(t3));
    }

    #[test]
    fn encode_parse_round_trip() {
        let now = Utc::now();
        let parsed = parse_datetime(&encode_ts(now)).unwrap();
        // Microsecond precision is preserved
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }
}
