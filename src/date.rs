//! Date and duration parsing.
//!
//! User input accepts several forms; everything is normalised to a UTC
//! instant truncated to whole seconds so task files stay stable on rewrite.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

use crate::error::{KanbanError, Result};

/// Current time, truncated to whole seconds.
pub fn now_utc() -> DateTime<Utc> {
    truncate(Utc::now())
}

/// Drop sub-second precision.
pub fn truncate(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(0)
}

/// Parse a user date relative to `now`.
///
/// Accepted, in order of attempt:
/// - `YYYY-MM-DD` (midnight UTC)
/// - RFC 3339 timestamps, or `YYYY-MM-DDTHH:MM[:SS]` taken as UTC
/// - "today", "tomorrow", "yesterday"
/// - "+Nd" / "-Nd"
pub fn parse_date_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = input.trim();
    let invalid = || KanbanError::InvalidDate {
        input: input.to_string(),
    };

    if let Some(instant) = parse_stored(s) {
        return Ok(instant);
    }

    let today = now.date_naive();
    let day = match s.to_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        "yesterday" => today.pred_opt(),
        other => parse_relative_days(other)
            .and_then(Duration::try_days)
            .and_then(|d| today.checked_add_signed(d)),
    };

    day.map(midnight).ok_or_else(invalid)
}

/// Parse a user date relative to the current time.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    parse_date_at(input, now_utc())
}

/// Parse the absolute forms only (what task files contain).
fn parse_stored(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(midnight(d));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive).trunc_subsecs(0));
        }
    }
    None
}

fn parse_relative_days(s: &str) -> Option<i64> {
    let sign = match s.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let n: i64 = s[1..].strip_suffix('d')?.parse().ok()?;
    Some(sign * n)
}

fn midnight(d: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN))
}

/// Canonical text form of an instant: RFC 3339, whole seconds, `Z` suffix.
pub fn format_instant(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a compact duration such as `90m`, `1h30m`, `2d` or `1w`.
///
/// An empty string or `0` is a zero duration.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s.is_empty() || s == "0" {
        return Some(Duration::zero());
    }

    let mut total = Duration::zero();
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let n: i64 = digits.parse().ok()?;
        digits.clear();
        let part = match c {
            's' => Duration::try_seconds(n),
            'm' => Duration::try_minutes(n),
            'h' => Duration::try_hours(n),
            'd' => Duration::try_days(n),
            'w' => Duration::try_weeks(n),
            _ => None,
        }?;
        total = total.checked_add(&part)?;
    }
    // Trailing digits without a unit.
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

/// Short human form of an elapsed duration ("45s", "12m", "5h", "3d").
pub fn format_age(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s => format!("{}d", s / 86_400),
    }
}

/// Serde adapter for required instants stored in frontmatter.
pub mod instant {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&format_instant(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_stored(raw.trim()).ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}")))
    }
}

/// Serde adapter for optional instants stored in frontmatter.
pub mod opt_instant {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<DateTime<Utc>>, s: S) -> std::result::Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&format_instant(t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_stored(raw.trim())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}"))),
        }
    }
}
