use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses a calendar instant leniently.
///
/// Accepted shapes, tried in order:
/// - RFC 3339 (`2021-03-05T10:00:00Z`, `2021-03-05T10:00:00+02:00`)
/// - naive date-time (`2021-03-05T10:00:00`, `2021-03-05 10:00:00`, `2021-03-05T10:00`), read as UTC
/// - date (`2021-03-05`), month (`2021-03`) or year (`2021`), at UTC midnight of the first day
///
/// Returns `None` for anything else.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date_at_midnight(date);
    }

    parse_year_month(s).and_then(date_at_midnight)
}

fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let (year_part, month_part) = match s.split_once('-') {
        Some((y, m)) if !y.is_empty() => (y, Some(m)),
        _ => (s, None),
    };
    if year_part.len() != 4 || !year_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;
    let month: u32 = match month_part {
        Some(m) if (1..=2).contains(&m.len()) && m.bytes().all(|b| b.is_ascii_digit()) => {
            m.parse().ok()?
        }
        Some(_) => return None,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn date_at_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}

pub const MS_PER_DAY: i64 = 86_400_000;

/// Average Gregorian year, used for span-in-years estimates only.
pub const MS_PER_YEAR: f64 = 365.2425 * MS_PER_DAY as f64;
