//! Normalization of stored date representations into a single instant type.
//!
//! Every date field in a stored document passes through [`normalize`] exactly
//! once, when the document is converted to a domain entity. Downstream code
//! only ever sees [`Instant`] (or nothing), so comparison and arithmetic never
//! have to re-check the shape of a date.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Epoch values whose magnitude is below this are treated as seconds rather
/// than milliseconds (1e11 ms is still only mid-1973).
const EPOCH_SECONDS_CUTOFF: i64 = 100_000_000_000;

/// A normalized point in time, stored as milliseconds since the Unix epoch
/// in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(i64);

impl Instant {
    /// Build from a validated millisecond count. Returns `None` when chrono
    /// cannot represent the value.
    pub fn from_millis(millis: i64) -> Option<Self> {
        match Utc.timestamp_millis_opt(millis) {
            chrono::LocalResult::Single(_) => Some(Self(millis)),
            _ => None,
        }
    }

    /// An instant at `hour:minute` on `date`. Out-of-range components are
    /// clamped to the end of the day rather than rejected; callers pass slot
    /// coordinates that are already grid-bounded.
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let time = date
            .and_hms_opt(hour.min(23), minute.min(59), 0)
            .unwrap_or_else(|| {
                date.and_hms_opt(23, 59, 0)
                    .expect("23:59 is a valid wall-clock time")
            });
        Self(time.and_utc().timestamp_millis())
    }

    /// Midnight at the start of `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::at(date, 0, 0)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    fn datetime(&self) -> DateTime<Utc> {
        match Utc.timestamp_millis_opt(self.0) {
            chrono::LocalResult::Single(dt) => dt,
            // from_millis guards construction, so this is unreachable for any
            // value built through the public API.
            _ => DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// The calendar date this instant falls on.
    pub fn date(&self) -> NaiveDate {
        self.datetime().date_naive()
    }

    /// Minutes elapsed since midnight on this instant's date.
    pub fn minute_of_day(&self) -> u32 {
        let dt = self.datetime();
        dt.time().hour() as u32 * 60 + dt.time().minute() as u32
    }

    pub fn hour(&self) -> u32 {
        self.minute_of_day() / 60
    }

    pub fn minute(&self) -> u32 {
        self.minute_of_day() % 60
    }
}

/// Why a raw date failed to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absent {
    /// The field was not present at all.
    Missing,
    /// The value was present but no accepted form matched.
    Unparseable,
    /// The value parsed but lies outside the representable range.
    OutOfRange,
}

/// The stored date shapes accepted at the ingestion boundary.
///
/// Documents written by older builds (and imports from other tools) disagree
/// on how dates are serialized; this union names each accepted shape once
/// instead of duck-typing at every call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    /// Epoch count; milliseconds, tolerating plain seconds.
    Epoch(i64),
    /// Server-timestamp wrapper: whole seconds plus a nanosecond remainder.
    Wrapped { seconds: i64, nanos: u32 },
    /// ISO-8601-ish string, with or without a time component.
    Iso(String),
}

impl From<Instant> for RawDate {
    fn from(instant: Instant) -> Self {
        RawDate::Epoch(instant.millis())
    }
}

/// Resolve a raw date to an [`Instant`]. Never panics; every failure mode
/// collapses to an [`Absent`] reason.
pub fn normalize(raw: &RawDate) -> Result<Instant, Absent> {
    match raw {
        RawDate::Epoch(value) => normalize_epoch(*value),
        RawDate::Wrapped { seconds, nanos } => {
            let millis = seconds
                .checked_mul(1000)
                .and_then(|ms| ms.checked_add((*nanos / 1_000_000) as i64))
                .ok_or(Absent::OutOfRange)?;
            Instant::from_millis(millis).ok_or(Absent::OutOfRange)
        }
        RawDate::Iso(text) => normalize_iso(text),
    }
}

/// Convenience for optional document fields: `None` and malformed values
/// both contribute nothing.
pub fn normalize_opt(raw: Option<&RawDate>) -> Option<Instant> {
    raw.and_then(|r| normalize(r).ok())
}

fn normalize_epoch(value: i64) -> Result<Instant, Absent> {
    let millis = if value.unsigned_abs() < EPOCH_SECONDS_CUTOFF as u64 {
        value.checked_mul(1000).ok_or(Absent::OutOfRange)?
    } else {
        value
    };
    Instant::from_millis(millis).ok_or(Absent::OutOfRange)
}

fn normalize_iso(text: &str) -> Result<Instant, Absent> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Absent::Missing);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Instant::from_millis(dt.timestamp_millis()).ok_or(Absent::OutOfRange);
    }

    // Timestamps without an offset are taken as UTC.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Instant::from_millis(naive.and_utc().timestamp_millis())
                .ok_or(Absent::OutOfRange);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(Instant::from_date(date));
    }

    Err(Absent::Unparseable)
}

/// Weekday index with Sunday = 0 .. Saturday = 6.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(weekday_index(date), 0 | 6)
}

/// First day of the month `date` falls in.
pub fn month_anchor(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Shift a month anchor by whole months, clamping to the first of the
/// resulting month.
pub fn add_months(anchor: NaiveDate, delta: i32) -> NaiveDate {
    let total = anchor.year() * 12 + anchor.month0() as i32 + delta;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or_else(|| {
        month_anchor(anchor + Duration::days(30 * delta as i64))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalize_is_idempotent() {
        let cases = [
            RawDate::Epoch(1_741_600_000_000),
            RawDate::Epoch(1_741_600_000),
            RawDate::Iso("2025-03-10T09:30:00Z".to_string()),
            RawDate::Wrapped {
                seconds: 1_741_600_000,
                nanos: 500_000_000,
            },
        ];
        for raw in cases {
            let once = normalize(&raw).expect("case should normalize");
            let twice = normalize(&RawDate::from(once)).expect("re-normalize should succeed");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn epoch_seconds_and_millis_agree() {
        let seconds = normalize(&RawDate::Epoch(1_741_600_000)).unwrap();
        let millis = normalize(&RawDate::Epoch(1_741_600_000_000)).unwrap();
        assert_eq!(seconds, millis);
    }

    #[test]
    fn iso_forms_resolve() {
        let full = normalize(&RawDate::Iso("2025-03-10T09:30:00+00:00".into())).unwrap();
        assert_eq!(full.date(), date(2025, 3, 10));
        assert_eq!(full.minute_of_day(), 9 * 60 + 30);

        let no_offset = normalize(&RawDate::Iso("2025-03-10T09:30:00".into())).unwrap();
        assert_eq!(no_offset, full);

        let bare = normalize(&RawDate::Iso("2025-03-10".into())).unwrap();
        assert_eq!(bare.date(), date(2025, 3, 10));
        assert_eq!(bare.minute_of_day(), 0);
    }

    #[test]
    fn malformed_values_become_absent() {
        assert_eq!(
            normalize(&RawDate::Iso("not a date".into())),
            Err(Absent::Unparseable)
        );
        assert_eq!(normalize(&RawDate::Iso("   ".into())), Err(Absent::Missing));
        assert_eq!(
            normalize(&RawDate::Epoch(i64::MAX)),
            Err(Absent::OutOfRange)
        );
        assert_eq!(
            normalize(&RawDate::Epoch(i64::MIN)),
            Err(Absent::OutOfRange)
        );
        assert_eq!(normalize_opt(None), None);
        assert_eq!(normalize_opt(Some(&RawDate::Iso("??".into()))), None);
    }

    #[test]
    fn wrapped_pair_keeps_subsecond_millis() {
        let instant = normalize(&RawDate::Wrapped {
            seconds: 10,
            nanos: 250_000_000,
        })
        .unwrap();
        assert_eq!(instant.millis(), 10_250);
    }

    #[test]
    fn weekday_index_is_sunday_based() {
        // 2025-03-09 is a Sunday.
        assert_eq!(weekday_index(date(2025, 3, 9)), 0);
        assert_eq!(weekday_index(date(2025, 3, 15)), 6);
        assert!(is_weekend(date(2025, 3, 9)));
        assert!(!is_weekend(date(2025, 3, 12)));
    }

    #[test]
    fn month_arithmetic_wraps_years() {
        let anchor = month_anchor(date(2025, 12, 15));
        assert_eq!(anchor, date(2025, 12, 1));
        assert_eq!(add_months(anchor, 1), date(2026, 1, 1));
        assert_eq!(add_months(anchor, -12), date(2024, 12, 1));
    }

    #[test]
    fn instant_at_clamps_components() {
        let instant = Instant::at(date(2025, 3, 10), 30, 90);
        assert_eq!(instant.date(), date(2025, 3, 10));
    }
}
