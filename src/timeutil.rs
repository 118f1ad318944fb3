//! Calendar-hour bucketing and elapsed-time helpers.
//!
//! Summaries are keyed by the start of the local calendar hour. Truncation
//! happens in local time so that hour buckets line up with what the user
//! sees on a dashboard; the bucket key itself is stored as UTC.

use chrono::{DateTime, Local, TimeZone, Timelike, Utc};

/// Truncate a timestamp to the start of its local calendar hour.
///
/// During a DST spring-forward gap the truncated local time may not exist;
/// `earliest()` resolves ambiguous fall-back times to the first occurrence,
/// and a nonexistent local time falls back to UTC truncation.
pub fn hour_bucket(ts: DateTime<Utc>) -> DateTime<Utc> {
    let local = ts.with_timezone(&Local);
    if let Some(naive) = local.date_naive().and_hms_opt(local.hour(), 0, 0) {
        if let Some(bucket) = Local.from_local_datetime(&naive).earliest() {
            return bucket.with_timezone(&Utc);
        }
    }
    ts.date_naive()
        .and_hms_opt(ts.hour(), 0, 0)
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .unwrap_or(ts)
}

/// Fractional hours between two instants. Negative when `end` precedes
/// `start`; callers treat non-positive spans as an invalid window.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn bucket_is_idempotent() {
        let ts = Utc::now();
        let bucket = hour_bucket(ts);
        assert_eq!(hour_bucket(bucket), bucket);
    }

    #[test]
    fn nearby_samples_share_a_bucket() {
        // Minutes 1..14 past a bucket start stay inside that local hour for
        // every real-world UTC offset (all are multiples of 15 minutes).
        let base = hour_bucket(Utc::now()) + Duration::minutes(1);
        assert_eq!(hour_bucket(base), hour_bucket(base + Duration::minutes(9)));
    }

    #[test]
    fn samples_an_hour_apart_get_distinct_buckets() {
        let base = Utc::now();
        assert_ne!(hour_bucket(base), hour_bucket(base + Duration::hours(1)));
    }

    #[test]
    fn hours_between_is_signed() {
        let t = Utc::now();
        assert_eq!(hours_between(t, t + Duration::hours(2)), 2.0);
        assert_eq!(hours_between(t + Duration::hours(2), t), -2.0);
        assert_eq!(hours_between(t, t), 0.0);
    }
}
