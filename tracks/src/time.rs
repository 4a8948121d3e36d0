use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parses an absolute instant. Sources disagree on formats, so this tries, in order: RFC 3339,
/// naive date-times (assumed UTC), and Unix epoch seconds.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(secs) = raw.parse::<f64>() {
        if secs.is_finite() {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round() as u32;
            if let Some(dt) = Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single() {
                return Ok(dt);
            }
        }
    }
    bail!("Can't parse {:?} as a timestamp", raw)
}

/// Seconds from `origin` to `instant`. Negative if the instant is before the origin.
pub fn seconds_since(origin: DateTime<Utc>, instant: DateTime<Utc>) -> f64 {
    let delta = instant.signed_duration_since(origin);
    // Split to keep sub-second precision without overflowing nanoseconds on long spans
    delta.num_seconds() as f64 + delta.subsec_nanos() as f64 / 1e9
}

/// Re-expresses absolute instants relative to a shared origin
pub fn normalize(origin: DateTime<Utc>, instants: &[DateTime<Utc>]) -> Vec<f64> {
    instants
        .iter()
        .map(|instant| seconds_since(origin, *instant))
        .collect()
}
