use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};

/// The first `hour:00:00` local time strictly after `now`, as UTC.
///
/// Returns `None` when `hour` is not a valid hour of the day.
pub fn next_digest_at(now: DateTime<Utc>, hour: u32, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let fire_time = NaiveTime::from_hms_opt(hour, 0, 0)?;
    let local_now = now.with_timezone(&offset);
    let mut date = local_now.date_naive();
    loop {
        let candidate = date
            .and_time(fire_time)
            .and_local_timezone(offset)
            .single()?
            .with_timezone(&Utc);
        if candidate > now {
            return Some(candidate);
        }
        date = date.succ_opt()?;
    }
}

/// Like [`next_digest_at`], but never at or before `last_fired`. The wall
/// clock can lag the timer that woke us, so `now` alone may still sit just
/// before the instant that was already sent.
pub fn next_digest_after(
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
    hour: u32,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let from = last_fired.map_or(now, |fired| fired.max(now));
    next_digest_at(from, hour, offset)
}

/// Time left until `at`, zero if it already passed.
pub fn until(at: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    at.signed_duration_since(now)
        .max(Duration::zero())
        .to_std()
        .unwrap_or_default()
}
