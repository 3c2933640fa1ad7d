//! Freshness rules for the cached feed.

use chrono::{DateTime, Days, Local, LocalResult, Offset, TimeDelta, TimeZone, Utc};

/// How long a cached feed stays valid.
pub const MAX_CACHE_AGE_DAYS: u64 = 7;

/// Whether a feed cached at `timestamp` is still fresh at `now`, counting
/// days on the local calendar.
pub fn is_fresh(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  is_fresh_in(timestamp, now, &Local)
}

/// Whether a feed cached at `timestamp` is still fresh at `now`, counting
/// days on the calendar of `tz`.
///
/// The cache expires at the same wall-clock time `MAX_CACHE_AGE_DAYS` days
/// later, so a DST transition in between shortens or lengthens the window
/// by the size of the shift.
pub fn is_fresh_in<Tz: TimeZone>(timestamp: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> bool {
  match expiration_in(timestamp, tz) {
    Some(max_age) => now < max_age,
    None => false,
  }
}

fn expiration_in<Tz: TimeZone>(timestamp: DateTime<Utc>, tz: &Tz) -> Option<DateTime<Utc>> {
  let saved = timestamp.with_timezone(tz);
  let expiry = saved
    .naive_local()
    .checked_add_days(Days::new(MAX_CACHE_AGE_DAYS))?;

  match tz.from_local_datetime(&expiry) {
    LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
    LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
    LocalResult::None => {
      // Wall-clock time skipped by a forward shift: read it with the saved offset
      let offset = TimeDelta::seconds(i64::from(saved.offset().fix().local_minus_utc()));
      expiry
        .checked_sub_signed(offset)
        .map(|utc| Utc.from_utc_datetime(&utc))
    }
  }
}
