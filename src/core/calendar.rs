//! Calendar helpers shared by the weekly rollup and goal periods.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Midnight of `day` in `tz`, as a UTC instant.
///
/// When midnight does not exist locally (a DST gap), the clock is moved
/// forward an hour at a time until it lands on a valid local time.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    (0..=3)
        .find_map(|hours| {
            tz.from_local_datetime(&(naive + Duration::hours(hours)))
                .earliest()
        })
        .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
}

/// The same day of the following month.
///
/// Days that do not exist in that month carry over into the next one, so
/// Jan 31 becomes Mar 2 in a leap year (Mar 3 otherwise).
#[must_use]
pub fn next_month_same_day(day: NaiveDate) -> Option<NaiveDate> {
    day.with_day(1)?
        .checked_add_months(Months::new(1))?
        .checked_add_days(Days::new(u64::from(day.day0())))
}

/// Sunday 00:00 of the week containing `now` and the Sunday after it, both in
/// the time zone of `now`.
pub fn week_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let start_day = today - Days::new(u64::from(today.weekday().num_days_from_sunday()));
    let end_day = start_day + Days::new(7);
    (local_midnight(&tz, start_day), local_midnight(&tz, end_day))
}

/// Whole days between two instants, rounded up.
#[must_use]
pub fn ceil_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let ms = (to - from).num_milliseconds();
    let whole = ms / MS_PER_DAY;
    if ms % MS_PER_DAY > 0 { whole + 1 } else { whole }
}
