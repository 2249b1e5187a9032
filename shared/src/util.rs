/// Current UTC time as Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `(year, month)` of the calendar month (UTC) containing `millis`
pub fn year_month(millis: i64) -> Option<(i32, u32)> {
    use chrono::{Datelike, TimeZone, Utc};
    let dt = Utc.timestamp_millis_opt(millis).single()?;
    Some((dt.year(), dt.month()))
}
