//! Timestamp and calendar-date formats used in book files.
//!
//! Timestamps (`<ts:date>`) look like `2023-06-01 10:59:00 +0200`; calendar
//! dates (`<gdate>`) like `2023-06-01`.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::TypeError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Book timestamps keep the UTC offset they were written with.
pub type Timestamp = DateTime<FixedOffset>;

pub fn parse_timestamp(s: &str) -> Result<Timestamp, TypeError> {
    DateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| TypeError::InvalidTimestamp(s.to_string()))
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, TypeError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| TypeError::InvalidDate(s.to_string()))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
