//! Display formats for dates (`DD.MM.YYYY`) and times (`HH:MM`).
//!
//! Records store the display string verbatim. Anything that compares dates
//! goes through [`NaiveDate`], never through string order.

use chrono::{NaiveDate, NaiveTime};

use crate::error::RecordError;

pub const DATE_FORMAT: &str = "%d.%m.%Y";
pub const TIME_FORMAT: &str = "%H:%M";

/// Parses a `DD.MM.YYYY` string. Rejects non-padded or otherwise
/// non-canonical spellings so the stored string always round-trips.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
    (format_date(date) == value).then_some(date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses an `HH:MM` string with the same canonical-form rule as dates.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let time = NaiveTime::parse_from_str(value, TIME_FORMAT).ok()?;
    (time.format(TIME_FORMAT).to_string() == value).then_some(time)
}

pub(crate) fn require_date(field: &'static str, value: &str) -> Result<NaiveDate, RecordError> {
    parse_date(value)
        .ok_or_else(|| RecordError::invalid(field, format!("'{}' is not a DD.MM.YYYY date", value)))
}

pub(crate) fn require_time(field: &'static str, value: &str) -> Result<NaiveTime, RecordError> {
    parse_time(value)
        .ok_or_else(|| RecordError::invalid(field, format!("'{}' is not an HH:MM time", value)))
}

/// Inclusive calendar range `[start, end]` with day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range; a reversed range is rejected.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RecordError> {
        if end < start {
            return Err(RecordError::invalid(
                "date_range",
                format!("end {} is before start {}", format_date(end), format_date(start)),
            ));
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two display strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, RecordError> {
        Self::new(require_date("start", start)?, require_date("end", end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `YYYYMMDD` bounds for comparison against `db::calendar_key`.
    pub(crate) fn calendar_bounds(&self) -> (String, String) {
        (
            self.start.format("%Y%m%d").to_string(),
            self.end.format("%Y%m%d").to_string(),
        )
    }
}
