use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::warn;

use crate::params::SearchParams;
use shared::domain::DateRange;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Start and end instants of the current day, used as date range defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBoundaries {
    pub today: DateTime<Utc>,
    pub tonight: DateTime<Utc>,
}

impl DateBoundaries {
    pub fn for_day(day: NaiveDate) -> Self {
        let today = day.and_time(NaiveTime::MIN).and_utc();
        let tonight = day
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(NaiveTime::MIN).and_utc() - TimeDelta::milliseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { today, tonight }
    }

    pub fn current() -> Self {
        Self::for_day(Utc::now().date_naive())
    }

    pub fn default_range(&self) -> DateRange {
        DateRange {
            start_date: self.today,
            end_date: self.tonight,
        }
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc).date_naive())
        })
}

pub(crate) fn parse_date_params(params: &SearchParams, dates: &DateBoundaries) -> DateRange {
    let mut range = dates.default_range();
    if let Some(raw) = params.get_non_empty("endDate") {
        match parse_day(raw) {
            Some(day) => range.end_date = DateBoundaries::for_day(day).tonight,
            None => warn!(param = "endDate", value = raw, "ignoring malformed date"),
        }
    }
    if let Some(raw) = params.get_non_empty("startDate") {
        match parse_day(raw) {
            Some(day) => range.start_date = DateBoundaries::for_day(day).today,
            None => warn!(param = "startDate", value = raw, "ignoring malformed date"),
        }
    }
    range
}

pub(crate) fn format_dates(params: &mut SearchParams, range: &DateRange, dates: &DateBoundaries) {
    if range.end_date != dates.tonight {
        params.set("endDate", range.end_date.format(DATE_FORMAT).to_string());
    }
    if range.start_date != dates.today {
        params.set("startDate", range.start_date.format(DATE_FORMAT).to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn boundaries_cover_the_whole_day() {
        let dates = DateBoundaries::for_day(day(2026, 10, 16));
        assert_eq!(dates.today.to_rfc3339(), "2026-10-16T00:00:00+00:00");
        assert_eq!(
            dates.tonight.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            "2026-10-16T23:59:59.999"
        );
    }

    #[test]
    fn malformed_dates_fall_back_to_defaults() {
        let dates = DateBoundaries::for_day(day(2026, 10, 16));
        let params = SearchParams::parse("startDate=yesterday&endDate=2026-13-01");
        assert_eq!(parse_date_params(&params, &dates), dates.default_range());
    }

    #[test]
    fn default_range_formats_to_nothing() {
        let dates = DateBoundaries::for_day(day(2026, 10, 16));
        let mut params = SearchParams::new();
        format_dates(&mut params, &dates.default_range(), &dates);
        assert!(params.is_empty());
    }
}
