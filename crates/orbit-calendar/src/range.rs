//! Padded query range around a focus month.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Utc,
};

/// Days added on both sides of the month so adjacent-month grid cells
/// get populated.
pub const BUFFER_DAYS: u64 = 7;

/// Calendar-day bounds of the padded range (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// UTC bounds handed to the data-access layer (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Whether `[from, to]` intersects this range.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        from <= self.end && to >= self.start
    }
}

impl PaddedRange {
    /// Convert to UTC: `start` at local midnight, `end` at the last second
    /// of its local day.
    pub fn to_utc(&self, offset: FixedOffset) -> DateRange {
        let end_next_day = self.end.checked_add_days(Days::new(1)).unwrap_or(self.end);
        DateRange {
            start: local_midnight_utc(self.start, offset),
            end: local_midnight_utc(end_next_day, offset) - Duration::seconds(1),
        }
    }
}

/// Month bounds of `focus_month` padded by [`BUFFER_DAYS`] on each side.
pub fn expand(focus_month: NaiveDate) -> PaddedRange {
    let first = first_of_month(focus_month);
    let last = last_of_month(focus_month);

    PaddedRange {
        start: first
            .checked_sub_days(Days::new(BUFFER_DAYS))
            .unwrap_or(NaiveDate::MIN),
        end: last
            .checked_add_days(Days::new(BUFFER_DAYS))
            .unwrap_or(NaiveDate::MAX),
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// The instant a calendar day begins at `offset`.
pub fn local_midnight_utc(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = date.and_time(NaiveTime::MIN);
    (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// The calendar day `ts` falls on at `offset`.
pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_expand_march_2024() {
        let range = expand(date(2024, 3, 20));
        assert_eq!(range.start, date(2024, 2, 23));
        assert_eq!(range.end, date(2024, 4, 7));
    }

    #[test]
    fn test_expand_is_exact_for_every_month() {
        for year in [2023, 2024, 2025] {
            for month in 1..=12 {
                let focus = date(year, month, 15);
                let range = expand(focus);
                let first = date(year, month, 1);
                let last = last_of_month(focus);

                assert_eq!(first - range.start, chrono::Duration::days(7));
                assert_eq!(range.end - last, chrono::Duration::days(7));
                assert_eq!(last.month(), month);
                assert_eq!(last.succ_opt().unwrap().day(), 1);
            }
        }
    }

    #[test]
    fn test_expand_crosses_year_boundaries() {
        let range = expand(date(2024, 12, 1));
        assert_eq!(range.start, date(2024, 11, 24));
        assert_eq!(range.end, date(2025, 1, 7));

        let range = expand(date(2025, 1, 31));
        assert_eq!(range.start, date(2024, 12, 25));
    }

    #[test]
    fn test_leap_february() {
        assert_eq!(last_of_month(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(last_of_month(date(2023, 2, 10)), date(2023, 2, 28));
    }

    #[test]
    fn test_to_utc_covers_whole_end_day() {
        let range = expand(date(2024, 3, 1)).to_utc(utc());
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 2, 23, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 4, 7, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_to_utc_with_positive_offset() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let range = expand(date(2024, 3, 1)).to_utc(ist);
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 2, 22, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_local_date_respects_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 14, 22, 0, 0).unwrap();
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(local_date(ts, utc()), date(2024, 3, 14));
        assert_eq!(local_date(ts, plus_three), date(2024, 3, 15));
    }

    #[test]
    fn test_date_range_overlaps() {
        let range = expand(date(2024, 3, 1)).to_utc(utc());
        let before = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let inside = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert!(range.overlaps(before, inside));
        assert!(range.overlaps(before, after));
        assert!(!range.overlaps(before, before));
        assert!(range.contains(inside));
        assert!(!range.contains(after));
    }
}
