// src/pipeline/window.rs

//! Write window: which normalized records may reach the store.
//!
//! Only tomorrow and the day after are persisted. Same-day forecasts were
//! written by the previous run, later days are too unreliable to be worth the
//! store's write budget.

use chrono::{Days, FixedOffset, Local, NaiveDate, Utc};

use crate::models::ForecastRecord;

/// Source of "today" as a local calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the host's zone, or in a fixed offset when configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    pub fn new(offset: Option<FixedOffset>) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Local::now().date_naive(),
        }
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// The two persisted dates following `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl WriteWindow {
    /// Window for a run happening on `today`.
    pub fn after(today: NaiveDate) -> Self {
        Self {
            first: today + Days::new(1),
            last: today + Days::new(2),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date == self.first || date == self.last
    }

    /// Keep only records dated inside the window, preserving order.
    pub fn select<I>(&self, records: I) -> Vec<ForecastRecord>
    where
        I: IntoIterator<Item = ForecastRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.contains(record.date))
            .collect()
    }
}

/// Records eligible for persistence when running on `today`.
pub fn eligible_records<I>(today: NaiveDate, records: I) -> Vec<ForecastRecord>
where
    I: IntoIterator<Item = ForecastRecord>,
{
    WriteWindow::after(today).select(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_record;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_window_accepts_only_next_two_days() {
        let window = WriteWindow::after(date("2023-05-31"));
        assert!(!window.contains(date("2023-05-31")));
        assert!(window.contains(date("2023-06-01")));
        assert!(window.contains(date("2023-06-02")));
        assert!(!window.contains(date("2023-06-03")));
        assert!(!window.contains(date("2023-05-30")));
    }

    #[test]
    fn test_window_crosses_year_end() {
        let window = WriteWindow::after(date("2023-12-31"));
        assert_eq!(window.first, date("2024-01-01"));
        assert_eq!(window.last, date("2024-01-02"));
    }

    #[test]
    fn test_eligible_records_filters_and_keeps_order() {
        let records = vec![
            sample_record("Sydney", "nsw", "2023-05-31"),
            sample_record("Sydney", "nsw", "2023-06-02"),
            sample_record("Sydney", "nsw", "2023-06-03"),
            sample_record("Penrith", "nsw", "2023-06-01"),
        ];

        let kept = eligible_records(date("2023-05-31"), records);
        let summary: Vec<_> = kept
            .iter()
            .map(|r| (r.location.as_str(), r.date_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Sydney", "2023-06-02".to_string()),
                ("Penrith", "2023-06-01".to_string())
            ]
        );
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(date("2023-05-31")).today(), date("2023-05-31"));
    }
}
