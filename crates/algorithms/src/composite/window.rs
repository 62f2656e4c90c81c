//! Rolling date windows

use baws_core::{Error, Result};
use chrono::{Duration, NaiveDate};

/// Consecutive calendar days ending on the current working date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    dates: Vec<NaiveDate>,
}

impl DateWindow {
    /// The `days` days up to and including `current`
    pub fn ending_on(current: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 || days > u32::from(u8::MAX) {
            return Err(Error::InvalidParameter {
                name: "days",
                value: days.to_string(),
                reason: "window length must be between 1 and 255".into(),
            });
        }
        let dates = (0..i64::from(days))
            .rev()
            .map(|back| current - Duration::days(back))
            .collect();
        Ok(Self { dates })
    }

    /// Window over explicit dates; the last date is the current working date.
    ///
    /// Dates are sorted and deduplicated, so the current date is the latest.
    pub fn new(mut dates: Vec<NaiveDate>) -> Result<Self> {
        dates.sort();
        dates.dedup();
        if dates.is_empty() || dates.len() > usize::from(u8::MAX) {
            return Err(Error::InvalidParameter {
                name: "dates",
                value: dates.len().to_string(),
                reason: "window must hold between 1 and 255 dates".into(),
            });
        }
        Ok(Self { dates })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The current working date
    pub fn current(&self) -> NaiveDate {
        // never empty after construction
        self.dates[self.dates.len() - 1]
    }

    /// Date tokens as they appear in file names, oldest first
    pub fn tokens(&self, format: &str) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| d.format(format).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ending_on() {
        let w = DateWindow::ending_on(date(2019, 7, 2), 3).unwrap();
        assert_eq!(w.dates(), &[date(2019, 6, 30), date(2019, 7, 1), date(2019, 7, 2)]);
        assert_eq!(w.current(), date(2019, 7, 2));
        assert_eq!(w.tokens("%Y%m%d"), vec!["20190630", "20190701", "20190702"]);
    }

    #[test]
    fn test_invalid_length() {
        assert!(DateWindow::ending_on(date(2019, 7, 2), 0).is_err());
        assert!(DateWindow::ending_on(date(2019, 7, 2), 256).is_err());
        assert!(DateWindow::new(vec![]).is_err());
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let dates = vec![date(2019, 7, 2), date(2019, 6, 28), date(2019, 7, 2)];
        let w = DateWindow::new(dates).unwrap();
        assert_eq!(w.len(), 2);
        assert_eq!(w.current(), date(2019, 7, 2));
    }
}
