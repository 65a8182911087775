use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Whole Sunday-to-Saturday weeks ending on the most recent completed Saturday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl WeekWindow {
    /// Window of `weeks` trailing weeks as seen from `today`.
    ///
    /// The start is the Sunday on or before `today - weeks * 7` days; the end
    /// is the last Saturday strictly before `today` (a week back when `today`
    /// is itself a Saturday).
    pub fn trailing_weeks(today: NaiveDate, weeks: u32) -> Self {
        let back = today - Duration::days(7 * i64::from(weeks));
        let start_date = back - Duration::days(i64::from(back.weekday().num_days_from_sunday()));

        let since_saturday = match today.weekday() {
            Weekday::Sat => 7,
            other => i64::from(other.num_days_from_sunday()) + 1,
        };
        let end_date = today - Duration::days(since_saturday);

        Self {
            start_date,
            end_date,
        }
    }

    pub fn days_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Dates the way the ERP's filters expect them
    pub fn start_param(&self) -> String {
        self.start_date.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end_date.format("%Y-%m-%d").to_string()
    }
}
