//! Trailing week window tests

use chrono::NaiveDate;
use erp_sheets_sync::utils::WeekWindow;
use pretty_assertions::assert_eq;
use test_log::test;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_four_weeks_from_a_friday() {
    // Friday Oct 16, 2026: 28 days back is Friday Sep 18, its Sunday is Sep 13
    let window = WeekWindow::trailing_weeks(date(2026, 10, 16), 4);

    assert_eq!(window.start_date, date(2026, 9, 13));
    assert_eq!(window.end_date, date(2026, 10, 10));
}

#[test]
fn test_twelve_weeks_from_a_friday() {
    let window = WeekWindow::trailing_weeks(date(2026, 10, 16), 12);

    assert_eq!(window.start_date, date(2026, 7, 19));
    assert_eq!(window.end_date, date(2026, 10, 10));
    assert_eq!(window.days_count(), 84);
}

#[test]
fn test_window_from_a_sunday() {
    // 28 days back from a Sunday is itself a Sunday
    let window = WeekWindow::trailing_weeks(date(2026, 10, 18), 4);
    assert_eq!(window.start_date, date(2026, 9, 20));
    assert_eq!(window.end_date, date(2026, 10, 17));

    let window = WeekWindow::trailing_weeks(date(2026, 10, 18), 12);
    assert_eq!(window.start_date, date(2026, 7, 26));
}

#[test]
fn test_window_from_a_saturday_ends_a_week_back() {
    let window = WeekWindow::trailing_weeks(date(2026, 10, 17), 4);

    assert_eq!(window.start_date, date(2026, 9, 13));
    assert_eq!(window.end_date, date(2026, 10, 10));
}

#[test]
fn test_window_across_year_end() {
    // Wednesday Jan 8, 2025
    let window = WeekWindow::trailing_weeks(date(2025, 1, 8), 4);
    assert_eq!(window.start_date, date(2024, 12, 8));
    assert_eq!(window.end_date, date(2025, 1, 4));

    let window = WeekWindow::trailing_weeks(date(2025, 1, 8), 12);
    assert_eq!(window.start_date, date(2024, 10, 13));
    assert_eq!(window.end_date, date(2025, 1, 4));
}
