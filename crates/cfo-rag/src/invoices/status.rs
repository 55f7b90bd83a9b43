//! Invoice status classification relative to a given day

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days after today that still count as upcoming (inclusive)
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Derived invoice status, recomputed per query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Payment status is anything other than "not paid"
    Paid,
    /// Unpaid and the due date has passed
    Overdue,
    /// Unpaid and due within the next seven days, today included
    Upcoming,
    /// Unpaid and due later than that
    Future,
    /// Due date missing or unparseable
    Unknown,
}

impl InvoiceStatus {
    /// Label used in serialized tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
            Self::Upcoming => "Upcoming",
            Self::Future => "Future",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a date cell in any of the layouts invoice exports use
///
/// Month-first is tried before day-first for ambiguous slash dates.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Classify one invoice
///
/// Order matters: an unparseable due date wins over everything, then any
/// payment status other than "not paid" (case-insensitive) marks it paid even
/// when the due date has passed.
pub fn label_status(due_date: Option<NaiveDate>, payment_status: &str, today: NaiveDate) -> InvoiceStatus {
    let Some(due) = due_date else {
        return InvoiceStatus::Unknown;
    };

    if !payment_status.trim().eq_ignore_ascii_case("not paid") {
        return InvoiceStatus::Paid;
    }

    if due < today {
        InvoiceStatus::Overdue
    } else if due <= today + Duration::days(UPCOMING_WINDOW_DAYS) {
        InvoiceStatus::Upcoming
    } else {
        InvoiceStatus::Future
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reference_classifications() {
        let today = day(2024, 6, 15);
        assert_eq!(label_status(Some(day(2024, 6, 10)), "not paid", today), InvoiceStatus::Overdue);
        assert_eq!(label_status(Some(day(2024, 6, 20)), "not paid", today), InvoiceStatus::Upcoming);
        assert_eq!(label_status(Some(day(2024, 7, 1)), "not paid", today), InvoiceStatus::Future);
        assert_eq!(label_status(Some(day(2024, 6, 10)), "paid", today), InvoiceStatus::Paid);
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let today = day(2024, 6, 15);
        assert_eq!(label_status(Some(today), "Not Paid", today), InvoiceStatus::Upcoming);
        assert_eq!(label_status(Some(day(2024, 6, 22)), "NOT PAID", today), InvoiceStatus::Upcoming);
        assert_eq!(label_status(Some(day(2024, 6, 23)), "not paid", today), InvoiceStatus::Future);
    }

    #[test]
    fn test_unknown_beats_paid() {
        let today = day(2024, 6, 15);
        assert_eq!(label_status(None, "paid", today), InvoiceStatus::Unknown);
        assert_eq!(label_status(parse_date("soon"), "not paid", today), InvoiceStatus::Unknown);
    }

    #[test]
    fn test_other_payment_statuses_count_as_paid() {
        let today = day(2024, 6, 15);
        assert_eq!(label_status(Some(day(2024, 6, 1)), "Partially Paid", today), InvoiceStatus::Paid);
        assert_eq!(label_status(Some(day(2024, 6, 1)), "", today), InvoiceStatus::Paid);
    }

    #[test]
    fn test_parse_date_layouts() {
        let expected = day(2024, 6, 10);
        assert_eq!(parse_date("2024-06-10"), Some(expected));
        assert_eq!(parse_date(" 2024-06-10 00:00:00 "), Some(expected));
        assert_eq!(parse_date("06/10/2024"), Some(expected));
        assert_eq!(parse_date("25/06/2024"), Some(day(2024, 6, 25)));
        assert_eq!(parse_date("10 Jun 2024"), Some(expected));
        assert_eq!(parse_date("June 10, 2024"), Some(expected));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("n/a"), None);
    }
}
