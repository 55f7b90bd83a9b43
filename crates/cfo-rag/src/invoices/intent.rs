//! Keyword-based query intent

use once_cell::sync::Lazy;
use regex::Regex;

use super::status::InvoiceStatus;

static UPCOMING_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)upcoming|this\s+week|next\s+week").expect("valid regex"));
static OVERDUE_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)overdue|late|crossed").expect("valid regex"));

/// Which invoice rows a question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// Unpaid invoices past their due date
    Overdue,
    /// Unpaid invoices due within the next seven days
    Upcoming,
    /// No filtering
    General,
}

impl QueryIntent {
    /// Classify a question
    ///
    /// Keywords match anywhere in the text, case-insensitively, so "overdues"
    /// and "lately" count. Upcoming keywords are checked first: "late invoices
    /// due next week" is an upcoming question.
    pub fn classify(query: &str) -> Self {
        if UPCOMING_KEYWORDS.is_match(query) {
            Self::Upcoming
        } else if OVERDUE_KEYWORDS.is_match(query) {
            Self::Overdue
        } else {
            Self::General
        }
    }

    /// Status rows must carry to pass the filter; `None` keeps everything
    pub fn status(&self) -> Option<InvoiceStatus> {
        match self {
            Self::Overdue => Some(InvoiceStatus::Overdue),
            Self::Upcoming => Some(InvoiceStatus::Upcoming),
            Self::General => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(QueryIntent::classify("Which invoices are OVERDUE?"), QueryIntent::Overdue);
        assert_eq!(QueryIntent::classify("who paid late"), QueryIntent::Overdue);
        assert_eq!(QueryIntent::classify("due dates crossed"), QueryIntent::Overdue);
        assert_eq!(QueryIntent::classify("upcoming payments"), QueryIntent::Upcoming);
        assert_eq!(QueryIntent::classify("what is due this week"), QueryIntent::Upcoming);
        assert_eq!(QueryIntent::classify("Next  Week collections"), QueryIntent::Upcoming);
        assert_eq!(QueryIntent::classify("summarise cash position"), QueryIntent::General);
    }

    #[test]
    fn test_upcoming_has_priority() {
        assert_eq!(
            QueryIntent::classify("late invoices and upcoming ones"),
            QueryIntent::Upcoming
        );
        assert_eq!(
            QueryIntent::classify("Show upcoming payments and anything overdue"),
            QueryIntent::Upcoming
        );
    }

    #[test]
    fn test_keywords_match_inside_words() {
        assert_eq!(QueryIntent::classify("List overdues by customer"), QueryIntent::Overdue);
        assert_eq!(QueryIntent::classify("anything paid lately?"), QueryIntent::Overdue);
        assert_eq!(QueryIntent::classify("calculate total AR"), QueryIntent::Overdue);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(QueryIntent::Overdue.status(), Some(InvoiceStatus::Overdue));
        assert_eq!(QueryIntent::Upcoming.status(), Some(InvoiceStatus::Upcoming));
        assert_eq!(QueryIntent::General.status(), None);
    }
}
