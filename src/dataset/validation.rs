//! Search date validation.
//!
//! The pattern only checks digit counts and month/day ranges. It does not know
//! month lengths, so `2023-02-31` is accepted and simply matches no records.
//! Years are any four ASCII digits.

use once_cell::sync::Lazy;
use regex::Regex;

/// Body returned with 400 when the search date is malformed.
pub const SEARCH_FORMAT_MESSAGE: &str = "Search should be formatted with search?date=yyyy-mm-dd";

static SEARCH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[012])-(0[1-9]|[12][0-9]|3[01])$")
        .unwrap_or_else(|e| panic!("search date pattern is invalid: {e}"))
});

/// Check whether `date` is an acceptable search date.
pub fn is_valid_search_date(date: &str) -> bool {
    SEARCH_DATE.is_match(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_dates() {
        assert!(is_valid_search_date("2023-01-01"));
        assert!(is_valid_search_date("2023-12-31"));
        assert!(is_valid_search_date("1999-10-20"));
    }

    #[test]
    fn accepts_any_four_digit_year() {
        assert!(is_valid_search_date("0000-01-01"));
        assert!(is_valid_search_date("9999-06-15"));
    }

    #[test]
    fn accepts_days_past_month_end() {
        assert!(is_valid_search_date("2023-02-31"));
        assert!(is_valid_search_date("2023-04-31"));
    }

    #[test]
    fn rejects_out_of_range_month_and_day() {
        assert!(!is_valid_search_date("2023-13-01"));
        assert!(!is_valid_search_date("2023-00-10"));
        assert!(!is_valid_search_date("2023-01-32"));
        assert!(!is_valid_search_date("2023-01-00"));
    }

    #[test]
    fn rejects_wrong_shapes() {
        for date in [
            "",
            "2023-1-01",
            "2023-01-1",
            "23-01-01",
            "20231-01-01",
            "2023/01/01",
            "2023-01-01T00:00",
            " 2023-01-01",
            "2023-01-01\n",
        ] {
            assert!(!is_valid_search_date(date), "{date:?} should be rejected");
        }
    }

    #[test]
    fn rejects_non_ascii_digits() {
        assert!(!is_valid_search_date("２０２３-01-01"));
    }
}
