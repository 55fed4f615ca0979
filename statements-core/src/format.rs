//! Display helpers for amounts and dates in the transaction table.

use chrono::{DateTime, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// US-dollar rendering: `$1,234.50`, `-$5.00`, and `-` for a missing amount.
pub fn format_currency(amount: Option<Decimal>) -> String {
    let Some(amount) = amount else {
        return "-".to_string();
    };

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac_part}")
}

/// `Mar 5, 2024` for recognisable dates; unknown shapes are shown verbatim.
pub fn format_date(date: &str) -> String {
    let trimmed = date.trim();
    let parsed = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()));

    match parsed {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(s: &str) -> String {
        format_currency(Some(Decimal::from_str(s).unwrap()))
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(None), "-");
        assert_eq!(money("0"), "$0.00");
        assert_eq!(money("5"), "$5.00");
        assert_eq!(money("54.2"), "$54.20");
        assert_eq!(money("1234.5"), "$1,234.50");
        assert_eq!(money("1234567.891"), "$1,234,567.89");
        assert_eq!(money("-5"), "-$5.00");
        assert_eq!(money("100"), "$100.00");
    }

    #[test]
    fn test_format_currency_rounds_half_away_from_zero() {
        assert_eq!(money("0.999"), "$1.00");
        assert_eq!(money("1234.567"), "$1,234.57");
        assert_eq!(money("2.675"), "$2.68");
        assert_eq!(money("999.995"), "$1,000.00");
        assert_eq!(money("-2.675"), "-$2.68");
        assert_eq!(money("-0.001"), "$0.00");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05"), "Mar 5, 2024");
        assert_eq!(format_date("05-03-2024"), "Mar 5, 2024");
        assert_eq!(format_date("31/12/2023"), "Dec 31, 2023");
        assert_eq!(format_date("2024-03-05T10:00:00Z"), "Mar 5, 2024");
        assert_eq!(format_date("sometime"), "sometime");
    }
}
