//! Utility functions and helpers

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount with a fixed number of decimal places and thousands separators
pub fn format_amount(value: Decimal, decimal_places: u32, thousands_separator: &str) -> String {
    let rounded =
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", decimal_places as usize, rounded);

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::new();
    let len = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push_str(thousands_separator);
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// URL path of an account page, each segment of the full name percent-encoded
pub fn account_path(fullname: &str) -> String {
    let segments: Vec<String> = fullname
        .split(':')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("/accounts/{}", segments.join("/"))
}

/// Lenient boolean for query flags such as `open_if_lock`
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_amount_groups_thousands() {
        let value = Decimal::from_str("1234567.891").unwrap();
        assert_eq!(format_amount(value, 2, ","), "1,234,567.89");
    }

    #[test]
    fn test_format_amount_negative_and_padding() {
        let value = Decimal::from_str("-1000.5").unwrap();
        assert_eq!(format_amount(value, 2, " "), "-1 000.50");
    }

    #[test]
    fn test_format_amount_small_and_zero_places() {
        assert_eq!(format_amount(Decimal::from_str("999.5").unwrap(), 0, ","), "1,000");
        assert_eq!(format_amount(Decimal::ZERO, 2, ","), "0.00");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>Tom & Jerry's</b>"),
            "&lt;b&gt;Tom &amp; Jerry&#39;s&lt;/b&gt;"
        );
    }

    #[test]
    fn test_account_path() {
        assert_eq!(
            account_path("Expenses:Food & Drink"),
            "/accounts/Expenses/Food%20%26%20Drink"
        );
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("0"));
    }
}
