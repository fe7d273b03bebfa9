use std::sync::OnceLock;

use regex::Regex;

use crate::models::{round_amount, Amount};

/// Format whole currency units with thousands separators: -1,234,567
pub fn amount(val: Amount) -> String {
    let digits = val.unsigned_abs().to_string();

    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if val < 0 {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}

/// Blank for zero, the way the schedules print empty cells.
pub fn amount_or_blank(val: Amount) -> String {
    if val == 0 {
        String::new()
    } else {
        amount(val)
    }
}

fn non_numeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.-]").expect("static pattern"))
}

/// Parse typed input into whole units. Everything but digits, minus signs
/// and the decimal point is stripped first (so `,` is a thousands
/// separator); fractions are rounded half away from zero. Whatever still
/// fails to parse counts as 0.
pub fn parse_amount(raw: &str) -> Amount {
    let cleaned = non_numeric().replace_all(raw, "");
    cleaned
        .parse::<Amount>()
        .or_else(|_| cleaned.parse::<f64>().map(round_amount))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_formatting() {
        assert_eq!(amount(1234), "1,234");
        assert_eq!(amount(-500), "-500");
        assert_eq!(amount(0), "0");
        assert_eq!(amount(1_000_000), "1,000,000");
        assert_eq!(amount(-1_234_567), "-1,234,567");
    }

    #[test]
    fn test_amount_or_blank() {
        assert_eq!(amount_or_blank(0), "");
        assert_eq!(amount_or_blank(42), "42");
    }

    #[test]
    fn test_parse_amount_sanitizes() {
        assert_eq!(parse_amount("1 234"), 1234);
        assert_eq!(parse_amount("-500 kr"), -500);
        assert_eq!(parse_amount("12,000"), 12000);
        assert_eq!(parse_amount("abc"), 0);
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("-"), 0);
        assert_eq!(parse_amount("12-3"), 0);
    }

    #[test]
    fn test_parse_amount_rounds_fractions() {
        assert_eq!(parse_amount("1234.56"), 1235);
        assert_eq!(parse_amount("1,234.4"), 1234);
        assert_eq!(parse_amount("-0.5"), -1);
        assert_eq!(parse_amount("1.2.3"), 0);
        assert_eq!(parse_amount("."), 0);
    }
}
