use chrono::NaiveDate;

use crate::error::{BanvicError, Result};

/// Format a float as a reais amount with thousands separators: R$ 1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-R$ {with_commas}.{dec_part}")
    } else {
        format!("R$ {with_commas}.{dec_part}")
    }
}

/// Integer with thousands separators: 12,345
pub fn count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Approval-rate style percentage; `None` renders as N/A, never 0%.
pub fn percent(val: Option<f64>) -> String {
    match val {
        Some(v) if v.is_finite() => format!("{v:.1}%"),
        _ => "N/A".to_string(),
    }
}

pub fn date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Dates typed on the command line: DD/MM/YYYY or YYYY-MM-DD.
pub fn parse_cli_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| BanvicError::InvalidDate(s.to_string()))
}

/// Horizontal bar for terminal charts, scaled against `max`.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "\u{2588}".repeat(cells.clamp(1, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "R$ 1,234.56");
        assert_eq!(money(-500.00), "-R$ 500.00");
        assert_eq!(money(0.0), "R$ 0.00");
        assert_eq!(money(1000000.99), "R$ 1,000,000.99");
        assert_eq!(money(42.10), "R$ 42.10");
    }

    #[test]
    fn test_count_formatting() {
        assert_eq!(count(0), "0");
        assert_eq!(count(999), "999");
        assert_eq!(count(1000), "1,000");
        assert_eq!(count(1234567), "1,234,567");
    }

    #[test]
    fn test_percent_renders_missing_as_na() {
        assert_eq!(percent(Some(100.0)), "100.0%");
        assert_eq!(percent(Some(66.666)), "66.7%");
        assert_eq!(percent(None), "N/A");
        assert_eq!(percent(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_parse_cli_date() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(parse_cli_date("01/02/2024").unwrap(), d);
        assert_eq!(parse_cli_date("2024-02-01").unwrap(), d);
        assert_eq!(date_br(d), "01/02/2024");
        assert!(matches!(parse_cli_date("Feb 1"), Err(BanvicError::InvalidDate(_))));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10.0, 10.0, 4), "\u{2588}".repeat(4));
        assert_eq!(bar(0.1, 10.0, 4), "\u{2588}");
        assert_eq!(bar(0.0, 10.0, 4), "");
    }
}
