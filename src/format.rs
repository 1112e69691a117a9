//! Money and date formatting for printed quotations.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

use crate::model::{Currency, Quotation, ValidityOverride};

/// Format an amount the way the price column prints it.
///
/// Rounded to two decimals with trailing fractional zeros dropped. INR uses
/// Indian digit grouping (`1,00,000`) and the `Rs. …/-` form; USD uses
/// thousands grouping behind a `$`.
pub fn format_price(amount: f64, currency: Currency) -> String {
    let number = format_grouped(amount, currency);
    match currency {
        Currency::Inr => format!("Rs. {}/-", number),
        Currency::Usd => format!("$ {}", number),
    }
}

fn format_grouped(amount: f64, currency: Currency) -> String {
    let cents = (amount * 100.0).round() as i64;
    let negative = cents < 0;
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let grouped = match currency {
        Currency::Inr => group_indian(&whole),
        Currency::Usd => group_thousands(&whole),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if frac != 0 {
        if frac % 10 == 0 {
            out.push_str(&format!(".{}", frac / 10));
        } else {
            out.push_str(&format!(".{:02}", frac));
        }
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Last three digits, then groups of two: 12,34,56,789.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::new();
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

/// `DD-MM-YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Parse a stored date or timestamp. Accepts `YYYY-MM-DD`, RFC 3339 and the
/// space-separated timestamp form databases commonly return.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(dt.date());
        }
    }
    None
}

/// The quotation's creation date, or `today` when it has none or it is unreadable.
pub fn creation_date(quotation: &Quotation, today: NaiveDate) -> NaiveDate {
    quotation
        .created_at
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(today)
}

fn offset(created: NaiveDate, days: Option<i64>) -> Option<NaiveDate> {
    let days = u64::try_from(days?).ok()?;
    created.checked_add_days(Days::new(days))
}

/// Resolve the validity date printed in the bill-to block.
///
/// First usable value wins: override date, override day offset, stored date,
/// stored day offset, then creation + `default_days`.
pub fn validity_date(
    quotation: &Quotation,
    validity: Option<&ValidityOverride>,
    today: NaiveDate,
    default_days: i64,
) -> NaiveDate {
    let created = creation_date(quotation, today);

    let from_override = validity.and_then(|v| {
        v.validity_date
            .as_deref()
            .and_then(parse_date)
            .or_else(|| offset(created, v.validity_days))
    });

    from_override
        .or_else(|| quotation.validity_date.as_deref().and_then(parse_date))
        .or_else(|| offset(created, quotation.validity_days))
        .or_else(|| offset(created, Some(default_days)))
        .unwrap_or(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quotation(created: Option<&str>) -> Quotation {
        Quotation {
            quotation_number: "Q-1".into(),
            customer_name: "Acme".into(),
            created_at: created.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_inr_price() {
        assert_eq!(format_price(1000.0, Currency::Inr), "Rs. 1,000/-");
        assert_eq!(format_price(125000.0, Currency::Inr), "Rs. 1,25,000/-");
        assert_eq!(format_price(12345678.9, Currency::Inr), "Rs. 1,23,45,678.9/-");
        assert_eq!(format_price(999.0, Currency::Inr), "Rs. 999/-");
    }

    #[test]
    fn test_usd_price() {
        assert_eq!(format_price(1000.0, Currency::Usd), "$ 1,000");
        assert_eq!(format_price(1234567.5, Currency::Usd), "$ 1,234,567.5");
        assert_eq!(format_price(0.0, Currency::Usd), "$ 0");
    }

    #[test]
    fn test_price_rounds_to_two_decimals() {
        assert_eq!(format_price(10.126, Currency::Usd), "$ 10.13");
        assert_eq!(format_price(10.004, Currency::Usd), "$ 10");
        assert_eq!(format_price(10.05, Currency::Usd), "$ 10.05");
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date("2024-01-01"), Some(date(2024, 1, 1)));
        assert_eq!(parse_date("2024-03-05T10:11:12Z"), Some(date(2024, 3, 5)));
        assert_eq!(
            parse_date("2024-03-05T10:11:12.123456+00:00"),
            Some(date(2024, 3, 5))
        );
        assert_eq!(parse_date("2024-03-05 10:11:12"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_validity_defaults_to_thirty_days() {
        let q = quotation(Some("2024-01-01"));
        let v = validity_date(&q, None, date(2030, 1, 1), 30);
        assert_eq!(format_date(v), "31-01-2024");
    }

    #[test]
    fn test_validity_uses_today_without_creation_date() {
        let q = quotation(None);
        let v = validity_date(&q, None, date(2024, 2, 1), 30);
        assert_eq!(v, date(2024, 3, 2));
    }

    #[test]
    fn test_validity_override_wins() {
        let mut q = quotation(Some("2024-01-01"));
        q.validity_date = Some("2024-06-30".into());
        let over = ValidityOverride {
            validity_date: Some("2024-02-15".into()),
            validity_days: None,
        };
        let v = validity_date(&q, Some(&over), date(2030, 1, 1), 30);
        assert_eq!(v, date(2024, 2, 15));
    }

    #[test]
    fn test_invalid_override_falls_back_to_stored() {
        let mut q = quotation(Some("2024-01-01"));
        q.validity_date = Some("2024-06-30".into());
        let over = ValidityOverride {
            validity_date: Some("garbage".into()),
            validity_days: None,
        };
        let v = validity_date(&q, Some(&over), date(2030, 1, 1), 30);
        assert_eq!(v, date(2024, 6, 30));
    }

    #[test]
    fn test_override_days_offset() {
        let q = quotation(Some("2024-01-01"));
        let over = ValidityOverride {
            validity_date: None,
            validity_days: Some(15),
        };
        let v = validity_date(&q, Some(&over), date(2030, 1, 1), 30);
        assert_eq!(v, date(2024, 1, 16));
    }

    #[test]
    fn test_stored_days_offset_and_invalid_stored_date() {
        let mut q = quotation(Some("2024-01-01"));
        q.validity_date = Some("31/31/2024".into());
        q.validity_days = Some(10);
        let v = validity_date(&q, None, date(2030, 1, 1), 30);
        assert_eq!(v, date(2024, 1, 11));
    }
}
